//! Plain dice battles.
//!
//! Each round every combat unit rolls one die and hits on a roll below its
//! strength. Hits from both sides land simultaneously, bombarding ships fire
//! in the first round only, and the attacker may retreat between rounds
//! unless it still has land units in an amphibious assault.

use log::{debug, trace};
use rand::{Rng, RngCore};

use crate::game::{GameData, Territory, Unit, UnitId};

use super::casualty::{default_casualties, CasualtyDetails, CasualtyError, CasualtyRequest};
use super::controller::{BattleController, RetreatQuery};
use super::outcome::{SimulationRun, Winner};
use super::setup::{BattleSetup, Side};
use super::state::BattleState;
use super::{BattleEngine, BattleError};

/// The default battle engine.
#[derive(Debug, Clone, Default)]
pub struct DiceBattleEngine {
    /// Declare a draw after this many rounds. `None` fights to the end.
    pub max_rounds: Option<u32>,
}

impl DiceBattleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rounds(max_rounds: u32) -> Self {
        DiceBattleEngine {
            max_rounds: Some(max_rounds),
        }
    }
}

impl BattleEngine for DiceBattleEngine {
    fn run_battle(
        &self,
        setup: &BattleSetup,
        data: &mut GameData,
        attacker: &mut dyn BattleController,
        defender: &mut dyn BattleController,
        rng: &mut dyn RngCore,
    ) -> Result<SimulationRun, BattleError> {
        let dice_sides = data.dice_sides();
        let territory = data
            .territory_mut(&setup.territory)
            .ok_or_else(|| BattleError::UnknownTerritory(setup.territory.clone()))?;
        let mut battle = BattleState::new(setup, territory.is_water, dice_sides);

        let bombard_power: u32 = setup
            .bombarding_units
            .iter()
            .map(|u| battle.strength(u, Side::Attacker))
            .sum();
        let winner = match decided(&battle, bombard_power) {
            Some(winner) => winner,
            None => loop {
                if self.max_rounds.is_some_and(|max| battle.round >= max) {
                    break Winner::Draw;
                }
                battle.round += 1;

                let mut attacker_hits =
                    roll_hits(&battle, &battle.attacking_units, Side::Attacker, rng);
                if battle.round == 1 {
                    attacker_hits +=
                        roll_hits(&battle, &setup.bombarding_units, Side::Attacker, rng);
                }
                let defender_hits =
                    roll_hits(&battle, &battle.defending_units, Side::Defender, rng);

                let defender_losses =
                    take_casualties(defender, &battle, Side::Defender, attacker_hits)?;
                let attacker_losses =
                    take_casualties(attacker, &battle, Side::Attacker, defender_hits)?;
                trace!(
                    "{} round {}: {} attacker hits, {} defender hits",
                    battle.territory,
                    battle.round,
                    attacker_hits,
                    defender_hits
                );
                apply_casualties(&mut battle, territory, Side::Defender, &defender_losses);
                apply_casualties(&mut battle, territory, Side::Attacker, &attacker_losses);

                if let Some(winner) = decided(&battle, 0) {
                    break winner;
                }

                if can_retreat(setup, &battle) {
                    let query = RetreatQuery {
                        submerge: false,
                        battle_site: battle.territory.clone(),
                        possible_territories: vec![battle.territory.clone()],
                    };
                    if let Some(to) = attacker.retreat_query(&battle, &query) {
                        debug!(
                            "{} retreats to {} after round {}",
                            attacker.name(),
                            to,
                            battle.round
                        );
                        break Winner::Defender;
                    }
                }
            },
        };

        Ok(SimulationRun {
            winner,
            attacker_units_remaining: battle.attacking_units,
            defender_units_remaining: battle.defending_units,
            rounds_fought: battle.round,
        })
    }
}

/// Land units that came ashore in an amphibious assault are committed, so
/// the attacker is only asked once the fight is down to its other units.
fn can_retreat(setup: &BattleSetup, battle: &BattleState) -> bool {
    setup.retreat_allowed
        && !(setup.amphibious
            && battle
                .attacking_units
                .iter()
                .any(|u| u.unit_type.is_land() && !u.unit_type.is_infrastructure))
}

/// Checks whether the battle is over. `extra_attack_power` counts fire the
/// attacker still has outside its own units, such as a pending bombardment.
fn decided(battle: &BattleState, extra_attack_power: u32) -> Option<Winner> {
    let attackers = battle.has_combatants(Side::Attacker);
    let defenders = battle.has_combatants(Side::Defender);
    match (attackers, defenders) {
        (false, false) => Some(Winner::Draw),
        (true, false) => Some(Winner::Attacker),
        (false, true) => Some(Winner::Defender),
        (true, true) => {
            let attack = battle.total_power(Side::Attacker) + extra_attack_power;
            if attack == 0 && battle.total_power(Side::Defender) == 0 {
                Some(Winner::Draw)
            } else {
                None
            }
        }
    }
}

fn roll_hits(
    battle: &BattleState,
    units: &[Unit],
    side: Side,
    rng: &mut dyn RngCore,
) -> usize {
    let sides = battle.dice_sides;
    units
        .iter()
        .map(|u| battle.strength(u, side))
        .filter(|&strength| strength > 0 && rng.gen_range(0..sides) < strength)
        .count()
}

fn take_casualties(
    controller: &mut dyn BattleController,
    battle: &BattleState,
    side: Side,
    hits: usize,
) -> Result<CasualtyDetails, BattleError> {
    let select_from = battle.combatants(side);
    let hit_points: usize = select_from.iter().map(|u| u.hit_points_left() as usize).sum();
    let count = hits.min(hit_points);
    if count == 0 {
        return Ok(CasualtyDetails::default());
    }

    let defaults = default_casualties(&select_from, count, |u| battle.strength(u, side));
    let request = CasualtyRequest {
        select_from: &select_from,
        count,
        hit_player: battle.player(side),
        default_casualties: &defaults,
        allow_multiple_hits_per_unit: true,
    };
    let details = controller.select_casualties(battle, &request)?;

    if details.len() != count {
        return Err(CasualtyError::WrongCasualtyCount {
            requested: count,
            selected: details.len(),
        }
        .into());
    }
    if let Some(stranger) = details
        .killed
        .iter()
        .chain(&details.damaged)
        .find(|u| !select_from.contains(u))
    {
        return Err(CasualtyError::NotSelectable(stranger.id).into());
    }
    Ok(details)
}

fn apply_casualties(
    battle: &mut BattleState,
    territory: &mut Territory,
    side: Side,
    details: &CasualtyDetails,
) {
    for hurt in &details.damaged {
        if let Some(unit) = battle.units_mut(side).iter_mut().find(|u| u.id == hurt.id) {
            unit.hits += 1;
        }
        territory.damage_unit(hurt.id);
    }
    let killed: Vec<UnitId> = details.killed.iter().map(|u| u.id).collect();
    battle.units_mut(side).retain(|u| !killed.contains(&u.id));
    territory.remove_units(&killed);
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::game::{PlayerId, UnitType};

    /// Takes the default casualties; retreats when told to.
    struct Scripted {
        retreat: bool,
    }

    impl BattleController for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn select_casualties(
            &mut self,
            _battle: &BattleState,
            request: &CasualtyRequest<'_>,
        ) -> Result<CasualtyDetails, CasualtyError> {
            Ok(CasualtyDetails::new(request.default_casualties.clone(), true))
        }

        fn retreat_query(&mut self, _battle: &BattleState, query: &RetreatQuery) -> Option<String> {
            self.retreat.then(|| query.battle_site.clone())
        }

        fn scramble_units_query(
            &mut self,
            _scramble_to: &str,
            _possible: &HashMap<String, Vec<Unit>>,
        ) -> HashMap<String, Vec<Unit>> {
            HashMap::new()
        }

        fn what_should_bomber_bomb(
            &mut self,
            _t: &str,
            _targets: &[Unit],
            _bombers: &[Unit],
        ) -> Option<Unit> {
            None
        }

        fn select_kamikaze_attacks(
            &mut self,
            _possible: &HashMap<String, Vec<Unit>>,
        ) -> HashMap<String, Vec<Unit>> {
            HashMap::new()
        }

        fn confirm_move_kamikaze(&mut self) -> bool {
            false
        }

        fn select_fixed_dice(
            &mut self,
            rolls: usize,
            dice_sides: u32,
            rng: &mut dyn RngCore,
        ) -> Vec<u32> {
            (0..rolls).map(|_| rng.gen_range(1..=dice_sides)).collect()
        }
    }

    /// A map with one contested territory and four unit types:
    /// `sure` always hits, `dud` and the air unit `glider` never do,
    /// `aaGun` is infrastructure.
    fn data() -> GameData {
        let mut data = GameData::default();
        data.add_player("Russians", &["Allies"]);
        data.add_player("Germans", &["Axis"]);
        data.add_unit_type(UnitType {
            name: "sure".to_string(),
            attack: 6,
            defense: 6,
            cost: 5,
            ..Default::default()
        });
        data.add_unit_type(UnitType {
            name: "dud".to_string(),
            cost: 1,
            ..Default::default()
        });
        data.add_unit_type(UnitType {
            name: "glider".to_string(),
            cost: 1,
            is_air: true,
            ..Default::default()
        });
        data.add_unit_type(UnitType {
            name: "aaGun".to_string(),
            cost: 5,
            is_infrastructure: true,
            ..Default::default()
        });
        data.add_territory(Territory::new("Germany", Some(PlayerId(1)), false));
        data
    }

    fn setup(
        data: &mut GameData,
        attackers: &[(&str, usize)],
        defenders: &[(&str, usize)],
    ) -> BattleSetup {
        let attacking_units: Vec<Unit> = attackers
            .iter()
            .flat_map(|(t, n)| data.create_units(t, *n, PlayerId(0)).unwrap())
            .collect();
        let defending_units: Vec<Unit> = defenders
            .iter()
            .flat_map(|(t, n)| data.create_units(t, *n, PlayerId(1)).unwrap())
            .collect();
        let germany = data.territory_mut("Germany").unwrap();
        germany.add_units(attacking_units.clone());
        germany.add_units(defending_units.clone());
        BattleSetup {
            attacker: PlayerId(0),
            defender: PlayerId(1),
            attacking_units,
            defending_units,
            bombarding_units: Vec::new(),
            territory: "Germany".to_string(),
            territory_effects: Vec::new(),
            keep_at_least_one_attacking_land_unit: false,
            retreat_allowed: false,
            amphibious: false,
            run_count: 1,
        }
    }

    fn fight(
        engine: &DiceBattleEngine,
        setup: &BattleSetup,
        data: &mut GameData,
        retreat: bool,
    ) -> SimulationRun {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut attacker = Scripted { retreat };
        let mut defender = Scripted { retreat: false };
        engine
            .run_battle(setup, data, &mut attacker, &mut defender, &mut rng)
            .unwrap()
    }

    #[test]
    fn undefended_territory_falls_without_a_round() {
        let mut data = data();
        let setup = setup(&mut data, &[("sure", 2)], &[("aaGun", 1)]);
        let run = fight(&DiceBattleEngine::new(), &setup, &mut data, false);
        assert_eq!(run.winner, Winner::Attacker);
        assert_eq!(run.rounds_fought, 0);
        assert_eq!(run.defender_units_remaining.len(), 1);
    }

    #[test]
    fn simultaneous_fire_and_casualties_leave_the_map() {
        let mut data = data();
        let setup = setup(&mut data, &[("sure", 2)], &[("sure", 1)]);
        let run = fight(&DiceBattleEngine::new(), &setup, &mut data, false);
        assert_eq!(run.winner, Winner::Attacker);
        assert_eq!(run.rounds_fought, 1);
        assert_eq!(run.attacker_units_remaining.len(), 1);
        assert_eq!(data.territory("Germany").unwrap().units.len(), 1);
    }

    #[test]
    fn mutual_destruction_is_a_draw() {
        let mut data = data();
        let setup = setup(&mut data, &[("sure", 1)], &[("sure", 1)]);
        let run = fight(&DiceBattleEngine::new(), &setup, &mut data, false);
        assert!(run.is_draw());
        assert!(run.attacker_units_remaining.is_empty());
        assert!(run.defender_units_remaining.is_empty());
    }

    #[test]
    fn powerless_armies_draw() {
        let mut data = data();
        let setup = setup(&mut data, &[("dud", 3)], &[("dud", 3)]);
        let run = fight(&DiceBattleEngine::new(), &setup, &mut data, false);
        assert!(run.is_draw());
        assert_eq!(run.rounds_fought, 0);
    }

    #[test]
    fn retreat_hands_the_battle_to_the_defender() {
        let mut data = data();
        let mut setup = setup(&mut data, &[("dud", 3)], &[("sure", 1)]);
        setup.retreat_allowed = true;
        let run = fight(&DiceBattleEngine::new(), &setup, &mut data, true);
        assert!(run.defender_won());
        assert_eq!(run.rounds_fought, 1);
        assert_eq!(run.attacker_units_remaining.len(), 2);
    }

    #[test]
    fn amphibious_land_units_fight_to_the_end() {
        let mut data = data();
        let mut setup = setup(&mut data, &[("dud", 3)], &[("sure", 1)]);
        setup.retreat_allowed = true;
        setup.amphibious = true;
        let run = fight(&DiceBattleEngine::new(), &setup, &mut data, true);
        assert!(run.defender_won());
        assert_eq!(run.rounds_fought, 3);
        assert!(run.attacker_units_remaining.is_empty());
    }

    #[test]
    fn amphibious_air_may_retreat_once_the_landing_is_lost() {
        let mut data = data();
        let mut setup = setup(&mut data, &[("dud", 1), ("glider", 2)], &[("sure", 1)]);
        setup.retreat_allowed = true;
        setup.amphibious = true;
        let run = fight(&DiceBattleEngine::new(), &setup, &mut data, true);
        assert!(run.defender_won());
        // The land unit falls first, then the air units leave.
        assert_eq!(run.rounds_fought, 1);
        assert_eq!(run.attacker_units_remaining.len(), 2);
        assert!(run.attacker_units_remaining.iter().all(|u| u.unit_type.is_air));
    }

    #[test]
    fn round_limit_forces_a_draw() {
        let mut data = data();
        let setup = setup(&mut data, &[("dud", 5)], &[("sure", 1)]);
        let run = fight(&DiceBattleEngine::with_max_rounds(2), &setup, &mut data, false);
        assert!(run.is_draw());
        assert_eq!(run.rounds_fought, 2);
        assert_eq!(run.attacker_units_remaining.len(), 3);
    }

    #[test]
    fn bombardment_fires_in_the_first_round_only() {
        let mut data = data();
        let mut setup = setup(&mut data, &[("dud", 1)], &[("dud", 2)]);
        setup.bombarding_units = data.create_units("sure", 1, PlayerId(0)).unwrap();
        let run = fight(&DiceBattleEngine::with_max_rounds(3), &setup, &mut data, false);
        // One defender falls to the bombardment, then nobody can hit.
        assert!(run.is_draw());
        assert_eq!(run.rounds_fought, 1);
        assert_eq!(run.defender_units_remaining.len(), 1);
    }

    #[test]
    fn unknown_territory_is_an_error() {
        let mut data = data();
        let mut setup = setup(&mut data, &[("sure", 1)], &[("sure", 1)]);
        setup.territory = "Atlantis".to_string();
        let mut rng = SmallRng::seed_from_u64(1);
        let err = DiceBattleEngine::new()
            .run_battle(
                &setup,
                &mut data,
                &mut Scripted { retreat: false },
                &mut Scripted { retreat: false },
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(err, BattleError::UnknownTerritory(_)));
    }
}
