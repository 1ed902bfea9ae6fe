//! The unattended player that answers every battle decision in a trial.

use std::collections::HashMap;

use log::trace;
use rand::{Rng, RngCore};

use crate::battle::{
    BattleController, BattleState, CasualtyDetails, CasualtyError, CasualtyRequest, RetreatQuery,
    Side,
};
use crate::game::Unit;

/// When an attacker gives up on a battle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetreatPolicy {
    /// Retreat once this many rounds have been fought.
    pub after_round: Option<u32>,
    /// Retreat once this many units or fewer are left.
    pub after_x_units_left: Option<u32>,
    /// Retreat once nothing but air units (plus `after_x_units_left`) remain.
    pub when_only_air_left: bool,
    /// Retreat once our meta-power drops below the enemy's.
    pub when_meta_power_is_lower: bool,
}

/// Configuration shared by every `DummyPlayer` of one side.
#[derive(Debug, Clone, Default)]
pub struct DummyPlayerConfig {
    pub is_attacker: bool,
    pub name: String,
    /// Units in the order they should be lost, if one was given.
    pub order_of_losses: Option<Vec<Unit>>,
    pub keep_at_least_one_land_unit: bool,
    pub retreat: RetreatPolicy,
}

/// Battle controller used for simulated battles. Never blocks and always
/// gives a valid answer.
#[derive(Debug, Clone, Copy)]
pub struct DummyPlayer<'a> {
    config: &'a DummyPlayerConfig,
}

impl<'a> DummyPlayer<'a> {
    pub fn new(config: &'a DummyPlayerConfig) -> Self {
        DummyPlayer { config }
    }

    pub fn config(&self) -> &DummyPlayerConfig {
        self.config
    }

    fn our_side(&self) -> Side {
        if self.config.is_attacker {
            Side::Attacker
        } else {
            Side::Defender
        }
    }

    /// Copy of our surviving units, or nothing without a battle.
    pub fn our_units(&self, battle: Option<&BattleState>) -> Vec<Unit> {
        battle
            .map(|b| b.units(self.our_side()).to_vec())
            .unwrap_or_default()
    }

    /// Copy of the enemy's surviving units, or nothing without a battle.
    pub fn enemy_units(&self, battle: Option<&BattleState>) -> Vec<Unit> {
        battle
            .map(|b| b.units(self.our_side().opponent()).to_vec())
            .unwrap_or_default()
    }

    fn killed_by_order(
        &self,
        order: &[Unit],
        request: &CasualtyRequest<'_>,
        kills: usize,
    ) -> Vec<Unit> {
        let mut killed: Vec<Unit> = order
            .iter()
            .filter(|u| request.select_from.contains(u))
            .take(kills)
            .cloned()
            .collect();
        for unit in request.select_from {
            if killed.len() == kills {
                break;
            }
            if !killed.contains(unit) {
                killed.push(unit.clone());
            }
        }
        killed
    }

    /// Swaps the last capture-capable casualty for a unit that cannot take
    /// the territory, if the default choice would leave none able to.
    fn keep_one_land_unit(
        &self,
        request: &CasualtyRequest<'_>,
        mut killed: Vec<Unit>,
    ) -> Vec<Unit> {
        let damaged = &request.default_casualties.damaged;
        let capture_left = request
            .select_from
            .iter()
            .any(|u| u.unit_type.can_capture_alone() && !killed.contains(u));
        if capture_left {
            return killed;
        }
        let Some(slot) = killed.iter().rposition(|u| u.unit_type.can_capture_alone()) else {
            return killed;
        };
        let substitute = request.select_from.iter().find(|u| {
            !u.unit_type.can_capture_alone() && !killed.contains(u) && !damaged.contains(u)
        });
        if let Some(substitute) = substitute {
            trace!(
                "{} keeps {} alive, losing {} instead",
                self.config.name,
                killed[slot].type_name(),
                substitute.type_name()
            );
            killed[slot] = substitute.clone();
        }
        killed
    }

    fn should_retreat(&self, battle: &BattleState) -> bool {
        let policy = &self.config.retreat;
        if policy.after_round.is_some_and(|round| battle.round >= round) {
            return true;
        }

        let side = self.our_side();
        let units_left = battle.units(side);
        if policy.when_only_air_left {
            let air = units_left.iter().filter(|u| u.unit_type.is_air).count();
            let threshold = air + policy.after_x_units_left.unwrap_or(0) as usize;
            if threshold >= units_left.len() {
                return true;
            }
        }
        if policy
            .after_x_units_left
            .is_some_and(|x| x as usize >= units_left.len())
        {
            return true;
        }
        policy.when_meta_power_is_lower
            && battle.meta_power(side) < battle.meta_power(side.opponent())
    }
}

impl BattleController for DummyPlayer<'_> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn select_casualties(
        &mut self,
        _battle: &BattleState,
        request: &CasualtyRequest<'_>,
    ) -> Result<CasualtyDetails, CasualtyError> {
        let defaults = request.default_casualties;
        if defaults.len() != request.count {
            return Err(CasualtyError::CountMismatch {
                requested: request.count,
                default: defaults.len(),
            });
        }

        let kills = defaults.killed.len();
        let killed = match &self.config.order_of_losses {
            Some(order) if !order.is_empty() => self.killed_by_order(order, request, kills),
            _ if !self.config.keep_at_least_one_land_unit => defaults.killed.clone(),
            _ => self.keep_one_land_unit(request, defaults.killed.clone()),
        };

        let details = CasualtyDetails {
            killed,
            damaged: defaults.damaged.clone(),
            auto_calculated: false,
        };
        if details.len() != request.count {
            return Err(CasualtyError::WrongCasualtyCount {
                requested: request.count,
                selected: details.len(),
            });
        }
        Ok(details)
    }

    fn retreat_query(&mut self, battle: &BattleState, query: &RetreatQuery) -> Option<String> {
        let first = query.possible_territories.first()?;
        let retreat = if query.submerge {
            let ours = self.our_units(Some(battle));
            let enemy = self.enemy_units(Some(battle));
            !enemy.is_empty()
                && ours.iter().all(|u| u.unit_type.is_sea && u.unit_type.is_sub)
                && enemy.iter().all(|u| u.unit_type.is_air && !u.unit_type.is_destroyer)
        } else {
            self.should_retreat(battle)
        };
        retreat.then(|| first.clone())
    }

    fn scramble_units_query(
        &mut self,
        _scramble_to: &str,
        _possible_scramblers: &HashMap<String, Vec<Unit>>,
    ) -> HashMap<String, Vec<Unit>> {
        HashMap::new()
    }

    fn what_should_bomber_bomb(
        &mut self,
        _territory: &str,
        potential_targets: &[Unit],
        _bombers: &[Unit],
    ) -> Option<Unit> {
        potential_targets
            .iter()
            .find(|u| u.unit_type.is_infrastructure)
            .or_else(|| potential_targets.first())
            .cloned()
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
        let sides = dice_sides.max(1);
        (0..rolls).map(|_| rng.gen_range(1..=sides)).collect()
    }
}
