//! Runs many simulated battles in parallel and aggregates their outcomes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::{BattleEngine, BattleError, BattleSetup, DiceBattleEngine};
use crate::game::{GameData, PlayerId, TerritoryEffect, Unit};

use super::distributor::{DistributorError, RunCountDistributor};
use super::dummy_player::{DummyPlayer, DummyPlayerConfig, RetreatPolicy};
use super::order_of_losses::{OolError, OrderOfLosses};
use super::results::AggregateResults;
use super::selector::{AttackerAndDefender, AttackerAndDefenderSelector};

#[derive(Debug, Error)]
pub enum CalcError {
    #[error(transparent)]
    Distributor(#[from] DistributorError),
    #[error(transparent)]
    Battle(#[from] BattleError),
    #[error(transparent)]
    Ool(#[from] OolError),
    #[error("territory '{0}' does not exist")]
    UnknownTerritory(String),
    #[error("{0} cannot bombard")]
    CannotBombard(String),
    #[error("could not determine both an attacker and a defender")]
    MissingSides,
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings for a calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Worker threads.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    pub keep_one_attacking_land_unit: bool,
    /// Attacking land units landed from the sea and cannot retreat.
    pub amphibious: bool,
    pub retreat_after_round: Option<u32>,
    pub retreat_after_x_units_left: Option<u32>,
    pub retreat_when_only_air_left: bool,
    pub retreat_when_meta_power_is_lower: bool,
    /// Attacker order of losses, e.g. `1^infantry;*^armour`. Empty = default.
    pub attacker_order_of_losses: String,
    pub defender_order_of_losses: String,
    /// Declare a draw after this many rounds.
    pub max_rounds: Option<u32>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        CalculatorConfig {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            seed: 0,
            keep_one_attacking_land_unit: false,
            amphibious: false,
            retreat_after_round: None,
            retreat_after_x_units_left: None,
            retreat_when_only_air_left: false,
            retreat_when_meta_power_is_lower: false,
            attacker_order_of_losses: String::new(),
            defender_order_of_losses: String::new(),
            max_rounds: None,
        }
    }
}

/// One battle to simulate. Sides and unit lists left unset are inferred
/// from the territory.
#[derive(Debug, Clone)]
pub struct BattleRequest {
    /// The player whose turn it is. Always the attacker.
    pub attacker: Option<PlayerId>,
    pub defender: Option<PlayerId>,
    pub territory: String,
    pub attacking_units: Vec<Unit>,
    pub defending_units: Vec<Unit>,
    pub bombarding_units: Vec<Unit>,
    pub territory_effects: Vec<TerritoryEffect>,
    pub retreat_allowed: bool,
    pub run_count: u32,
}

impl BattleRequest {
    pub fn new(territory: impl Into<String>, run_count: u32) -> Self {
        BattleRequest {
            attacker: None,
            defender: None,
            territory: territory.into(),
            attacking_units: Vec::new(),
            defending_units: Vec::new(),
            bombarding_units: Vec::new(),
            territory_effects: Vec::new(),
            retreat_allowed: true,
            run_count,
        }
    }
}

/// The sides of a request once everything left open has been inferred.
#[derive(Debug, Clone)]
pub struct ResolvedSides {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub attacking_units: Vec<Unit>,
    pub defending_units: Vec<Unit>,
}

/// Estimates battle odds by simulating a battle many times.
pub struct BattleCalculator<E: BattleEngine = DiceBattleEngine> {
    data: GameData,
    config: CalculatorConfig,
    engine: E,
}

impl BattleCalculator<DiceBattleEngine> {
    pub fn new(data: GameData, config: CalculatorConfig) -> Self {
        let engine = DiceBattleEngine {
            max_rounds: config.max_rounds,
        };
        BattleCalculator::with_engine(data, config, engine)
    }
}

impl<E: BattleEngine> BattleCalculator<E> {
    pub fn with_engine(data: GameData, config: CalculatorConfig, engine: E) -> Self {
        BattleCalculator {
            data,
            config,
            engine,
        }
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    /// Mutable access to the snapshot, e.g. to create the units of a request.
    pub fn data_mut(&mut self) -> &mut GameData {
        &mut self.data
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn set_keep_one_attacking_land_unit(&mut self, keep: bool) {
        self.config.keep_one_attacking_land_unit = keep;
    }

    /// Fills in whatever the request leaves open.
    pub fn resolve_sides(&self, request: &BattleRequest) -> Result<ResolvedSides, CalcError> {
        let territory = self
            .data
            .territory(&request.territory)
            .ok_or_else(|| CalcError::UnknownTerritory(request.territory.clone()))?;

        let complete = request.attacker.is_some()
            && request.defender.is_some()
            && !request.attacking_units.is_empty()
            && !request.defending_units.is_empty();
        let inferred = if complete {
            AttackerAndDefender::default()
        } else {
            let players = self.data.player_ids();
            AttackerAndDefenderSelector {
                players: &players,
                current_player: request.attacker,
                relationships: self.data.relationships(),
                territory: Some(territory),
            }
            .attacker_and_defender()
        };

        let (Some(attacker), Some(defender)) = (
            request.attacker.or(inferred.attacker),
            request.defender.or(inferred.defender),
        ) else {
            return Err(CalcError::MissingSides);
        };

        let attacking_units = if !request.attacking_units.is_empty() {
            request.attacking_units.clone()
        } else if inferred.attacker == Some(attacker) {
            inferred.attacking_units
        } else {
            territory.units_owned_by(attacker)
        };
        let defending_units = if !request.defending_units.is_empty() {
            request.defending_units.clone()
        } else if inferred.defender == Some(defender) {
            inferred.defending_units
        } else {
            territory.units_owned_by(defender)
        };
        if defending_units.is_empty() {
            warn!("no defending units in {}", request.territory);
        }
        Ok(ResolvedSides {
            attacker,
            defender,
            attacking_units,
            defending_units,
        })
    }

    fn dummy_configs(
        &self,
        setup: &BattleSetup,
    ) -> Result<(DummyPlayerConfig, DummyPlayerConfig), CalcError> {
        let attacker_ool = OrderOfLosses::parse(&self.config.attacker_order_of_losses, &self.data)?;
        let defender_ool = OrderOfLosses::parse(&self.config.defender_order_of_losses, &self.data)?;
        let attacker = DummyPlayerConfig {
            is_attacker: true,
            name: format!("{} (battle calc)", self.data.player_name(setup.attacker)),
            order_of_losses: (!attacker_ool.is_empty())
                .then(|| attacker_ool.resolve(&setup.attacking_units)),
            keep_at_least_one_land_unit: setup.keep_at_least_one_attacking_land_unit,
            retreat: RetreatPolicy {
                after_round: self.config.retreat_after_round,
                after_x_units_left: self.config.retreat_after_x_units_left,
                when_only_air_left: self.config.retreat_when_only_air_left,
                when_meta_power_is_lower: self.config.retreat_when_meta_power_is_lower,
            },
        };
        let defender = DummyPlayerConfig {
            is_attacker: false,
            name: format!("{} (battle calc)", self.data.player_name(setup.defender)),
            order_of_losses: (!defender_ool.is_empty())
                .then(|| defender_ool.resolve(&setup.defending_units)),
            keep_at_least_one_land_unit: false,
            retreat: RetreatPolicy {
                after_round: self.config.retreat_after_round,
                ..Default::default()
            },
        };
        Ok((attacker, defender))
    }

    /// Simulates `request.run_count` battles and returns their aggregate.
    pub fn calculate(&self, request: &BattleRequest) -> Result<AggregateResults, CalcError> {
        let start = Instant::now();
        let ResolvedSides {
            attacker,
            defender,
            attacking_units,
            defending_units,
        } = self.resolve_sides(request)?;

        if let Some(unit) = request
            .bombarding_units
            .iter()
            .find(|u| !u.unit_type.can_bombard)
        {
            return Err(CalcError::CannotBombard(unit.type_name().to_string()));
        }

        let mut snapshot = self.data.clone();
        if let Some(territory) = snapshot.territory_mut(&request.territory) {
            territory.units.clear();
            territory.add_units(attacking_units.iter().cloned());
            territory.add_units(defending_units.iter().cloned());
        }

        let setup = BattleSetup {
            attacker,
            defender,
            attacking_units,
            defending_units,
            bombarding_units: request.bombarding_units.clone(),
            territory: request.territory.clone(),
            territory_effects: request.territory_effects.clone(),
            keep_at_least_one_attacking_land_unit: self.config.keep_one_attacking_land_unit,
            retreat_allowed: request.retreat_allowed,
            amphibious: self.config.amphibious,
            run_count: request.run_count,
        };
        let (attacker_config, defender_config) = self.dummy_configs(&setup)?;

        let workers = self.config.threads.max(1);
        debug!(
            "{} attacks {} in {}: {} runs on {} workers",
            self.data.player_name(attacker),
            self.data.player_name(defender),
            setup.territory,
            setup.run_count,
            workers
        );
        let parallelism = i32::try_from(workers).unwrap_or(i32::MAX);
        let distributor = RunCountDistributor::new(setup.run_count, parallelism)?;
        let results = AggregateResults::new(setup.run_count as usize);
        let next_trial = AtomicU64::new(0);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
        pool.install(|| {
            (0..workers).into_par_iter().try_for_each(|worker| -> Result<(), CalcError> {
                let share = distributor.next_run_count()?;
                debug!("worker {} takes {} runs", worker, share);
                for _ in 0..share {
                    let trial = next_trial.fetch_add(1, Ordering::Relaxed);
                    let mut rng = if self.config.seed != 0 {
                        SmallRng::seed_from_u64(trial_seed(self.config.seed, trial))
                    } else {
                        SmallRng::from_entropy()
                    };
                    let mut data = snapshot.clone();
                    let mut attacker = DummyPlayer::new(&attacker_config);
                    let mut defender = DummyPlayer::new(&defender_config);
                    let run = self
                        .engine
                        .run_battle(&setup, &mut data, &mut attacker, &mut defender, &mut rng)?;
                    results.add_result(run);
                }
                Ok(())
            })
        })?;

        let mut results = results;
        results.set_time(start.elapsed());
        debug!(
            "{} runs in {:.1}ms: attacker {:.3}, defender {:.3}, draw {:.3}",
            results.len(),
            results.time().as_secs_f64() * 1000.0,
            results.attacker_win_percent(),
            results.defender_win_percent(),
            results.draw_percent()
        );
        Ok(results)
    }
}

/// Seed of one trial. Spreads the trial index over all bits so that nearby
/// base seeds do not share trial seeds.
fn trial_seed(seed: u64, trial: u64) -> u64 {
    seed ^ trial.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::game::{Territory, UnitType};

    fn data() -> GameData {
        let mut data = GameData::default();
        data.add_player("Russians", &["Allies"]);
        data.add_player("Germans", &["Axis"]);
        data.add_unit_type(UnitType {
            name: "infantry".to_string(),
            attack: 1,
            defense: 2,
            cost: 3,
            ..Default::default()
        });
        data.add_unit_type(UnitType {
            name: "battleship".to_string(),
            attack: 4,
            defense: 4,
            cost: 24,
            hit_points: 2,
            is_sea: true,
            can_bombard: true,
            ..Default::default()
        });
        let mut germany = Territory::new("Germany", Some(PlayerId(1)), false);
        germany.add_units(data.create_units("infantry", 2, PlayerId(1)).unwrap());
        data.add_territory(germany);
        data
    }

    fn config() -> CalculatorConfig {
        CalculatorConfig {
            threads: 2,
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn zero_runs_give_nan() {
        let calc = BattleCalculator::new(data(), config());
        let mut request = BattleRequest::new("Germany", 0);
        request.attacker = Some(PlayerId(0));
        let results = calc.calculate(&request).unwrap();
        assert!(results.is_empty());
        assert!(results.attacker_win_percent().is_nan());
        assert!(results.average_battle_rounds_fought().is_nan());
    }

    #[test]
    fn runs_exactly_the_requested_count() {
        let mut calc = BattleCalculator::new(data(), config());
        let mut request = BattleRequest::new("Germany", 37);
        request.attacker = Some(PlayerId(0));
        request.attacking_units = calc.data_mut().create_units("infantry", 3, PlayerId(0)).unwrap();
        let results = calc.calculate(&request).unwrap();
        assert_eq!(results.len(), 37);
        let total = results.attacker_win_percent()
            + results.defender_win_percent()
            + results.draw_percent();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let mut calc = BattleCalculator::new(data(), config());
        let mut request = BattleRequest::new("Germany", 200);
        request.attacker = Some(PlayerId(0));
        request.attacking_units = calc.data_mut().create_units("infantry", 3, PlayerId(0)).unwrap();
        let first = calc.calculate(&request).unwrap().attacker_win_percent();
        let second = calc.calculate(&request).unwrap().attacker_win_percent();
        assert_eq!(first, second);
    }

    #[test]
    fn defenders_are_inferred_from_the_territory() {
        let mut calc = BattleCalculator::new(data(), config());
        let mut request = BattleRequest::new("Germany", 1);
        request.attacker = Some(PlayerId(0));
        request.attacking_units = calc.data_mut().create_units("infantry", 1, PlayerId(0)).unwrap();
        let sides = calc.resolve_sides(&request).unwrap();
        assert_eq!(sides.attacker, PlayerId(0));
        assert_eq!(sides.defender, PlayerId(1));
        assert_eq!(sides.attacking_units.len(), 1);
        assert_eq!(sides.defending_units.len(), 2);
    }

    #[test]
    fn errors_surface() {
        let calc = BattleCalculator::new(data(), config());
        let request = BattleRequest::new("Atlantis", 1);
        assert!(matches!(calc.calculate(&request), Err(CalcError::UnknownTerritory(_))));

        let request = BattleRequest::new("Germany", 1);
        assert!(matches!(calc.calculate(&request), Err(CalcError::MissingSides)));

        let bad_ool = CalculatorConfig {
            attacker_order_of_losses: "1^tank".to_string(),
            ..config()
        };
        let calc = BattleCalculator::new(data(), bad_ool);
        let mut request = BattleRequest::new("Germany", 1);
        request.attacker = Some(PlayerId(0));
        assert!(matches!(calc.calculate(&request), Err(CalcError::Ool(_))));
    }

    #[test]
    fn only_bombarding_units_may_bombard() {
        let mut calc = BattleCalculator::new(data(), config());
        let mut request = BattleRequest::new("Germany", 10);
        request.attacker = Some(PlayerId(0));
        request.attacking_units = calc.data_mut().create_units("infantry", 2, PlayerId(0)).unwrap();
        request.bombarding_units = calc
            .data_mut()
            .create_units("infantry", 5, PlayerId(0))
            .unwrap();
        assert!(matches!(
            calc.calculate(&request),
            Err(CalcError::CannotBombard(name)) if name == "infantry"
        ));

        request.bombarding_units = calc
            .data_mut()
            .create_units("battleship", 1, PlayerId(0))
            .unwrap();
        assert_eq!(calc.calculate(&request).unwrap().len(), 10);
    }

    #[test]
    fn nearby_base_seeds_share_no_trial_seeds() {
        let first: HashSet<u64> = (0..1000).map(|t| trial_seed(1, t)).collect();
        let second: HashSet<u64> = (0..1000).map(|t| trial_seed(11, t)).collect();
        assert_eq!(first.len(), 1000);
        assert!(first.is_disjoint(&second));
    }

    #[test]
    fn different_seeds_give_different_trials() {
        let mut calc = BattleCalculator::new(data(), config());
        let mut request = BattleRequest::new("Germany", 200);
        request.attacker = Some(PlayerId(0));
        request.attacking_units = calc.data_mut().create_units("infantry", 3, PlayerId(0)).unwrap();
        let rounds = |calc: &BattleCalculator, seed: u64| {
            let calc = BattleCalculator::new(
                calc.data().clone(),
                CalculatorConfig {
                    threads: 1,
                    seed,
                    ..config()
                },
            );
            // A single worker records the trials in order.
            calc.calculate(&request)
                .unwrap()
                .results()
                .iter()
                .map(|r| r.rounds_fought)
                .collect::<Vec<u32>>()
        };
        assert_ne!(rounds(&calc, 1), rounds(&calc, 11));
        assert_eq!(rounds(&calc, 11), rounds(&calc, 11));
    }

    #[test]
    fn amphibious_setting_reaches_the_deserialized_config() {
        let config: CalculatorConfig = serde_json::from_str(r#"{"amphibious": true}"#).unwrap();
        assert!(config.amphibious);
        assert!(!CalculatorConfig::default().amphibious);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: CalculatorConfig =
            serde_json::from_str(r#"{"seed": 9, "max_rounds": 3}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.max_rounds, Some(3));
        assert!(config.threads >= 1);
        assert!(!config.keep_one_attacking_land_unit);
    }
}
