//! The battle seam.
//!
//! A `BattleEngine` fights one battle to completion on a private copy of the
//! game data, asking a `BattleController` per side for every decision. The
//! calculator runs the engine thousands of times and aggregates the
//! `SimulationRun`s it returns.

pub mod casualty;
pub mod controller;
pub mod dice;
pub mod outcome;
pub mod setup;
pub mod state;

use rand::RngCore;
use thiserror::Error;

use crate::game::GameData;

pub use casualty::{
    default_casualties, interleave_carriers_and_planes, CasualtyDetails, CasualtyError,
    CasualtyList, CasualtyRequest,
};
pub use controller::{BattleController, RetreatQuery};
pub use dice::DiceBattleEngine;
pub use outcome::{SimulationRun, Winner};
pub use setup::{BattleSetup, Side};
pub use state::{normalized_meta_power, BattleState};

#[derive(Debug, Error)]
pub enum BattleError {
    #[error(transparent)]
    Casualty(#[from] CasualtyError),
    #[error("battle territory '{0}' does not exist")]
    UnknownTerritory(String),
}

/// Fights one battle to a conclusion.
///
/// `data` is the trial's own copy; the engine removes and damages units in
/// it as casualties are taken. Implementations must be shareable across the
/// calculator's worker threads.
pub trait BattleEngine: Send + Sync {
    fn run_battle(
        &self,
        setup: &BattleSetup,
        data: &mut GameData,
        attacker: &mut dyn BattleController,
        defender: &mut dyn BattleController,
        rng: &mut dyn RngCore,
    ) -> Result<SimulationRun, BattleError>;
}
