//! The odds calculator.
//!
//! `BattleCalculator::calculate` infers any missing sides, builds one
//! `BattleSetup`, splits the requested runs over a rayon pool with a
//! `RunCountDistributor`, lets `DummyPlayer`s fight every trial on a private
//! copy of the game data and collects the outcomes in `AggregateResults`.

pub mod battle_calculator;
pub mod distributor;
pub mod dummy_player;
pub mod order_of_losses;
pub mod results;
pub mod selector;

pub use battle_calculator::{
    BattleCalculator, BattleRequest, CalcError, CalculatorConfig, ResolvedSides,
};
pub use distributor::{DistributorError, RunCountDistributor};
pub use dummy_player::{DummyPlayer, DummyPlayerConfig, RetreatPolicy};
pub use order_of_losses::{OolAmount, OolError, OrderOfLosses};
pub use results::{AggregateResults, ResultsSummary};
pub use selector::{AttackerAndDefender, AttackerAndDefenderSelector};
