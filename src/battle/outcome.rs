//! The result of a single simulated battle.

use serde::{Deserialize, Serialize};

use crate::game::Unit;

/// Who came out on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Attacker,
    Defender,
    /// Mutual destruction, a stalemate, or the round limit was reached.
    Draw,
}

/// Outcome of exactly one trial.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub winner: Winner,
    pub attacker_units_remaining: Vec<Unit>,
    pub defender_units_remaining: Vec<Unit>,
    pub rounds_fought: u32,
}

impl SimulationRun {
    pub fn attacker_won(&self) -> bool {
        self.winner == Winner::Attacker
    }

    pub fn defender_won(&self) -> bool {
        self.winner == Winner::Defender
    }

    pub fn is_draw(&self) -> bool {
        self.winner == Winner::Draw
    }
}
