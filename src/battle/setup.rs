//! The immutable description of one battle to simulate.

use crate::game::{PlayerId, TerritoryEffect, Unit};

/// One side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }
}

/// Everything a trial needs to know about the battle it fights.
///
/// Built once per calculation and shared read-only by all worker threads.
#[derive(Debug, Clone)]
pub struct BattleSetup {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub attacking_units: Vec<Unit>,
    pub defending_units: Vec<Unit>,
    /// Sea units supporting a land attack; they fire once in the first round.
    pub bombarding_units: Vec<Unit>,
    pub territory: String,
    pub territory_effects: Vec<TerritoryEffect>,
    pub keep_at_least_one_attacking_land_unit: bool,
    pub retreat_allowed: bool,
    /// The attacking land units came ashore from transports and cannot
    /// retreat.
    pub amphibious: bool,
    pub run_count: u32,
}
