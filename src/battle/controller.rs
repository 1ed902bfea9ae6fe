//! The decision interface a battle drives for each side.

use std::collections::HashMap;

use rand::RngCore;

use crate::game::Unit;

use super::casualty::{CasualtyDetails, CasualtyError, CasualtyRequest};
use super::state::BattleState;

/// A retreat (or submerge) offer made to a side after a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetreatQuery {
    /// True when the offer is for submarines to submerge.
    pub submerge: bool,
    pub battle_site: String,
    pub possible_territories: Vec<String>,
}

/// Makes every choice a side faces during a battle.
///
/// The battle engine calls these while a trial runs; the current battle is
/// passed to each query that needs it.
pub trait BattleController {
    fn name(&self) -> &str;

    /// Chooses which units absorb `request.count` hits.
    fn select_casualties(
        &mut self,
        battle: &BattleState,
        request: &CasualtyRequest<'_>,
    ) -> Result<CasualtyDetails, CasualtyError>;

    /// Returns the territory to retreat to, or `None` to keep fighting.
    fn retreat_query(&mut self, battle: &BattleState, query: &RetreatQuery) -> Option<String>;

    /// Picks which units scramble into `scramble_to`, per source territory.
    fn scramble_units_query(
        &mut self,
        scramble_to: &str,
        possible_scramblers: &HashMap<String, Vec<Unit>>,
    ) -> HashMap<String, Vec<Unit>>;

    fn what_should_bomber_bomb(
        &mut self,
        territory: &str,
        potential_targets: &[Unit],
        bombers: &[Unit],
    ) -> Option<Unit>;

    fn select_kamikaze_attacks(
        &mut self,
        possible: &HashMap<String, Vec<Unit>>,
    ) -> HashMap<String, Vec<Unit>>;

    fn confirm_move_kamikaze(&mut self) -> bool;

    /// Chooses die values for `rolls` dice; a controller with no preference
    /// rolls them.
    fn select_fixed_dice(&mut self, rolls: usize, dice_sides: u32, rng: &mut dyn RngCore)
        -> Vec<u32>;
}
