//! The game-state snapshot consumed by the calculator.
//!
//! `GameData` owns every player, unit type and territory. Cloning it is a
//! deep copy of the mutable state (territory unit lists, hit counters); unit
//! types are shared behind `Arc` since they never change during a battle.

use std::collections::HashMap;
use std::sync::Arc;

use super::player::{Player, PlayerId};
use super::relationship::{RelationshipKind, RelationshipTracker};
use super::territory::Territory;
use super::unit::{Unit, UnitId, UnitType};

/// Default number of sides on a combat die.
pub const DEFAULT_DICE_SIDES: u32 = 6;

/// Supplies per-unit-type values for TUV calculations.
pub trait TuvCosts {
    /// Cost of each unit type, keyed by unit type name, as seen by `player`.
    fn costs_for_tuv(&self, player: PlayerId) -> HashMap<String, i32>;
}

/// Sums the TUV of the non-infrastructure units in `units`.
pub fn tuv(units: &[Unit], costs: &HashMap<String, i32>) -> i32 {
    units
        .iter()
        .filter(|u| !u.unit_type.is_infrastructure)
        .map(|u| costs.get(u.type_name()).copied().unwrap_or(0))
        .sum()
}

/// Complete snapshot of the players, map and units.
#[derive(Debug, Clone)]
pub struct GameData {
    dice_sides: u32,
    players: Vec<Player>,
    relationships: RelationshipTracker,
    unit_types: HashMap<String, Arc<UnitType>>,
    territories: Vec<Territory>,
    next_unit_id: u32,
}

impl Default for GameData {
    fn default() -> Self {
        GameData::new(DEFAULT_DICE_SIDES)
    }
}

impl GameData {
    pub fn new(dice_sides: u32) -> Self {
        GameData {
            dice_sides: dice_sides.max(1),
            players: Vec::new(),
            relationships: RelationshipTracker::new(),
            unit_types: HashMap::new(),
            territories: Vec::new(),
            next_unit_id: 0,
        }
    }

    pub fn dice_sides(&self) -> u32 {
        self.dice_sides
    }

    /// Adds a player and returns its id.
    pub fn add_player(&mut self, name: &str, alliances: &[&str]) -> PlayerId {
        let id = PlayerId(self.players.len() as u16);
        let player = Player {
            id,
            name: name.to_string(),
            alliances: alliances.iter().map(|a| a.to_string()).collect(),
        };
        self.relationships.register(&player);
        self.players.push(player);
        id
    }

    pub fn set_relationship(&mut self, a: PlayerId, b: PlayerId, kind: RelationshipKind) {
        self.relationships.set_relationship(a, b, kind);
    }

    pub fn add_unit_type(&mut self, unit_type: UnitType) -> Arc<UnitType> {
        let unit_type = Arc::new(unit_type);
        self.unit_types
            .insert(unit_type.name.clone(), Arc::clone(&unit_type));
        unit_type
    }

    pub fn add_territory(&mut self, territory: Territory) {
        self.territories.push(territory);
    }

    /// Creates `count` fresh units with new ids. They are not placed anywhere.
    /// Returns `None` for an unknown unit type.
    pub fn create_units(
        &mut self,
        type_name: &str,
        count: usize,
        owner: PlayerId,
    ) -> Option<Vec<Unit>> {
        let unit_type = Arc::clone(self.unit_types.get(type_name)?);
        let units = (0..count)
            .map(|_| {
                let id = UnitId(self.next_unit_id);
                self.next_unit_id += 1;
                Unit::new(id, Arc::clone(&unit_type), owner)
            })
            .collect();
        Some(units)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0 as usize)
    }

    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.id)
    }

    /// Display name of a player, or `"?"` for an unknown id.
    pub fn player_name(&self, id: PlayerId) -> &str {
        self.player(id).map(|p| p.name.as_str()).unwrap_or("?")
    }

    pub fn relationships(&self) -> &RelationshipTracker {
        &self.relationships
    }

    pub fn unit_type(&self, name: &str) -> Option<&Arc<UnitType>> {
        self.unit_types.get(name)
    }

    pub fn unit_types(&self) -> impl Iterator<Item = &Arc<UnitType>> {
        self.unit_types.values()
    }

    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }

    pub fn territory(&self, name: &str) -> Option<&Territory> {
        self.territories.iter().find(|t| t.name == name)
    }

    pub fn territory_mut(&mut self, name: &str) -> Option<&mut Territory> {
        self.territories.iter_mut().find(|t| t.name == name)
    }
}

impl TuvCosts for GameData {
    fn costs_for_tuv(&self, _player: PlayerId) -> HashMap<String, i32> {
        self.unit_types
            .values()
            .map(|t| (t.name.clone(), t.cost))
            .collect()
    }
}
