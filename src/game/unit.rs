//! Unit types and individual units.
//!
//! A `UnitType` carries the combat profile shared by every unit of that
//! type; a `Unit` is one piece on the map with an owner and accumulated
//! damage. Units compare by id only, so a damaged copy of a unit is still
//! the same unit.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// The combat profile of a kind of unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitType {
    pub name: String,
    pub attack: u32,
    pub defense: u32,
    pub hit_points: u32,
    /// Production cost, used for TUV and default casualty ordering.
    pub cost: i32,
    pub is_sea: bool,
    pub is_air: bool,
    /// AA guns, factories and similar units that never take part in combat.
    pub is_infrastructure: bool,
    pub is_sub: bool,
    pub is_destroyer: bool,
    /// Space this air unit takes on a carrier (0 = cannot land on carriers).
    pub carrier_cost: i32,
    /// Space a carrier offers to air units (0 = not a carrier).
    pub carrier_capacity: i32,
    pub can_bombard: bool,
}

impl Default for UnitType {
    fn default() -> Self {
        UnitType {
            name: String::new(),
            attack: 0,
            defense: 0,
            hit_points: 1,
            cost: 0,
            is_sea: false,
            is_air: false,
            is_infrastructure: false,
            is_sub: false,
            is_destroyer: false,
            carrier_cost: 0,
            carrier_capacity: 0,
            can_bombard: false,
        }
    }
}

impl UnitType {
    pub fn is_land(&self) -> bool {
        !self.is_sea && !self.is_air
    }

    /// Returns true if a unit of this type can take a territory on its own.
    pub fn can_capture_alone(&self) -> bool {
        self.is_land() && !self.is_infrastructure
    }

    pub fn is_carrier(&self) -> bool {
        self.carrier_capacity > 0
    }

    pub fn can_land_on_carrier(&self) -> bool {
        self.carrier_cost > 0
    }
}

/// Unique identity of a unit within one `GameData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// A single unit on the map.
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: Arc<UnitType>,
    pub owner: PlayerId,
    /// Hits already taken. A unit dies when it would reach its hit points.
    pub hits: u32,
}

impl Unit {
    pub fn new(id: UnitId, unit_type: Arc<UnitType>, owner: PlayerId) -> Self {
        Unit {
            id,
            unit_type,
            owner,
            hits: 0,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.unit_type.name
    }

    /// Hit points this unit can still lose before it dies.
    pub fn hit_points_left(&self) -> u32 {
        self.unit_type.hit_points.saturating_sub(self.hits)
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == player
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Unit {}

impl Hash for Unit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
