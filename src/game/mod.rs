//! Domain model consumed by the calculator.
//!
//! Players, the relationship graph, unit types, units, territories and the
//! `GameData` snapshot that ties them together.

pub mod data;
pub mod player;
pub mod relationship;
pub mod territory;
pub mod unit;

pub use data::{tuv, GameData, TuvCosts, DEFAULT_DICE_SIDES};
pub use player::{Player, PlayerId};
pub use relationship::{RelationshipKind, RelationshipTracker, Relationships};
pub use territory::{Territory, TerritoryEffect};
pub use unit::{Unit, UnitId, UnitType};
