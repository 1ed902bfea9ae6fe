//! Territories, sea zones, and the effects they apply to combat.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::unit::{Unit, UnitId};

/// A combat modifier attached to a territory (terrain, fortifications).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerritoryEffect {
    pub name: String,
    pub attack_modifier: i32,
    pub defense_modifier: i32,
}

/// A land territory or sea zone and the units in it.
#[derive(Debug, Clone)]
pub struct Territory {
    pub name: String,
    /// Legal owner. Sea zones and unowned land have none.
    pub owner: Option<PlayerId>,
    pub is_water: bool,
    pub units: Vec<Unit>,
}

impl Territory {
    pub fn new(name: impl Into<String>, owner: Option<PlayerId>, is_water: bool) -> Self {
        Territory {
            name: name.into(),
            owner,
            is_water,
            units: Vec::new(),
        }
    }

    /// Units present that belong to `player`, in territory order.
    pub fn units_owned_by(&self, player: PlayerId) -> Vec<Unit> {
        self.units
            .iter()
            .filter(|u| u.is_owned_by(player))
            .cloned()
            .collect()
    }

    /// Owners of the units present, in order of first appearance.
    pub fn unit_owners(&self) -> Vec<PlayerId> {
        let mut owners = Vec::new();
        for unit in &self.units {
            if !owners.contains(&unit.owner) {
                owners.push(unit.owner);
            }
        }
        owners
    }

    pub fn add_units(&mut self, units: impl IntoIterator<Item = Unit>) {
        self.units.extend(units);
    }

    pub fn remove_units(&mut self, ids: &[UnitId]) {
        self.units.retain(|u| !ids.contains(&u.id));
    }

    /// Adds one hit to the given unit, if present.
    pub fn damage_unit(&mut self, id: UnitId) {
        if let Some(unit) = self.units.iter_mut().find(|u| u.id == id) {
            unit.hits += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::game::unit::UnitType;

    fn unit(id: u32, owner: u16) -> Unit {
        Unit::new(UnitId(id), Arc::new(UnitType::default()), PlayerId(owner))
    }

    #[test]
    fn owners_in_first_appearance_order() {
        let mut t = Territory::new("Germany", Some(PlayerId(1)), false);
        t.add_units([unit(1, 3), unit(2, 1), unit(3, 3), unit(4, 0)]);
        assert_eq!(t.unit_owners(), vec![PlayerId(3), PlayerId(1), PlayerId(0)]);
        assert_eq!(t.units_owned_by(PlayerId(3)).len(), 2);
    }

    #[test]
    fn remove_and_damage() {
        let mut t = Territory::new("Japan", None, false);
        t.add_units([unit(1, 0), unit(2, 0), unit(3, 0)]);
        t.remove_units(&[UnitId(2)]);
        t.damage_unit(UnitId(3));
        t.damage_unit(UnitId(99));
        assert_eq!(t.units.len(), 2);
        assert_eq!(t.units[1].hits, 1);
    }
}
