//! The live state of a battle in progress.
//!
//! Controllers receive a `&BattleState` with every query so they can look at
//! both sides' surviving units, the round number and the combat modifiers.

use crate::game::{PlayerId, TerritoryEffect, Unit, DEFAULT_DICE_SIDES};

use super::setup::{BattleSetup, Side};

/// Working state of one trial's battle.
#[derive(Debug, Clone)]
pub struct BattleState {
    pub territory: String,
    pub is_water: bool,
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub attacking_units: Vec<Unit>,
    pub defending_units: Vec<Unit>,
    /// Rounds started so far (0 before the first round).
    pub round: u32,
    pub territory_effects: Vec<TerritoryEffect>,
    pub dice_sides: u32,
}

impl BattleState {
    pub fn new(setup: &BattleSetup, is_water: bool, dice_sides: u32) -> Self {
        BattleState {
            territory: setup.territory.clone(),
            is_water,
            attacker: setup.attacker,
            defender: setup.defender,
            attacking_units: setup.attacking_units.clone(),
            defending_units: setup.defending_units.clone(),
            round: 0,
            territory_effects: setup.territory_effects.clone(),
            dice_sides: dice_sides.max(1),
        }
    }

    pub fn player(&self, side: Side) -> PlayerId {
        match side {
            Side::Attacker => self.attacker,
            Side::Defender => self.defender,
        }
    }

    pub fn units(&self, side: Side) -> &[Unit] {
        match side {
            Side::Attacker => &self.attacking_units,
            Side::Defender => &self.defending_units,
        }
    }

    pub fn units_mut(&mut self, side: Side) -> &mut Vec<Unit> {
        match side {
            Side::Attacker => &mut self.attacking_units,
            Side::Defender => &mut self.defending_units,
        }
    }

    /// Units of `side` that take part in combat (everything but infrastructure).
    pub fn combatants(&self, side: Side) -> Vec<Unit> {
        self.units(side)
            .iter()
            .filter(|u| !u.unit_type.is_infrastructure)
            .cloned()
            .collect()
    }

    pub fn has_combatants(&self, side: Side) -> bool {
        self.units(side).iter().any(|u| !u.unit_type.is_infrastructure)
    }

    /// Effective die value of `unit` fighting for `side`, territory effects
    /// included, clamped to the die size.
    pub fn strength(&self, unit: &Unit, side: Side) -> u32 {
        if unit.unit_type.is_infrastructure {
            return 0;
        }
        let (base, modifier) = match side {
            Side::Attacker => (
                unit.unit_type.attack as i64,
                self.territory_effects.iter().map(|e| e.attack_modifier as i64).sum::<i64>(),
            ),
            Side::Defender => (
                unit.unit_type.defense as i64,
                self.territory_effects.iter().map(|e| e.defense_modifier as i64).sum::<i64>(),
            ),
        };
        (base + modifier).clamp(0, self.dice_sides as i64) as u32
    }

    pub fn total_power(&self, side: Side) -> u32 {
        self.units(side).iter().map(|u| self.strength(u, side)).sum()
    }

    pub fn total_hit_points(&self, side: Side) -> u32 {
        self.units(side)
            .iter()
            .filter(|u| !u.unit_type.is_infrastructure)
            .map(|u| u.hit_points_left())
            .sum()
    }

    pub fn meta_power(&self, side: Side) -> u64 {
        normalized_meta_power(
            self.total_power(side),
            self.total_hit_points(side),
            self.dice_sides,
        )
    }
}

/// Rough fighting value of a force: its power rescaled to a six-sided die,
/// multiplied by the hits it can absorb.
pub fn normalized_meta_power(power: u32, hit_points: u32, dice_sides: u32) -> u64 {
    let normalized =
        u64::from(power) * u64::from(DEFAULT_DICE_SIDES) / u64::from(dice_sides.max(1));
    normalized.saturating_mul(u64::from(hit_points))
}
