//! Order-of-losses strings: `amount^unitType;amount^unitType`.
//!
//! `amount` is a positive count or `*` for every unit of that type.
//! Sections later in the string claim their units first, so they are lost
//! last: `*^infantry;1^infantry` keeps one infantry for the very end.

use thiserror::Error;

use crate::game::{GameData, Unit};

const SEPARATOR: char = ';';
const AMOUNT_DESCRIPTOR: char = '^';
const ALL: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OolError {
    #[error("order of losses section '{0}' is not of the form amount^unitType")]
    Malformed(String),
    #[error("invalid amount '{0}' in order of losses")]
    InvalidAmount(String),
    #[error("unknown unit type '{0}' in order of losses")]
    UnknownUnitType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OolAmount {
    All,
    Exactly(usize),
}

impl OolAmount {
    fn limit(self) -> usize {
        match self {
            OolAmount::All => usize::MAX,
            OolAmount::Exactly(n) => n,
        }
    }
}

/// A parsed order of losses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderOfLosses {
    sections: Vec<(OolAmount, String)>,
}

impl OrderOfLosses {
    /// Parses and validates `ool` against the unit types in `data`.
    /// A blank string is an empty order.
    pub fn parse(ool: &str, data: &GameData) -> Result<Self, OolError> {
        let mut sections = Vec::new();
        for section in ool.trim().split(SEPARATOR).map(str::trim) {
            if section.is_empty() {
                continue;
            }
            let mut parts = section.split(AMOUNT_DESCRIPTOR);
            let (Some(amount), Some(unit_type), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(OolError::Malformed(section.to_string()));
            };
            let amount = match amount.trim() {
                ALL => OolAmount::All,
                n => match n.parse::<usize>() {
                    Ok(n) if n > 0 => OolAmount::Exactly(n),
                    _ => return Err(OolError::InvalidAmount(n.to_string())),
                },
            };
            let unit_type = unit_type.trim();
            if data.unit_type(unit_type).is_none() {
                return Err(OolError::UnknownUnitType(unit_type.to_string()));
            }
            sections.push((amount, unit_type.to_string()));
        }
        Ok(OrderOfLosses { sections })
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Lists `units` in the order they should be lost. Units no section
    /// asks for are left out.
    pub fn resolve(&self, units: &[Unit]) -> Vec<Unit> {
        let mut left: Vec<Unit> = units.to_vec();
        let mut order = Vec::new();
        for (amount, unit_type) in self.sections.iter().rev() {
            let mut wanted = amount.limit();
            left.retain(|u| {
                if wanted > 0 && u.type_name() == unit_type {
                    wanted -= 1;
                    order.push(u.clone());
                    false
                } else {
                    true
                }
            });
        }
        order.reverse();
        order
    }
}
