//! JSON scenario files.
//!
//! A scenario describes the players, unit types and territories of a map and
//! may carry calculator settings:
//!
//! ```json
//! {
//!   "dice_sides": 6,
//!   "players": [{ "name": "Germans", "alliances": ["Axis"] }],
//!   "unit_types": [{ "name": "infantry", "attack": 1, "defense": 2, "cost": 3 }],
//!   "territories": [{
//!     "name": "Germany", "owner": "Germans",
//!     "units": [{ "type": "infantry", "owner": "Germans", "count": 3 }]
//!   }],
//!   "calculator": { "seed": 1 }
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::calculator::CalculatorConfig;
use crate::game::{GameData, RelationshipKind, Territory, UnitType, DEFAULT_DICE_SIDES};

/// Errors that can occur while loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown player '{0}'")]
    UnknownPlayer(String),

    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),

    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default = "default_dice_sides")]
    dice_sides: u32,
    players: Vec<PlayerEntry>,
    #[serde(default)]
    relationships: Vec<RelationshipEntry>,
    unit_types: Vec<UnitType>,
    #[serde(default)]
    territories: Vec<TerritoryEntry>,
    #[serde(default)]
    calculator: CalculatorConfig,
}

fn default_dice_sides() -> u32 {
    DEFAULT_DICE_SIDES
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    name: String,
    #[serde(default)]
    alliances: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RelationshipEntry {
    a: String,
    b: String,
    kind: RelationshipKind,
}

#[derive(Debug, Deserialize)]
struct TerritoryEntry {
    name: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    water: bool,
    #[serde(default)]
    units: Vec<UnitStack>,
}

#[derive(Debug, Deserialize)]
struct UnitStack {
    #[serde(rename = "type")]
    unit_type: String,
    owner: String,
    #[serde(default = "one")]
    count: usize,
}

fn one() -> usize {
    1
}

/// A loaded scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub data: GameData,
    pub calculator: CalculatorConfig,
}

/// Load a scenario from a JSON file.
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let json = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(&json)
}

/// Parse a scenario from a JSON string.
pub fn parse_scenario(json: &str) -> Result<Scenario, ScenarioError> {
    let file: ScenarioFile = serde_json::from_str(json)?;
    let mut data = GameData::new(file.dice_sides);

    for player in &file.players {
        if data.player_by_name(&player.name).is_some() {
            return Err(ScenarioError::Duplicate {
                kind: "player",
                name: player.name.clone(),
            });
        }
        let alliances: Vec<&str> = player.alliances.iter().map(String::as_str).collect();
        data.add_player(&player.name, &alliances);
    }

    let player = |data: &GameData, name: &str| {
        data.player_by_name(name)
            .ok_or_else(|| ScenarioError::UnknownPlayer(name.to_string()))
    };

    for rel in &file.relationships {
        let a = player(&data, &rel.a)?;
        let b = player(&data, &rel.b)?;
        data.set_relationship(a, b, rel.kind);
    }

    for unit_type in file.unit_types {
        if data.unit_type(&unit_type.name).is_some() {
            return Err(ScenarioError::Duplicate {
                kind: "unit type",
                name: unit_type.name,
            });
        }
        data.add_unit_type(unit_type);
    }

    let mut seen = HashSet::new();
    for entry in &file.territories {
        if !seen.insert(entry.name.as_str()) {
            return Err(ScenarioError::Duplicate {
                kind: "territory",
                name: entry.name.clone(),
            });
        }
        let owner = entry
            .owner
            .as_deref()
            .map(|name| player(&data, name))
            .transpose()?;
        let mut territory = Territory::new(entry.name.clone(), owner, entry.water);
        for stack in &entry.units {
            let owner = player(&data, &stack.owner)?;
            let units = data
                .create_units(&stack.unit_type, stack.count, owner)
                .ok_or_else(|| ScenarioError::UnknownUnitType(stack.unit_type.clone()))?;
            territory.add_units(units);
        }
        data.add_territory(territory);
    }

    Ok(Scenario {
        data,
        calculator: file.calculator,
    })
}
