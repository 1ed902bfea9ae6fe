//! Players and their alliances.

use serde::{Deserialize, Serialize};

/// Index of a player within its `GameData` player list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u16);

/// A participant in the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Names of the alliances this player belongs to.
    pub alliances: Vec<String>,
}
