//! Diplomatic relationships between players.
//!
//! Relationships default to what the alliances imply (shared alliance means
//! allied, disjoint alliances mean war, no alliance at all means neutral) and
//! can be overridden per pair.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::player::{Player, PlayerId};

/// How two players stand towards each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    War,
    Neutral,
    Allied,
}

/// Read-only view of the relationship graph.
pub trait Relationships {
    /// Returns the relationship between two players. A player is always allied
    /// with itself.
    fn relationship(&self, a: PlayerId, b: PlayerId) -> RelationshipKind;

    /// Names of the alliances the player belongs to.
    fn alliances_of(&self, player: PlayerId) -> BTreeSet<String>;

    fn is_at_war(&self, a: PlayerId, b: PlayerId) -> bool {
        self.relationship(a, b) == RelationshipKind::War
    }

    fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        self.relationship(a, b) == RelationshipKind::Allied
    }
}

/// Relationship graph with alliance-derived defaults and explicit overrides.
#[derive(Debug, Clone, Default)]
pub struct RelationshipTracker {
    alliances: HashMap<PlayerId, BTreeSet<String>>,
    overrides: HashMap<(PlayerId, PlayerId), RelationshipKind>,
}

/// Orders a pair so that lookups are symmetric.
fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl RelationshipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a player's alliance membership.
    pub fn register(&mut self, player: &Player) {
        self.alliances
            .insert(player.id, player.alliances.iter().cloned().collect());
    }

    /// Overrides the relationship between two distinct players.
    pub fn set_relationship(&mut self, a: PlayerId, b: PlayerId, kind: RelationshipKind) {
        if a != b {
            self.overrides.insert(key(a, b), kind);
        }
    }
}

impl Relationships for RelationshipTracker {
    fn relationship(&self, a: PlayerId, b: PlayerId) -> RelationshipKind {
        if a == b {
            return RelationshipKind::Allied;
        }
        if let Some(kind) = self.overrides.get(&key(a, b)) {
            return *kind;
        }
        let empty = BTreeSet::new();
        let left = self.alliances.get(&a).unwrap_or(&empty);
        let right = self.alliances.get(&b).unwrap_or(&empty);
        if left.is_empty() || right.is_empty() {
            RelationshipKind::Neutral
        } else if left.intersection(right).next().is_some() {
            RelationshipKind::Allied
        } else {
            RelationshipKind::War
        }
    }

    fn alliances_of(&self, player: PlayerId) -> BTreeSet<String> {
        self.alliances.get(&player).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> RelationshipTracker {
        let mut t = RelationshipTracker::new();
        for (id, alliances) in [
            (0, vec!["Allies"]),
            (1, vec!["Axis"]),
            (2, vec!["Allies"]),
            (3, vec![]),
        ] {
            t.register(&Player {
                id: PlayerId(id),
                name: format!("p{}", id),
                alliances: alliances.into_iter().map(String::from).collect(),
            });
        }
        t
    }

    #[test]
    fn alliance_defaults() {
        let t = tracker();
        assert!(t.is_allied(PlayerId(0), PlayerId(2)));
        assert!(t.is_at_war(PlayerId(0), PlayerId(1)));
        assert!(t.is_at_war(PlayerId(1), PlayerId(0)));
        assert_eq!(t.relationship(PlayerId(0), PlayerId(3)), RelationshipKind::Neutral);
    }

    #[test]
    fn self_is_always_allied() {
        let t = tracker();
        assert!(t.is_allied(PlayerId(3), PlayerId(3)));
        assert!(!t.is_at_war(PlayerId(1), PlayerId(1)));
    }

    #[test]
    fn override_is_symmetric() {
        let mut t = tracker();
        t.set_relationship(PlayerId(2), PlayerId(0), RelationshipKind::War);
        assert!(t.is_at_war(PlayerId(0), PlayerId(2)));
        assert!(t.is_at_war(PlayerId(2), PlayerId(0)));
    }

    #[test]
    fn alliances_of_unknown_player_is_empty() {
        let t = tracker();
        assert!(t.alliances_of(PlayerId(42)).is_empty());
        assert!(t.alliances_of(PlayerId(0)).contains("Allies"));
    }
}
