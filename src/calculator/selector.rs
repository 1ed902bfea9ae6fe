//! Works out who attacks and who defends a territory.

use crate::game::{PlayerId, Relationships, Territory, Unit};

/// The inferred sides of a battle and the units each brings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttackerAndDefender {
    pub attacker: Option<PlayerId>,
    pub defender: Option<PlayerId>,
    pub attacking_units: Vec<Unit>,
    pub defending_units: Vec<Unit>,
}

/// Inputs to the side inference. Pure: nothing here is mutated.
///
/// The current player always attacks. The defender is chosen from the
/// enemies with units in the territory, preferring its owner; with no enemy
/// units present it falls back to an enemy owner, then to any enemy, then to
/// any other player.
pub struct AttackerAndDefenderSelector<'a> {
    /// Players in turn order. Ties are broken by this order.
    pub players: &'a [PlayerId],
    pub current_player: Option<PlayerId>,
    pub relationships: &'a dyn Relationships,
    pub territory: Option<&'a Territory>,
}

impl<'a> AttackerAndDefenderSelector<'a> {
    pub fn attacker_and_defender(&self) -> AttackerAndDefender {
        let Some(attacker) = self.current_player else {
            return AttackerAndDefender::default();
        };
        let Some(territory) = self.territory else {
            return AttackerAndDefender {
                attacker: Some(attacker),
                defender: self.some_enemy(attacker),
                ..Default::default()
            };
        };

        let owners = territory.unit_owners();
        let enemies: Vec<PlayerId> = self
            .players
            .iter()
            .copied()
            .filter(|p| *p != attacker && owners.contains(p))
            .filter(|p| self.relationships.is_at_war(attacker, *p))
            .collect();

        let Some(&first_enemy) = enemies.first() else {
            let defender = territory
                .owner
                .filter(|owner| {
                    *owner != attacker && self.relationships.is_at_war(attacker, *owner)
                })
                .or_else(|| self.some_enemy(attacker));
            return AttackerAndDefender {
                attacker: Some(attacker),
                defender,
                ..Default::default()
            };
        };

        let defender = territory
            .owner
            .filter(|owner| enemies.contains(owner))
            .unwrap_or(first_enemy);
        let defending_units = territory
            .units
            .iter()
            .filter(|u| {
                u.owner == defender
                    || (enemies.contains(&u.owner)
                            && self.relationships.is_allied(u.owner, defender))
            })
            .cloned()
            .collect();

        AttackerAndDefender {
            attacker: Some(attacker),
            defender: Some(defender),
            attacking_units: territory.units_owned_by(attacker),
            defending_units,
        }
    }

    /// First player at war with `player`, else the first other player.
    fn some_enemy(&self, player: PlayerId) -> Option<PlayerId> {
        let others = || self.players.iter().copied().filter(move |p| *p != player);
        others()
            .find(|p| self.relationships.is_at_war(player, *p))
            .or_else(|| others().next())
    }
}
