//! Casualty lists, casualty requests and the default casualty choice.

use thiserror::Error;

use crate::game::{PlayerId, Unit, UnitId};

/// Units a side loses to dice in one round.
///
/// `damaged` may name the same multi-hit unit more than once: each entry
/// absorbs one hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasualtyList {
    pub killed: Vec<Unit>,
    pub damaged: Vec<Unit>,
}

impl CasualtyList {
    /// Number of hits this list absorbs.
    pub fn len(&self) -> usize {
        self.killed.len() + self.damaged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.killed.is_empty() && self.damaged.is_empty()
    }
}

/// A controller's answer to a casualty request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasualtyDetails {
    pub killed: Vec<Unit>,
    pub damaged: Vec<Unit>,
    /// True when the selection was computed rather than chosen by a person.
    pub auto_calculated: bool,
}

impl CasualtyDetails {
    pub fn new(list: CasualtyList, auto_calculated: bool) -> Self {
        CasualtyDetails {
            killed: list.killed,
            damaged: list.damaged,
            auto_calculated,
        }
    }

    pub fn len(&self) -> usize {
        self.killed.len() + self.damaged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.killed.is_empty() && self.damaged.is_empty()
    }
}

/// What the battle asks a controller when its side has been hit.
#[derive(Debug, Clone)]
pub struct CasualtyRequest<'a> {
    pub select_from: &'a [Unit],
    /// Hits to absorb.
    pub count: usize,
    pub hit_player: PlayerId,
    pub default_casualties: &'a CasualtyList,
    pub allow_multiple_hits_per_unit: bool,
}

#[derive(Debug, Error)]
pub enum CasualtyError {
    #[error("default casualties absorb {default} hits but {requested} must be taken")]
    CountMismatch { requested: usize, default: usize },
    #[error("selected casualties absorb {selected} hits but {requested} must be taken")]
    WrongCasualtyCount { requested: usize, selected: usize },
    #[error("unit {0:?} is not among the units that can be selected")]
    NotSelectable(UnitId),
}

/// Picks casualties the way an unattended player would.
///
/// Multi-hit units soak up damage first. The remaining hits kill the
/// cheapest units, weakest first among equal cost, with carriers kept
/// next to the planes that depend on them.
pub fn default_casualties(
    select_from: &[Unit],
    count: usize,
    strength: impl Fn(&Unit) -> u32,
) -> CasualtyList {
    let mut list = CasualtyList::default();
    if count == 0 {
        return list;
    }

    let mut sorted: Vec<Unit> = select_from.to_vec();
    sorted.sort_by_key(|u| (u.unit_type.cost, strength(u)));

    for unit in &sorted {
        let spare = unit.hit_points_left().saturating_sub(1) as usize;
        for _ in 0..spare {
            if list.damaged.len() == count {
                break;
            }
            list.damaged.push(unit.clone());
        }
    }

    let ordered = interleave_carriers_and_planes(sorted, 0);
    let kills = count - list.damaged.len();
    list.killed = ordered.into_iter().take(kills).collect();
    list
}

/// Reorders a loss list so each carrier sits right after the planes it
/// carries, so planes are lost before the deck they would land on.
///
/// The list is walked from the end. The rightmost carrier not yet filled
/// takes the planes met on the way until its capacity is used up; a plane
/// that overflows it is offered to the next carrier. A filled carrier is
/// moved next to its planes: a carrier further left is moved up behind
/// them, a carrier further right is moved down and its planes are gathered
/// in front of it in their original order. The last
/// `planes_that_dont_need_to_land` planes need no deck and keep their place.
pub fn interleave_carriers_and_planes(
    units: Vec<Unit>,
    planes_that_dont_need_to_land: usize,
) -> Vec<Unit> {
    let has_carrier = units.iter().any(|u| u.unit_type.is_carrier());
    let has_plane = units.iter().any(|u| u.unit_type.can_land_on_carrier());
    if !has_carrier || !has_plane {
        return units;
    }

    let mut result = units;
    let mut filled: Vec<UnitId> = Vec::new();
    let mut seeked: Option<UnitId> = None;
    // Where the seeked carrier goes; 0 means no slot yet.
    let mut place_at = 0usize;
    let mut space = 0i32;
    let mut skipped = 0usize;

    let mut i = result.len() as isize;
    while i > 0 {
        i -= 1;
        let index = i as usize;
        let cost = result[index].unit_type.carrier_cost;
        if cost <= 0 && index > 0 {
            continue;
        }
        if skipped < planes_that_dont_need_to_land && index > 0 {
            skipped += 1;
            continue;
        }

        if seeked.is_none() && index > 0 {
            let Some(carrier) = last_unfilled_carrier(&result, &filled) else {
                break;
            };
            seeked = Some(result[carrier].id);
            place_at = index + 1;
            space = result[carrier].unit_type.carrier_capacity;
        }
        if cost > 0 {
            space -= cost;
        }

        let Some(carrier_id) = seeked else {
            continue;
        };
        if place_at == 0 || (space > 0 && index > 0) {
            continue;
        }
        if space < 0 {
            // This plane did not fit; offer it to the next carrier.
            i += 1;
        }
        let Some(carrier_at) = result.iter().position(|u| u.id == carrier_id) else {
            break;
        };
        filled.push(carrier_id);

        if (carrier_at as isize) < i {
            let carrier = result.remove(carrier_at);
            result.insert(place_at - 1, carrier);
            i -= 1;
            let Some(next) = last_unfilled_carrier(&result, &filled) else {
                break;
            };
            seeked = Some(result[next].id);
            place_at = i.max(0) as usize;
            space = result[next].unit_type.carrier_capacity;
        } else {
            let carrier = result.remove(carrier_at);
            let location = if carrier_at < place_at {
                place_at - 1
            } else {
                place_at
            };
            result.insert(location, carrier);

            let first = i.max(0) as usize;
            let plane_slots: Vec<usize> = (first..location)
                .filter(|&j| result[j].unit_type.carrier_cost > 0)
                .collect();
            let mut planes = Vec::with_capacity(plane_slots.len());
            for &j in plane_slots.iter().rev() {
                planes.push(result.remove(j));
            }
            planes.reverse();
            let moved = planes.len();
            let carrier_now = location - moved;
            result.splice(carrier_now..carrier_now, planes);

            let Some(next) = last_unfilled_carrier(&result, &filled) else {
                break;
            };
            seeked = Some(result[next].id);
            place_at = carrier_now;
            space = result[next].unit_type.carrier_capacity;
        }
    }
    result
}

fn last_unfilled_carrier(units: &[Unit], filled: &[UnitId]) -> Option<usize> {
    units
        .iter()
        .rposition(|u| u.unit_type.is_carrier() && !filled.contains(&u.id))
}
