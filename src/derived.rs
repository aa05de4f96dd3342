//! Values computed from decoded records in an explicit post-pass: localized
//! city names, the owner index map, and replay-driven tile mutation.

use crate::{
    map::TileImprovement,
    replay::{EventKind, ReplayEvent},
};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// City-state owner ids start at this offset in the raw owner id space
pub const CITY_STATE_ID_OFFSET: i32 = 32;

/// Route type assigned to the tile of a razed city
const ROUTE_ROAD: i32 = 2;

/// Sentinel owner values meaning "unowned"
pub fn is_invalid_owner(value: i32) -> bool {
    value == 0xFF || value == 0xFFFF || value == -1
}

/// Dense remapping from a raw in-file owner id to a zero-based slot in the
/// player-record list.
///
/// Major civilizations occupy `0..player_count` and map to themselves;
/// city-states occupy `32..32 + city_state_count` and are appended after the
/// players. Built once per file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OwnerIndexMap {
    map: BTreeMap<i32, usize>,
}

impl OwnerIndexMap {
    pub fn build(player_count: usize, city_state_count: usize) -> OwnerIndexMap {
        let mut map = BTreeMap::new();
        for i in 0..player_count {
            map.insert(i as i32, i);
        }
        for i in 0..city_state_count {
            map.insert(CITY_STATE_ID_OFFSET + i as i32, player_count + i);
        }
        OwnerIndexMap { map }
    }

    /// The dense player-list index for a raw owner id
    pub fn get(&self, owner: i32) -> Option<usize> {
        self.map.get(&owner).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Turns a localization key into a display name.
///
/// Everything through a `CITY_NAME_` or `CITYSTATE_` prefix is stripped,
/// underscores become spaces, and each word is title-cased, so
/// `TXT_KEY_CITY_NAME_NEW_YORK` becomes `New York`.
pub fn localize_city_name(key: &str) -> String {
    let mut name = key;
    if let Some(idx) = name.find("CITY_NAME_") {
        name = &name[idx + "CITY_NAME_".len()..];
    }
    if let Some(idx) = name.find("CITYSTATE_") {
        name = &name[idx + "CITYSTATE_".len()..];
    }
    let spaced = name.replace('_', " ");
    title_case(&spaced)
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut start_of_word = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            start_of_word = true;
            out.push(ch);
        } else if start_of_word {
            out.extend(ch.to_uppercase());
            start_of_word = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Applies replay events to a tile-improvement grid in place.
///
/// Events are applied in ascending turn order, file order within a turn.
/// Founded cities receive sequential ids starting at zero; claimed and
/// transferred tiles change owner; razed tiles lose their city and are left
/// with a generic road. Coordinates outside the grid are skipped.
pub fn apply_events(grid: &mut [Vec<TileImprovement>], events: &[ReplayEvent]) {
    let mut ordered: Vec<&ReplayEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.turn);

    let mut next_city_id = 0;
    for event in ordered {
        match event.kind() {
            EventKind::CityFounded => {
                let name = event
                    .text
                    .strip_suffix(" is founded.")
                    .unwrap_or(&event.text);
                for tile in event.tiles.iter() {
                    if let Some(t) = tile_mut(grid, tile.x, tile.y) {
                        t.city_id = next_city_id;
                        t.city_name = name.to_string();
                        next_city_id += 1;
                    }
                }
            }
            EventKind::TilesClaimed | EventKind::CityTransferred => {
                for tile in event.tiles.iter() {
                    if let Some(t) = tile_mut(grid, tile.x, tile.y) {
                        t.owner = event.civ_id as i32;
                    }
                }
            }
            EventKind::TilesRazed => {
                for tile in event.tiles.iter() {
                    if let Some(t) = tile_mut(grid, tile.x, tile.y) {
                        t.owner = -1;
                        t.city_id = -1;
                        t.city_name.clear();
                        t.route_type = ROUTE_ROAD;
                    }
                }
            }
            EventKind::Other(_) => {}
        }
    }
}

fn tile_mut(grid: &mut [Vec<TileImprovement>], x: u16, y: u16) -> Option<&mut TileImprovement> {
    grid.get_mut(usize::from(y))
        .and_then(|row| row.get_mut(usize::from(x)))
}

/// An empty tile-improvement grid for replay-only rendering
pub fn blank_grid(height: usize, width: usize) -> Vec<Vec<TileImprovement>> {
    (0..height)
        .map(|y| {
            (0..width)
                .map(|x| TileImprovement {
                    x: x as i32,
                    y: y as i32,
                    city_id: -1,
                    city_name: String::new(),
                    owner: -1,
                    improvement: -1,
                    route_type: -1,
                    route_owner: -1,
                })
                .collect()
        })
        .collect()
}
