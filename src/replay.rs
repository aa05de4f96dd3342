//! Decoder for the `.civ5replay` format.
//!
//! A strictly sequential stream: preamble, game configuration, DLC and mod
//! lists, an unidentified block whose length is gated by a leading
//! discriminator, the turn range, the civilization list, per-civilization
//! statistics, the event stream, and a trailing tile-property array. Most
//! sections are expressed as declarative schemas; only the identified fields
//! are pulled out of the resulting records.

use crate::{
    cursor::Cursor,
    errors::Error,
    schema::{self, Field},
};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const PREAMBLE: &[Field] = &[
    Field::bytes(4, "game_name"),
    Field::u32("unknown_block1"),
    Field::var_string("game_version"),
    Field::var_string("game_build"),
    Field::u32("current_turn"),
    Field::bytes(1, "unknown_block2"),
];

pub(crate) const GAME_CONFIG: &[Field] = &[
    Field::var_string("difficulty"),
    Field::var_string("era_start"),
    Field::var_string("era_end"),
    Field::var_string("game_speed"),
    Field::var_string("world_size"),
    Field::var_string("map_filename"),
];

pub(crate) const DLC_ENTRY: &[Field] = &[
    Field::bytes(16, "dlc_id"),
    Field::bytes(4, "dlc_enabled"),
    Field::var_string("dlc_name"),
];

pub(crate) const MOD_ENTRY: &[Field] = &[
    Field::var_string("mod_id"),
    Field::bytes(4, "mod_version"),
    Field::var_string("mod_name"),
];

const PLAYER_CONFIG: &[Field] = &[
    Field::var_string("civ_name"),
    Field::var_string("leader_name"),
    Field::var_string("player_color"),
    Field::bytes(8, "unknown_block5"),
    Field::var_string("map_filename2"),
];

const TURN_RANGE: &[Field] = &[
    Field::u32("start_turn"),
    // start year can be negative, e.g. 4000 BC
    Field::i32("start_year"),
    Field::u32("end_turn"),
    Field::var_string("end_year"),
    Field::u32("zero_start_year"),
    Field::u32("zero_end_year"),
];

const TILE_PROPERTY: &[Field] = &[
    Field::u32("unknown1"),
    Field::u32("unknown2"),
    Field::u8("elevation_id"),
    Field::u8("type_id"),
    Field::u8("feature_id"),
    Field::u8("unknown3"),
];

/// A civilization entry from the replay's civilization list
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplayCiv {
    pub unknown: [i32; 4],
    pub leader: String,
    pub long_name: String,
    pub name: String,
    pub demonym: String,
}

/// A map coordinate affected by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventTile {
    pub x: u16,
    pub y: u16,
}

/// The modeled event types; everything else is carried opaquely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    CityFounded,
    TilesClaimed,
    CityTransferred,
    TilesRazed,
    Other(u32),
}

/// A single replay event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplayEvent {
    pub turn: u32,
    pub type_id: u32,
    pub tiles: Vec<EventTile>,
    pub civ_id: u32,
    /// Free-text payload; for founded events this doubles as the city-name
    /// source
    pub text: String,
}

impl ReplayEvent {
    pub fn kind(&self) -> EventKind {
        match self.type_id {
            1 => EventKind::CityFounded,
            2 => EventKind::TilesClaimed,
            3 => EventKind::CityTransferred,
            4 => EventKind::TilesRazed,
            other => EventKind::Other(other),
        }
    }
}

/// A single point of a named per-civilization time series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataPoint {
    pub turn: u32,
    pub value: i32,
}

/// All time series for one civilization, keyed by dataset name
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CivDataset {
    pub civ_index: usize,
    pub values: BTreeMap<String, Vec<DataPoint>>,
}

/// A fully decoded `.civ5replay` file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplayFile {
    pub player_civ: String,
    pub game_version: String,
    pub game_build: String,
    pub current_turn: u32,
    pub civs: Vec<ReplayCiv>,
    pub dataset_names: Vec<String>,
    pub datasets: Vec<CivDataset>,
    pub events: Vec<ReplayEvent>,
    pub map_width: u32,
    pub map_height: u32,
}

impl ReplayFile {
    /// Decodes a `.civ5replay` file from an in-memory buffer
    pub fn from_slice(data: &[u8]) -> Result<ReplayFile, Error> {
        let mut cursor = Cursor::new(data);

        let preamble = schema::read_record(&mut cursor, "replay preamble", PREAMBLE)?;
        let game_version = preamble.str("game_version").unwrap_or("").to_string();
        let game_build = preamble.str("game_build").unwrap_or("").to_string();
        let current_turn = preamble.int("current_turn").unwrap_or(0) as u32;

        let player_civ = cursor
            .read_var_string()
            .map_err(|e| e.in_section("player civ"))?;

        schema::read_record(&mut cursor, "game config", GAME_CONFIG)?;
        schema::read_array(&mut cursor, "dlc list", DLC_ENTRY)?;
        schema::read_array(&mut cursor, "mod list", MOD_ENTRY)?;
        schema::read_record(&mut cursor, "player config", PLAYER_CONFIG)?;

        skip_unidentified_block(&mut cursor)?;

        schema::read_record(&mut cursor, "turn range", TURN_RANGE)?;

        let civs = read_civs(&mut cursor)?;
        let dataset_names = read_dataset_names(&mut cursor)?;
        let datasets = read_civ_datasets(&mut cursor, &dataset_names)?;

        cursor
            .read_u32()
            .map_err(|e| e.in_section("pre-event value"))?;

        let events = read_events(&mut cursor)?;

        let map_width = cursor
            .read_u32()
            .map_err(|e| e.in_section("map dimensions"))?;
        let map_height = cursor
            .read_u32()
            .map_err(|e| e.in_section("map dimensions"))?;

        // Superseded by the map decoder's own tile data; consumed to keep the
        // cursor honest about trailing bytes.
        schema::read_array(&mut cursor, "tile properties", TILE_PROPERTY)?;

        Ok(ReplayFile {
            player_civ,
            game_version,
            game_build,
            current_turn,
            civs,
            dataset_names,
            datasets,
            events,
            map_width,
            map_height,
        })
    }

    /// Groups events by turn, ascending
    pub fn events_by_turn(&self) -> BTreeMap<u32, Vec<&ReplayEvent>> {
        let mut turns: BTreeMap<u32, Vec<&ReplayEvent>> = BTreeMap::new();
        for event in &self.events {
            turns.entry(event.turn).or_default().push(event);
        }
        turns
    }
}

/// A run of 32-bit values with no discovered structure.
///
/// The count depends on a leading discriminator (seven trailing values when
/// it equals 2, nine otherwise), followed by a separately length-prefixed
/// array plus one extra value and a padding byte. These exist purely to keep
/// the cursor aligned.
fn skip_unidentified_block(cursor: &mut Cursor) -> Result<(), Error> {
    let section = "unidentified block";
    let discriminator = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let trailing = if discriminator == 2 { 7 } else { 9 };
    for _ in 0..trailing {
        cursor.read_u32().map_err(|e| e.in_section(section))?;
    }

    let count = schema::read_count(cursor, section)?;
    for _ in 0..count + 1 {
        cursor.read_u32().map_err(|e| e.in_section(section))?;
    }

    cursor.read_u8().map_err(|e| e.in_section(section))?;
    Ok(())
}

fn read_civs(cursor: &mut Cursor) -> Result<Vec<ReplayCiv>, Error> {
    let section = "civilization list";
    let count = schema::read_count(cursor, section)?;
    let mut civs = Vec::new();
    for _ in 0..count {
        let mut unknown = [0i32; 4];
        for slot in unknown.iter_mut() {
            *slot = cursor.read_i32().map_err(|e| e.in_section(section))?;
        }
        civs.push(ReplayCiv {
            unknown,
            leader: cursor
                .read_var_string()
                .map_err(|e| e.in_section(section))?,
            long_name: cursor
                .read_var_string()
                .map_err(|e| e.in_section(section))?,
            name: cursor
                .read_var_string()
                .map_err(|e| e.in_section(section))?,
            demonym: cursor
                .read_var_string()
                .map_err(|e| e.in_section(section))?,
        });
    }
    Ok(civs)
}

fn read_dataset_names(cursor: &mut Cursor) -> Result<Vec<String>, Error> {
    let section = "dataset names";
    let count = schema::read_count(cursor, section)?;
    let mut names = Vec::new();
    for _ in 0..count {
        names.push(
            cursor
                .read_var_string()
                .map_err(|e| e.in_section(section))?,
        );
    }
    Ok(names)
}

/// Reads the 3-level nested dataset array (civ, dataset index, data points)
/// and zips each civilization's rows against the shared name table
fn read_civ_datasets(
    cursor: &mut Cursor,
    dataset_names: &[String],
) -> Result<Vec<CivDataset>, Error> {
    let section = "dataset values";
    let civ_count = schema::read_count(cursor, section)?;
    let mut datasets = Vec::new();
    for civ_index in 0..civ_count as usize {
        let row_count = schema::read_count(cursor, section)?;
        let mut rows = Vec::new();
        for _ in 0..row_count {
            let point_count = schema::read_count(cursor, section)?;
            let mut points = Vec::new();
            for _ in 0..point_count {
                points.push(DataPoint {
                    turn: cursor.read_u32().map_err(|e| e.in_section(section))?,
                    value: cursor.read_i32().map_err(|e| e.in_section(section))?,
                });
            }
            rows.push(points);
        }

        let mut values = BTreeMap::new();
        for (i, name) in dataset_names.iter().enumerate() {
            values.insert(name.clone(), rows.get(i).cloned().unwrap_or_default());
        }
        datasets.push(CivDataset { civ_index, values });
    }
    Ok(datasets)
}

/// Reads the event stream shared by the replay format and the save format's
/// decompressed payload
pub(crate) fn read_events(cursor: &mut Cursor) -> Result<Vec<ReplayEvent>, Error> {
    let section = "event list";
    let count = schema::read_count(cursor, section)?;
    let mut events = Vec::new();
    for _ in 0..count {
        let turn = cursor.read_u32().map_err(|e| e.in_section(section))?;
        let type_id = cursor.read_u32().map_err(|e| e.in_section(section))?;
        let tile_count = schema::read_count(cursor, section)?;
        let mut tiles = Vec::new();
        for _ in 0..tile_count {
            tiles.push(EventTile {
                x: cursor.read_u16().map_err(|e| e.in_section(section))?,
                y: cursor.read_u16().map_err(|e| e.in_section(section))?,
            });
        }
        let civ_id = cursor.read_u32().map_err(|e| e.in_section(section))?;
        let text = cursor
            .read_var_string()
            .map_err(|e| e.in_section(section))?;
        events.push(ReplayEvent {
            turn,
            type_id,
            tiles,
            civ_id,
            text,
        });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_var_string(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    #[test]
    fn event_kinds() {
        let mut event = ReplayEvent {
            turn: 0,
            type_id: 1,
            tiles: Vec::new(),
            civ_id: 0,
            text: String::new(),
        };
        assert_eq!(event.kind(), EventKind::CityFounded);
        event.type_id = 4;
        assert_eq!(event.kind(), EventKind::TilesRazed);
        event.type_id = 17;
        assert_eq!(event.kind(), EventKind::Other(17));
    }

    #[test]
    fn reads_event_stream() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes());
        // turn 3, type 1, one tile, civ 0
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&7u16.to_le_bytes());
        buf.extend_from_slice(&8u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        push_var_string(&mut buf, "Paris is founded.");
        // turn 4, type 2, no tiles, civ 3
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&3u32.to_le_bytes());
        push_var_string(&mut buf, "");

        let mut cursor = Cursor::new(&buf);
        let events = read_events(&mut cursor).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].tiles, vec![EventTile { x: 7, y: 8 }]);
        assert_eq!(events[0].text, "Paris is founded.");
        assert_eq!(events[1].civ_id, 3);
    }

    #[test]
    fn zips_datasets_against_name_table() {
        let names = vec!["SCORE".to_string(), "GOLD".to_string()];
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes()); // one civ
        buf.extend_from_slice(&2u32.to_le_bytes()); // two rows
        buf.extend_from_slice(&1u32.to_le_bytes()); // one point
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(&55i32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes()); // empty row

        let mut cursor = Cursor::new(&buf);
        let datasets = read_civ_datasets(&mut cursor, &names).unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(
            datasets[0].values["SCORE"],
            vec![DataPoint {
                turn: 10,
                value: 55
            }]
        );
        assert!(datasets[0].values["GOLD"].is_empty());
    }

    #[test]
    fn discriminator_gates_unidentified_length() {
        // discriminator == 2: 7 values + count array (0 -> one extra) + pad
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 7 * 4]);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.push(0);
        let mut cursor = Cursor::new(&buf);
        skip_unidentified_block(&mut cursor).unwrap();
        assert!(cursor.is_empty());

        // any other discriminator: 9 values
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 9 * 4]);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.push(0);
        let mut cursor = Cursor::new(&buf);
        skip_unidentified_block(&mut cursor).unwrap();
        assert!(cursor.is_empty());
    }
}
