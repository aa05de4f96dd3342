//! Decoder for the `.civ5save` format.
//!
//! Structurally the most irregular of the three formats: a long, strictly
//! ordered run of named sections, most of them unidentified, terminated by a
//! fixed 8-byte marker directly in front of a zlib-compressed payload. The
//! offset of that payload is wherever the cursor lands after the marker; it
//! is not stored anywhere in the file. The decompressed payload carries its
//! own sequential sections and ends in a replay-style event stream.

use crate::{
    cursor::Cursor,
    errors::{Error, ErrorKind},
    replay::{self, read_events, ReplayCiv, ReplayEvent},
    schema::{self, Field},
};
use std::io::Read;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The decompressed save layout that stores named unit/building class tables
/// instead of the numeric record arrays
const CLASS_TABLE_SAVE_VERSION: u32 = 0x0B;

const PREAMBLE: &[Field] = &[
    Field::bytes(4, "game_name"),
    Field::bytes(4, "unknown_block1"),
    Field::var_string("game_version"),
    Field::var_string("game_build"),
    Field::u32("current_turn"),
    Field::bytes(1, "unknown_block2"),
];

const PLAYER_CONFIG: &[Field] = &[
    Field::var_string("player_civ_name"),
    Field::var_string("player_leader_name"),
    Field::var_string("player_color"),
    Field::bytes(16, "unknown_id1"),
    Field::var_string("version"),
    Field::bytes(16, "unknown_id2"),
    Field::u32("unknown_id3_1"),
    Field::u32("unknown_id3_2"),
    Field::u32("unknown_id3_3"),
    Field::u32("unknown_id3_4"),
    Field::var_string("map_filename2"),
];

const CLIMATE_PARAMS: &[Field] = &[
    Field::i32("desert_percent_change"),
    Field::u32("jungle_latitude"),
    Field::u32("hill_range"),
    Field::u32("mountain_percent"),
    Field::f32("snow_latitude_change"),
    Field::f32("tundra_latitude_change"),
    Field::f32("grass_latitude_change"),
    Field::f32("desert_bottom_latitude_change"),
    Field::f32("desert_top_latitude_change"),
    Field::f32("ice_latitude"),
    Field::f32("rand_ice_latitude"),
];

const TURN_TIMER: &[Field] = &[
    Field::u32("turn_timer_id1"),
    Field::u32("turn_timer_unknown1"),
    Field::var_string("turn_time_name1"),
    Field::bytes(12, "padding_after_turn_time1"),
    Field::var_string("turn_time_name_type"),
    Field::var_string("turn_time_name_description"),
    Field::var_string("turn_time_name2"),
    Field::u32("turn_timer_base"),
    Field::u32("turn_timer_city"),
    Field::u32("turn_timer_unit"),
    Field::u32("turn_timer_first_turn_multiplayer"),
    Field::u32("turn_timer_id2"),
    Field::u8("turn_timer_unknown2"),
];

const GAME_OPTION: &[Field] = &[
    Field::var_string("game_option"),
    Field::u32("game_option_enabled"),
];

/// Outcome of inflating the compressed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Decompression {
    /// The zlib stream ended cleanly
    Complete,
    /// The stream ended prematurely; decoding continued on the partial output
    Truncated {
        /// Number of bytes recovered before the stream gave out
        produced: usize,
    },
}

impl Decompression {
    pub fn is_truncated(&self) -> bool {
        matches!(self, Decompression::Truncated { .. })
    }
}

/// A fully decoded `.civ5save` file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaveFile {
    pub player_civ: String,
    pub game_version: String,
    pub game_build: String,
    pub current_turn: u32,
    /// Civilizations assembled from the name, minor-civ, and color arrays
    pub civs: Vec<ReplayCiv>,
    /// The replay-style event stream embedded in the compressed payload
    pub events: Vec<ReplayEvent>,
    /// Version discriminator at the head of the decompressed payload
    pub save_version: u32,
    /// Absolute offset of the zlib payload within the file
    pub compressed_offset: usize,
    /// Warning-level signal: whether the payload inflated cleanly
    pub decompression: Decompression,
}

impl SaveFile {
    /// Decodes a `.civ5save` file from an in-memory buffer.
    ///
    /// A truncated zlib payload that still yields bytes is decoded as far as
    /// it goes and reported through [`SaveFile::decompression`] rather than
    /// as an error.
    pub fn from_slice(data: &[u8]) -> Result<SaveFile, Error> {
        let mut cursor = Cursor::new(data);

        let preamble = schema::read_record(&mut cursor, "save preamble", PREAMBLE)?;
        let game_version = preamble.str("game_version").unwrap_or("").to_string();
        let game_build = preamble.str("game_build").unwrap_or("").to_string();
        let current_turn = preamble.int("current_turn").unwrap_or(0) as u32;

        let player_civ = cursor
            .read_var_string()
            .map_err(|e| e.in_section("player civ"))?;

        schema::read_record(&mut cursor, "game config", replay::GAME_CONFIG)?;
        schema::read_array(&mut cursor, "dlc list", replay::DLC_ENTRY)?;
        schema::read_array(&mut cursor, "mod list", replay::MOD_ENTRY)?;
        schema::read_record(&mut cursor, "player config", PLAYER_CONFIG)?;

        let civs = read_header_sections(&mut cursor)?;

        // Everything after the 8-byte marker is the zlib payload; its offset
        // is wherever the forward pass stopped.
        let compressed_offset = cursor.position();
        let (inner, decompression) = inflate(&data[compressed_offset..], compressed_offset)?;

        let mut inner_cursor = Cursor::new(&inner);
        let (save_version, events) = read_decompressed(&mut inner_cursor)?;

        Ok(SaveFile {
            player_civ,
            game_version,
            game_build,
            current_turn,
            civs,
            events,
            save_version,
            compressed_offset,
            decompression,
        })
    }
}

/// Reads the long ordered run of header sections between the shared config
/// blocks and the compressed payload, returning the civilization list
/// assembled along the way.
///
/// Unlike the replay format, the save stores civilization names, minor-civ
/// overrides, and player colors in three separate arrays; they are merged
/// here into [`ReplayCiv`] values with the color carried in `long_name`.
fn read_header_sections(cursor: &mut Cursor) -> Result<Vec<ReplayCiv>, Error> {
    schema::read_array(cursor, "unknown block 3", &[Field::i32("value")])?;
    schema::read_array(cursor, "player names", &[Field::var_string("player_name")])?;

    for _ in 0..4 {
        schema::read_array(cursor, "unknown array block 1", &[Field::u32("value")])?;
    }

    let civ_names = read_var_string_array(cursor, "civilization names")?;
    let mut civs: Vec<ReplayCiv> = civ_names
        .into_iter()
        .map(|name| ReplayCiv {
            unknown: [0; 4],
            leader: String::new(),
            long_name: String::new(),
            name,
            demonym: String::new(),
        })
        .collect();

    schema::read_array(cursor, "leader array 1", &[Field::var_string("leader_name")])?;

    let gated = cursor
        .read_u32()
        .map_err(|e| e.in_section("unknown block 5"))?;
    if gated != 0 {
        cursor
            .read_bytes(12)
            .map_err(|e| e.in_section("unknown block 5"))?;
    }

    cursor
        .read_var_string()
        .map_err(|e| e.in_section("computer username"))?;

    schema::read_array(cursor, "unknown block 6", &[Field::i32("value")])?;
    cursor
        .read_bytes(53)
        .map_err(|e| e.in_section("unknown block 6"))?;

    schema::read_array(cursor, "unknown array 1", &[Field::u32("value")])?;
    schema::read_array(cursor, "civ array 1", &[Field::var_string("civ_name")])?;
    schema::read_array(cursor, "unknown array 2", &[Field::u32("value")])?;
    schema::read_array(cursor, "civ array 2", &[Field::var_string("value")])?;

    read_self_sized_block(cursor, "unknown block 7")?;
    cursor
        .read_bytes(8)
        .map_err(|e| e.in_section("unknown block 7"))?;

    read_climate(cursor)?;

    cursor
        .read_u32()
        .map_err(|e| e.in_section("unknown block 8"))?;
    schema::read_array(cursor, "unknown block 8", &[Field::u32("value")])?;
    cursor
        .read_u32()
        .map_err(|e| e.in_section("unknown block 8"))?;
    schema::read_array(cursor, "unknown block 8", &[Field::u32("value")])?;
    cursor
        .read_bytes(15)
        .map_err(|e| e.in_section("unknown block 8"))?;

    cursor
        .read_var_string()
        .map_err(|e| e.in_section("game name"))?;

    schema::read_record(
        cursor,
        "current turn block",
        &[
            Field::u32("unknown"),
            Field::u8("unknown"),
            Field::u32("current_turn"),
            Field::bytes(5, "unknown_block9"),
            Field::u32("unknown"),
        ],
    )?;

    schema::read_array(cursor, "unknown array 3", &[Field::u32("value")])?;

    // Some save files omit this array entirely; a zero u16 where its length
    // would start means it is absent.
    let probe = cursor
        .read_u16()
        .map_err(|e| e.in_section("unknown array 4"))?;
    if probe != 0 {
        cursor
            .seek_relative(-2)
            .map_err(|e| e.in_section("unknown array 4"))?;
        schema::read_array(cursor, "unknown array 4", &[Field::i32("value")])?;
        cursor
            .read_bytes(2)
            .map_err(|e| e.in_section("unknown array 4"))?;
    }

    schema::read_array(cursor, "leader array 2", &[Field::var_string("leader_name")])?;

    read_self_sized_block(cursor, "unknown block 11")?;

    schema::read_record(
        cursor,
        "map filename block",
        &[
            Field::var_string("computer_username2"),
            Field::bytes(7, "unknown_id4"),
            Field::var_string("map_filename3"),
            Field::u32("unknown"),
            Field::u32("max_turns"),
            Field::u32("unknown"),
        ],
    )?;

    let minor_civ_names = read_var_string_array(cursor, "minor civilization names")?;
    for (i, minor) in minor_civ_names.into_iter().enumerate() {
        if minor.contains("MINOR_CIV") {
            if let Some(civ) = civs.get_mut(i) {
                civ.name = minor;
            }
        }
    }

    cursor
        .read_bytes(77)
        .map_err(|e| e.in_section("unknown block 13"))?;

    schema::read_array(cursor, "unknown array 5", &[Field::i32("value")])?;
    schema::read_array(cursor, "player array", &[Field::var_string("player_name")])?;

    cursor
        .read_bytes(8)
        .map_err(|e| e.in_section("unknown block 14"))?;
    schema::read_array(cursor, "unknown array 6", &[Field::u8("value")])?;

    let player_colors = read_var_string_array(cursor, "player colors")?;
    for (i, color) in player_colors.into_iter().enumerate() {
        if let Some(civ) = civs.get_mut(i) {
            civ.long_name = color;
        }
    }

    cursor
        .read_bytes(10)
        .map_err(|e| e.in_section("unknown block 15"))?;
    schema::read_array(cursor, "unknown array 7", &[Field::u8("value")])?;
    cursor
        .read_bytes(12)
        .map_err(|e| e.in_section("unknown block 16"))?;

    read_sea_level(cursor)?;

    schema::read_array(cursor, "unknown array 8", &[Field::u32("value")])?;
    schema::read_array(cursor, "unknown array 9", &[Field::u32("value")])?;
    cursor
        .read_bytes(12)
        .map_err(|e| e.in_section("unknown block 17"))?;
    schema::read_array(cursor, "unknown array 10", &[Field::u32("value")])?;
    cursor
        .read_bytes(1)
        .map_err(|e| e.in_section("unknown block 18"))?;

    read_turn_timer(cursor)?;
    schema::read_array(cursor, "post turn timer array", &[Field::u8("value")])?;

    read_world_size(cursor)?;
    schema::read_array(cursor, "game options", GAME_OPTION)?;

    schema::read_array(
        cursor,
        "post game options array",
        &[Field::bytes(9, "value")],
    )?;
    cursor
        .read_var_string()
        .map_err(|e| e.in_section("game version 2"))?;

    schema::read_array(cursor, "unknown array 12", &[Field::u8("value")])?;
    schema::read_array(cursor, "unknown array 13", &[Field::u8("value")])?;
    schema::read_array(cursor, "unknown array 14", &[Field::u32("value")])?;

    // Fixed marker, observed as [2 0 0 0 0 0 1 0] in every known file
    cursor
        .read_bytes(8)
        .map_err(|e| e.in_section("compressed payload marker"))?;

    Ok(civs)
}

/// `count` u32 followed by that many var strings
fn read_var_string_array(cursor: &mut Cursor, section: &'static str) -> Result<Vec<String>, Error> {
    let count = schema::read_count(cursor, section)?;
    let mut values = Vec::new();
    for _ in 0..count {
        values.push(
            cursor
                .read_var_string()
                .map_err(|e| e.in_section(section))?,
        );
    }
    Ok(values)
}

/// A leading u32 that, when non-zero, sizes its own `(n + 1) * 4` byte block
fn read_self_sized_block(cursor: &mut Cursor, section: &'static str) -> Result<(), Error> {
    let n = cursor.read_u32().map_err(|e| e.in_section(section))?;
    if n != 0 {
        let len = (n as usize + 1) * 4;
        cursor.read_bytes(len).map_err(|e| e.in_section(section))?;
    }
    Ok(())
}

/// Climate "named setting" block: display name, fixed padding, three
/// descriptive strings, then typed numeric parameters
fn read_climate(cursor: &mut Cursor) -> Result<(), Error> {
    let section = "climate block";
    cursor
        .read_var_string()
        .map_err(|e| e.in_section(section))?;
    cursor.read_bytes(12).map_err(|e| e.in_section(section))?;
    schema::read_record(
        cursor,
        section,
        &[
            Field::var_string("climate_name_type"),
            Field::var_string("climate_name_description"),
            Field::var_string("climate_name2"),
        ],
    )?;
    schema::read_record(cursor, section, CLIMATE_PARAMS)?;
    Ok(())
}

/// Sea-level "named setting" block; same shape as climate but with trailing
/// padding instead of numeric parameters
fn read_sea_level(cursor: &mut Cursor) -> Result<(), Error> {
    let section = "sea level block";
    cursor
        .read_var_string()
        .map_err(|e| e.in_section(section))?;
    cursor.read_bytes(12).map_err(|e| e.in_section(section))?;
    schema::read_record(
        cursor,
        section,
        &[
            Field::var_string("sea_level_name_type"),
            Field::var_string("sea_level_name_description"),
            Field::var_string("sea_level_name2"),
        ],
    )?;
    cursor.read_bytes(5).map_err(|e| e.in_section(section))?;
    Ok(())
}

fn read_turn_timer(cursor: &mut Cursor) -> Result<(), Error> {
    schema::read_record(cursor, "turn timer block", TURN_TIMER)?;
    // length is usually 5
    schema::read_array(
        cursor,
        "turn timer victory flags",
        &[Field::u8("victory_flag")],
    )?;
    Ok(())
}

/// World-size setting block.
///
/// A leading discriminator (not a declared version field) gates three extra
/// fields; the flag is derived once here and threaded through the rest of
/// the block.
fn read_world_size(cursor: &mut Cursor) -> Result<(), Error> {
    let section = "world size block";
    let discriminator = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let extended = discriminator == 2;

    cursor.read_u32().map_err(|e| e.in_section(section))?; // portrait index
    if extended {
        cursor.read_u32().map_err(|e| e.in_section(section))?;
    }

    schema::read_record(
        cursor,
        section,
        &[
            Field::var_string("world_size1"),
            Field::var_string("world_size_help"),
            Field::bytes(8, "padding_after_world_size1"),
            Field::var_string("world_size_type"),
            Field::var_string("world_size_description"),
            Field::var_string("world_size2"),
        ],
    )?;

    schema::read_record(
        cursor,
        section,
        &[
            Field::u32("default_players"),
            Field::u32("default_minor_civs"),
            Field::u32("fog_tiles_per_barbarian_camp"),
            Field::u32("num_natural_wonders"),
            Field::u32("unit_name_modifier"),
            Field::u32("target_num_cities"),
            Field::u32("num_free_building_resources"),
            Field::u32("building_class_prereq_modifier"),
            Field::i32("max_conscript_modifier"),
            Field::u32("grid_width"),
            Field::u32("grid_height"),
        ],
    )?;

    if extended {
        cursor.read_u32().map_err(|e| e.in_section(section))?; // max active religions
    }

    schema::read_record(
        cursor,
        section,
        &[
            Field::i32("terrain_grain_change"),
            Field::i32("feature_grain_change"),
            Field::u32("research_percent"),
            Field::u32("advanced_start_points_mod"),
            Field::u32("num_cities_unhappiness_percent"),
            Field::u32("num_cities_policy_cost_mod"),
            Field::u32("num_cities_tech_cost_mod"),
        ],
    )?;

    if extended {
        cursor.read_u32().map_err(|e| e.in_section(section))?; // second portrait index
    }

    Ok(())
}

/// Inflates the zlib payload starting at `offset`.
///
/// A premature end of stream is recoverable as long as some bytes were
/// produced; only a stream that yields nothing at all is fatal.
fn inflate(compressed: &[u8], offset: usize) -> Result<(Vec<u8>, Decompression), Error> {
    let mut decoder = flate2::read::ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    let mut chunk = [0u8; 16 * 1024];
    loop {
        match decoder.read(&mut chunk) {
            Ok(0) => return Ok((out, Decompression::Complete)),
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(source) => {
                if out.is_empty() {
                    return Err(Error::new(ErrorKind::Decompression { offset, source }));
                }
                let produced = out.len();
                return Ok((out, Decompression::Truncated { produced }));
            }
        }
    }
}

/// Parses the decompressed payload down to the embedded event stream
fn read_decompressed(cursor: &mut Cursor) -> Result<(u32, Vec<ReplayEvent>), Error> {
    let section = "decompressed header";
    let save_version = cursor.read_u32().map_err(|e| e.in_section(section))?;

    schema::read_record(
        cursor,
        section,
        &[
            Field::u32("unknown2"),
            Field::u32("turn_number"),
            Field::u32("unknown3"),
            Field::u32("unknown4"),
            Field::i32("start_year"),
        ],
    )?;

    for _ in 0..24 {
        cursor.read_i32().map_err(|e| e.in_section(section))?;
    }

    // flag bytes
    cursor.read_bytes(10).map_err(|e| e.in_section(section))?;

    schema::read_array(cursor, "options list", &[Field::var_string("option_name")])?;

    cursor
        .read_bytes(1844)
        .map_err(|e| e.in_section(section))?;

    if save_version == CLASS_TABLE_SAVE_VERSION {
        read_class_tables(cursor)?;
    } else {
        read_numeric_tables(cursor)?;
    }

    schema::read_array(
        cursor,
        "great person names",
        &[Field::var_string("great_person_name")],
    )?;

    for _ in 0..2 {
        cursor
            .read_bytes(56)
            .map_err(|e| e.in_section("constant blocks"))?;
    }
    cursor
        .read_bytes(38)
        .map_err(|e| e.in_section("post great person block"))?;

    let events = read_events(cursor)?;
    Ok((save_version, events))
}

/// Historical layout: three named class tables plus a fixed opaque block
fn read_class_tables(cursor: &mut Cursor) -> Result<(), Error> {
    let entry = &[
        Field::var_string("name"),
        Field::u32("unknown_value"),
    ];
    schema::read_array(cursor, "unit names", entry)?;
    schema::read_array(cursor, "unit classes", entry)?;
    schema::read_array(cursor, "building classes", entry)?;

    // Block size matches the known fixtures; other mods may differ.
    cursor
        .read_bytes(2366)
        .map_err(|e| e.in_section("class table padding"))?;
    Ok(())
}

/// General layout: three numeric record arrays with interrelated lengths,
/// then three fixed opaque blocks.
///
/// The first and third arrays normally have the same length unless the first
/// exceeds 150, in which case the first declared length is one more than the
/// element count of both. Matches observed fixtures; no derivation known.
fn read_numeric_tables(cursor: &mut Cursor) -> Result<(), Error> {
    let section = "numeric tables";

    let mut first_len = schema::read_count(cursor, section)?;
    if first_len >= 150 {
        first_len -= 1;
    }
    for _ in 0..first_len {
        cursor.read_bytes(8).map_err(|e| e.in_section(section))?;
    }

    schema::read_array(cursor, section, &[Field::bytes(8, "value")])?;

    let third_len = schema::read_count(cursor, section)?;
    for _ in 0..third_len.saturating_sub(1) {
        cursor.read_bytes(8).map_err(|e| e.in_section(section))?;
    }

    cursor.read_bytes(128).map_err(|e| e.in_section(section))?;
    cursor.read_bytes(756).map_err(|e| e.in_section(section))?;
    cursor.read_bytes(128).map_err(|e| e.in_section(section))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn inflate_complete_stream() {
        let payload = vec![42u8; 4000];
        let compressed = zlib(&payload);
        let (out, status) = inflate(&compressed, 0).unwrap();
        assert_eq!(out, payload);
        assert_eq!(status, Decompression::Complete);
    }

    #[test]
    fn inflate_truncated_stream_keeps_partial_output() {
        let payload: Vec<u8> = (0..20000u32).map(|i| (i % 251) as u8).collect();
        let mut compressed = zlib(&payload);
        compressed.truncate(compressed.len() / 2);
        let (out, status) = inflate(&compressed, 100).unwrap();
        assert!(!out.is_empty());
        assert!(out.len() < payload.len());
        assert_eq!(
            status,
            Decompression::Truncated {
                produced: out.len()
            }
        );
        assert_eq!(&out[..], &payload[..out.len()]);
    }

    #[test]
    fn inflate_garbage_is_fatal() {
        let err = inflate(&[0xde, 0xad, 0xbe, 0xef], 7).unwrap_err();
        match err.kind() {
            ErrorKind::Decompression { offset, .. } => assert_eq!(*offset, 7),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn numeric_tables_large_first_length_shortened() {
        // declared 150, actual element count 149
        let mut buf = 150u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&vec![0u8; 149 * 8]);
        // second array: empty
        buf.extend_from_slice(&0u32.to_le_bytes());
        // third array: declared 150, 149 records
        buf.extend_from_slice(&150u32.to_le_bytes());
        buf.extend_from_slice(&vec![0u8; 149 * 8]);
        buf.extend_from_slice(&vec![0u8; 128 + 756 + 128]);

        let mut cursor = Cursor::new(&buf);
        read_numeric_tables(&mut cursor).unwrap();
        assert!(cursor.is_empty());
    }

    #[test]
    fn numeric_tables_small_first_length_unchanged() {
        let mut buf = 2u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&vec![0u8; 2 * 8]);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&vec![0u8; 128 + 756 + 128]);

        let mut cursor = Cursor::new(&buf);
        read_numeric_tables(&mut cursor).unwrap();
        assert!(cursor.is_empty());
    }

    #[test]
    fn self_sized_block_gated_on_leading_value() {
        // zero: nothing follows
        let buf = 0u32.to_le_bytes();
        let mut cursor = Cursor::new(&buf);
        read_self_sized_block(&mut cursor, "test").unwrap();
        assert!(cursor.is_empty());

        // n = 2: (2 + 1) * 4 bytes follow
        let mut buf = 2u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0u8; 12]);
        let mut cursor = Cursor::new(&buf);
        read_self_sized_block(&mut cursor, "test").unwrap();
        assert!(cursor.is_empty());
    }
}
