//! Decoder for the `.civ5map` world-builder format.
//!
//! The format is a forward sequence of header, string tables, and the
//! physical tile grid, optionally followed by scenario data. Two trailer
//! sections (the tile-improvement grid and the player block) are not adjacent
//! to the forward stream: they sit at the end of the file and are located by
//! subtracting their sizes from the total file length. This two-pass layout
//! is deliberate, not a quirk to normalize away.

use crate::{
    cursor::Cursor,
    derived::{localize_city_name, OwnerIndexMap},
    errors::Error,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-record size of the trailing tile-improvement grid
const TILE_IMPROVEMENT_SIZE: usize = 8;

/// Per-record size of the trailing player/civilization block
const PLAYER_RECORD_SIZE: usize = 436;

/// Fixed `.civ5map` header
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapHeader {
    pub scenario_version: u8,
    pub width: u32,
    pub height: u32,
    pub players: u8,
    pub settings: [u8; 4],
    pub terrain_data_size: u32,
    pub feature_terrain_data_size: u32,
    pub feature_wonder_data_size: u32,
    pub resource_data_size: u32,
    pub mod_data_size: u32,
    pub map_name_length: u32,
    pub map_description_length: u32,
}

impl MapHeader {
    /// Format version, stored in the low nibble of the scenario/version byte
    pub fn version(&self) -> u8 {
        self.scenario_version & 0xF
    }

    /// Scenario id, stored in the high nibble
    pub fn scenario(&self) -> u8 {
        self.scenario_version >> 4
    }

    pub fn has_world_wrap(&self) -> bool {
        self.settings[0] & 1 != 0
    }

    pub fn has_random_resources(&self) -> bool {
        (self.settings[0] >> 1) & 1 != 0
    }

    pub fn has_random_goodies(&self) -> bool {
        (self.settings[0] >> 2) & 1 != 0
    }
}

/// A physical tile of the map grid.
///
/// The type fields are indices into the corresponding string tables and must
/// be validated against the table length before lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tile {
    pub terrain: u8,
    pub resource: u8,
    pub feature_terrain: u8,
    /// Bitmask of river edges: bit 0 southwest, bit 1 southeast, bit 2 east
    pub river: u8,
    pub elevation: u8,
    pub continent: u8,
    pub feature_wonder: u8,
    pub resource_amount: u8,
}

impl Tile {
    pub fn river_southwest(&self) -> bool {
        self.river & 1 != 0
    }

    pub fn river_southeast(&self) -> bool {
        (self.river >> 1) & 1 != 0
    }

    pub fn river_east(&self) -> bool {
        (self.river >> 2) & 1 != 0
    }
}

/// Political state of a tile, decoded from the backward trailer section.
///
/// Grid identity is positional: the file stores bare records in row-major
/// order and `x`/`y` are filled in from the record's position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileImprovement {
    pub x: i32,
    pub y: i32,
    /// City occupying this tile, or `-1` when none
    pub city_id: i32,
    /// Resolved in the post-decode pass, empty until then
    pub city_name: String,
    pub owner: i32,
    pub improvement: i32,
    pub route_type: i32,
    pub route_owner: i32,
}

/// A player or city-state slot from the trailing civilization block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlayerRecord {
    pub index: usize,
    pub civ_type: String,
    pub team_color: String,
    pub leader: String,
    pub team: u8,
    pub playable: u8,
}

/// A city parsed from the scenario city-data block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CityRecord {
    pub name: String,
    pub owner: u8,
    /// City-state owners are stored offset by 32; this is the normalized
    /// zero-based id
    pub owner_adjusted: u8,
    pub name_localized: bool,
    pub puppet: bool,
    pub occupied: bool,
    pub population: u16,
    pub health: u32,
    pub building_info: Vec<u8>,
}

impl CityRecord {
    pub fn is_city_state(&self) -> bool {
        self.owner >= 32
    }
}

/// A unit parsed from the scenario unit-data block
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitRecord {
    pub name_index: u16,
    pub experience: u32,
    pub health: u32,
    pub unit_type: u32,
    pub owner: u8,
    pub facing: u8,
    pub status: u8,
    pub promotions: Vec<u8>,
}

/// Scenario data present in maps that carry more than physical terrain
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameInfo {
    pub max_turns: u32,
    pub start_year: i32,
    pub player_count: u8,
    pub city_state_count: u8,
    pub team_count: u8,
    pub improvements: Vec<String>,
    pub tile_improvements: Vec<Vec<TileImprovement>>,
    pub players: Vec<PlayerRecord>,
    pub cities: Vec<CityRecord>,
    pub units: Vec<UnitRecord>,
    pub owner_index: OwnerIndexMap,
}

/// A fully decoded `.civ5map` file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapFile {
    pub header: MapHeader,
    pub terrain: Vec<String>,
    pub feature_terrain: Vec<String>,
    pub feature_wonder: Vec<String>,
    pub resources: Vec<String>,
    pub mod_data: String,
    pub name: String,
    pub description: String,
    /// Present for format version 11 and later
    pub world_size: Option<String>,
    /// Row-major physical tiles, `tiles[row][col]`
    pub tiles: Vec<Vec<Tile>>,
    /// `None` for physical-terrain-only maps that end after the tile grid
    pub game: Option<GameInfo>,
}

impl MapFile {
    /// Decodes a `.civ5map` file from an in-memory buffer.
    ///
    /// A buffer that ends directly after the physical tile grid is a
    /// legitimate terminal state and produces a model with `game` unset.
    pub fn from_slice(data: &[u8]) -> Result<MapFile, Error> {
        let mut cursor = Cursor::new(data);
        let header = read_header(&mut cursor)?;

        let terrain = read_string_table(&mut cursor, "terrain table", header.terrain_data_size)?;
        let feature_terrain = read_string_table(
            &mut cursor,
            "feature terrain table",
            header.feature_terrain_data_size,
        )?;
        let feature_wonder = read_string_table(
            &mut cursor,
            "feature wonder table",
            header.feature_wonder_data_size,
        )?;
        let resources = read_string_table(&mut cursor, "resource table", header.resource_data_size)?;

        let mod_data = read_text_block(&mut cursor, "mod data", header.mod_data_size)?;
        let name = read_text_block(&mut cursor, "map name", header.map_name_length)?;
        let description =
            read_text_block(&mut cursor, "map description", header.map_description_length)?;

        let world_size = if header.version() >= 11 {
            Some(
                cursor
                    .read_var_string()
                    .map_err(|e| e.in_section("world size"))?,
            )
        } else {
            None
        };

        let tiles = read_tiles(&mut cursor, header.height, header.width)?;

        // Some map files carry only physical terrain and end here.
        if cursor.is_empty() {
            return Ok(MapFile {
                header,
                terrain,
                feature_terrain,
                feature_wonder,
                resources,
                mod_data,
                name,
                description,
                world_size,
                tiles,
                game: None,
            });
        }

        let game = read_game_info(&mut cursor, &header)?;

        Ok(MapFile {
            header,
            terrain,
            feature_terrain,
            feature_wonder,
            resources,
            mod_data,
            name,
            description,
            world_size,
            tiles,
            game: Some(game),
        })
    }

    /// Validated terrain lookup; an out-of-range index yields `""`
    pub fn terrain_str(&self, row: usize, col: usize) -> &str {
        self.tiles
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|t| self.terrain.get(usize::from(t.terrain)))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_water_tile(&self, row: usize, col: usize) -> bool {
        let terrain = self.terrain_str(row, col);
        terrain == "TERRAIN_COAST" || terrain == "TERRAIN_OCEAN"
    }
}

/// Splits a fixed-size byte region into NUL-terminated strings.
///
/// Exactly `region.len()` bytes are interpreted; the entry count is implicit.
/// Bytes after the final NUL do not form an entry, matching the in-game
/// writer which always NUL-terminates.
pub(crate) fn split_nul_strings(region: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for &byte in region {
        if byte == 0 {
            out.push(String::from_utf8_lossy(&current).into_owned());
            current.clear();
        } else {
            current.push(byte);
        }
    }
    out
}

fn read_header(cursor: &mut Cursor) -> Result<MapHeader, Error> {
    let section = "map header";
    Ok(MapHeader {
        scenario_version: cursor.read_u8().map_err(|e| e.in_section(section))?,
        width: cursor.read_u32().map_err(|e| e.in_section(section))?,
        height: cursor.read_u32().map_err(|e| e.in_section(section))?,
        players: cursor.read_u8().map_err(|e| e.in_section(section))?,
        settings: {
            let raw = cursor.read_bytes(4).map_err(|e| e.in_section(section))?;
            [raw[0], raw[1], raw[2], raw[3]]
        },
        terrain_data_size: cursor.read_u32().map_err(|e| e.in_section(section))?,
        feature_terrain_data_size: cursor.read_u32().map_err(|e| e.in_section(section))?,
        feature_wonder_data_size: cursor.read_u32().map_err(|e| e.in_section(section))?,
        resource_data_size: cursor.read_u32().map_err(|e| e.in_section(section))?,
        mod_data_size: cursor.read_u32().map_err(|e| e.in_section(section))?,
        map_name_length: cursor.read_u32().map_err(|e| e.in_section(section))?,
        map_description_length: cursor.read_u32().map_err(|e| e.in_section(section))?,
    })
}

fn read_string_table(
    cursor: &mut Cursor,
    section: &'static str,
    size: u32,
) -> Result<Vec<String>, Error> {
    let region = cursor
        .read_bytes(size as usize)
        .map_err(|e| e.in_section(section))?;
    Ok(split_nul_strings(region))
}

fn read_text_block(cursor: &mut Cursor, section: &'static str, size: u32) -> Result<String, Error> {
    let raw = cursor
        .read_bytes(size as usize)
        .map_err(|e| e.in_section(section))?;
    Ok(String::from_utf8_lossy(raw).into_owned())
}

fn read_tiles(cursor: &mut Cursor, height: u32, width: u32) -> Result<Vec<Vec<Tile>>, Error> {
    let section = "tile grid";
    let mut rows = Vec::new();
    for _ in 0..height {
        let mut row = Vec::new();
        for _ in 0..width {
            let raw = cursor.read_bytes(8).map_err(|e| e.in_section(section))?;
            row.push(Tile {
                terrain: raw[0],
                resource: raw[1],
                feature_terrain: raw[2],
                river: raw[3],
                elevation: raw[4],
                continent: raw[5],
                feature_wonder: raw[6],
                resource_amount: raw[7],
            });
        }
        rows.push(row);
    }
    Ok(rows)
}

fn read_game_info(cursor: &mut Cursor, header: &MapHeader) -> Result<GameInfo, Error> {
    let section = "game description";
    let version = header.version();

    cursor.read_bytes(68).map_err(|e| e.in_section(section))?;
    let max_turns = cursor.read_u32().map_err(|e| e.in_section(section))?;
    cursor.read_bytes(4).map_err(|e| e.in_section(section))?;
    let start_year = cursor.read_i32().map_err(|e| e.in_section(section))?;
    let player_count = cursor.read_u8().map_err(|e| e.in_section(section))?;
    let city_state_count = cursor.read_u8().map_err(|e| e.in_section(section))?;
    let team_count = cursor.read_u8().map_err(|e| e.in_section(section))?;
    cursor.read_u8().map_err(|e| e.in_section(section))?;

    let improvement_size = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let unit_type_size = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let tech_size = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let policy_size = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let building_size = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let promotion_size = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let unit_data_size = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let unit_name_size = cursor.read_u32().map_err(|e| e.in_section(section))?;
    let city_data_size = cursor.read_u32().map_err(|e| e.in_section(section))?;

    let (victory_size, game_option_size) = if version >= 11 {
        (
            cursor.read_u32().map_err(|e| e.in_section(section))?,
            cursor.read_u32().map_err(|e| e.in_section(section))?,
        )
    } else {
        (0, 0)
    };

    let improvements = read_string_table(cursor, "improvement table", improvement_size)?;
    read_string_table(cursor, "unit type table", unit_type_size)?;
    read_string_table(cursor, "tech table", tech_size)?;
    read_string_table(cursor, "policy table", policy_size)?;
    read_string_table(cursor, "building table", building_size)?;
    read_string_table(cursor, "promotion table", promotion_size)?;

    let unit_data = cursor
        .read_bytes(unit_data_size as usize)
        .map_err(|e| e.in_section("unit data"))?;
    cursor
        .read_bytes(unit_name_size as usize)
        .map_err(|e| e.in_section("unit name data"))?;
    let city_data = cursor
        .read_bytes(city_data_size as usize)
        .map_err(|e| e.in_section("city data"))?;

    if version >= 11 {
        read_string_table(cursor, "victory table", victory_size)?;
        read_string_table(cursor, "game option table", game_option_size)?;
    }

    // The remaining two sections live at the end of the file and are read
    // backward from the total length, independent of the forward cursor.
    let data = cursor.data();
    let grid_len = header.height as usize * header.width as usize * TILE_IMPROVEMENT_SIZE;
    let grid_offset = data
        .len()
        .checked_sub(grid_len)
        .ok_or_else(|| Error::eof("tile improvement grid", data.len()))?;
    let tile_improvements =
        read_tile_improvements(data, grid_offset, header.height, header.width)?;

    let slots = usize::from(player_count) + usize::from(city_state_count);
    let player_block_len = PLAYER_RECORD_SIZE * slots;
    let player_offset = grid_offset
        .checked_sub(player_block_len)
        .ok_or_else(|| Error::eof("player block", grid_offset))?;
    let players = read_players(data, player_offset, slots)?;

    let max_city_id = tile_improvements
        .iter()
        .flatten()
        .map(|t| t.city_id)
        .max()
        .unwrap_or(-1);

    let cities = read_cities(city_data, version, max_city_id)?;
    let units = read_units(unit_data, version)?;

    let owner_index = OwnerIndexMap::build(usize::from(player_count), usize::from(city_state_count));

    let mut game = GameInfo {
        max_turns,
        start_year,
        player_count,
        city_state_count,
        team_count,
        improvements,
        tile_improvements,
        players,
        cities,
        units,
        owner_index,
    };
    resolve_city_names(&mut game);
    Ok(game)
}

fn read_tile_improvements(
    data: &[u8],
    offset: usize,
    height: u32,
    width: u32,
) -> Result<Vec<Vec<TileImprovement>>, Error> {
    let section = "tile improvement grid";
    let mut cursor = Cursor::at_offset(data, offset);
    let mut rows = Vec::new();
    for y in 0..height {
        let mut row = Vec::new();
        for x in 0..width {
            let city_id = cursor.read_u16().map_err(|e| e.in_section(section))?;
            cursor.read_bytes(2).map_err(|e| e.in_section(section))?;
            let owner = cursor.read_u8().map_err(|e| e.in_section(section))?;
            let improvement = cursor.read_u8().map_err(|e| e.in_section(section))?;
            let route_type = cursor.read_u8().map_err(|e| e.in_section(section))?;
            let route_owner = cursor.read_u8().map_err(|e| e.in_section(section))?;
            row.push(TileImprovement {
                x: x as i32,
                y: y as i32,
                city_id: if city_id == u16::MAX {
                    -1
                } else {
                    i32::from(city_id)
                },
                city_name: String::new(),
                owner: i32::from(owner),
                improvement: i32::from(improvement),
                route_type: i32::from(route_type),
                route_owner: i32::from(route_owner),
            });
        }
        rows.push(row);
    }
    Ok(rows)
}

fn nul_terminated(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn read_players(data: &[u8], offset: usize, slots: usize) -> Result<Vec<PlayerRecord>, Error> {
    let section = "player block";
    let mut cursor = Cursor::at_offset(data, offset);
    let mut players = Vec::new();
    for index in 0..slots {
        cursor.read_bytes(32).map_err(|e| e.in_section(section))?; // policies
        let leader = nul_terminated(cursor.read_bytes(64).map_err(|e| e.in_section(section))?);
        cursor.read_bytes(64).map_err(|e| e.in_section(section))?; // civ name
        let civ_type = nul_terminated(cursor.read_bytes(64).map_err(|e| e.in_section(section))?);
        let team_color = nul_terminated(cursor.read_bytes(64).map_err(|e| e.in_section(section))?);
        cursor.read_bytes(64).map_err(|e| e.in_section(section))?; // era
        cursor.read_bytes(64).map_err(|e| e.in_section(section))?; // handicap
        cursor.read_bytes(16).map_err(|e| e.in_section(section))?; // culture/gold/start position
        let team = cursor.read_u8().map_err(|e| e.in_section(section))?;
        let playable = cursor.read_u8().map_err(|e| e.in_section(section))?;
        cursor.read_bytes(2).map_err(|e| e.in_section(section))?;
        players.push(PlayerRecord {
            index,
            civ_type,
            team_color,
            leader,
            team,
            playable,
        });
    }
    Ok(players)
}

fn read_cities(block: &[u8], version: u8, max_city_id: i32) -> Result<Vec<CityRecord>, Error> {
    if block.is_empty() {
        return Ok(Vec::new());
    }
    let section = "city records";
    let mut cursor = Cursor::new(block);
    let declared = cursor.read_u32().map_err(|e| e.in_section(section))?;

    // The declared count is only a lower bound: some files undercount and the
    // real number of slots is revealed by the highest city id referenced from
    // the tile-improvement grid.
    let count = declared.max((max_city_id + 1) as u32);

    let building_info_size = if version >= 12 { 64 } else { 32 };
    let mut cities = Vec::new();
    for _ in 0..count {
        let name = nul_terminated(cursor.read_bytes(64).map_err(|e| e.in_section(section))?);
        let owner = cursor.read_u8().map_err(|e| e.in_section(section))?;
        let flags = cursor.read_u8().map_err(|e| e.in_section(section))?;
        let population = cursor.read_u16().map_err(|e| e.in_section(section))?;
        let health = cursor.read_u32().map_err(|e| e.in_section(section))?;
        let building_info = cursor
            .read_bytes(building_info_size)
            .map_err(|e| e.in_section(section))?
            .to_vec();
        cities.push(CityRecord {
            name,
            owner,
            owner_adjusted: if owner >= 32 { owner - 32 } else { owner },
            name_localized: flags & 1 != 0,
            puppet: (flags >> 1) & 1 != 0,
            occupied: (flags >> 2) & 1 != 0,
            population,
            health,
            building_info,
        });
    }
    Ok(cities)
}

fn read_units(block: &[u8], version: u8) -> Result<Vec<UnitRecord>, Error> {
    if block.is_empty() {
        return Ok(Vec::new());
    }
    let section = "unit records";
    let mut cursor = Cursor::new(block);
    let declared = cursor.read_u32().map_err(|e| e.in_section(section))?;

    let record_size = if version >= 12 { 84 } else { 48 };
    // The declared count can exceed what the section physically holds; clamp
    // it to the capacity of the block.
    let capacity = (block.len() / record_size) as u32;
    let count = declared.min(capacity);

    let mut units = Vec::new();
    for _ in 0..count {
        cursor.read_bytes(2).map_err(|e| e.in_section(section))?;
        let name_index = cursor.read_u16().map_err(|e| e.in_section(section))?;
        let experience = cursor.read_u32().map_err(|e| e.in_section(section))?;
        let health = cursor.read_u32().map_err(|e| e.in_section(section))?;
        let unit_type = if version >= 12 {
            cursor.read_u32().map_err(|e| e.in_section(section))?
        } else {
            u32::from(cursor.read_u8().map_err(|e| e.in_section(section))?)
        };
        let owner = cursor.read_u8().map_err(|e| e.in_section(section))?;
        let facing = cursor.read_u8().map_err(|e| e.in_section(section))?;
        let status = cursor.read_u8().map_err(|e| e.in_section(section))?;
        let promotions = if version >= 12 {
            cursor.read_u8().map_err(|e| e.in_section(section))?;
            cursor.read_bytes(64).map_err(|e| e.in_section(section))?
        } else {
            cursor.read_bytes(32).map_err(|e| e.in_section(section))?
        };
        units.push(UnitRecord {
            name_index,
            experience,
            health,
            unit_type,
            owner,
            facing,
            status,
            promotions: promotions.to_vec(),
        });
    }
    Ok(units)
}

/// Resolves the city name shown on each owned tile, applying the
/// localization-key transform for names stored as keys
fn resolve_city_names(game: &mut GameInfo) {
    for row in &mut game.tile_improvements {
        for tile in row {
            if tile.city_id < 0 {
                continue;
            }
            let city = match game.cities.get(tile.city_id as usize) {
                Some(city) => city,
                None => continue,
            };
            tile.city_name = if city.name_localized {
                localize_city_name(&city.name)
            } else {
                city.name.clone()
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_preserves_empty_trailing_entries() {
        assert_eq!(split_nul_strings(b"A\0\0"), vec!["A", ""]);
        assert_eq!(
            split_nul_strings(b"TERRAIN_GRASS\0TERRAIN_PLAINS\0"),
            vec!["TERRAIN_GRASS", "TERRAIN_PLAINS"]
        );
        assert!(split_nul_strings(b"").is_empty());
    }

    #[test]
    fn split_reencodes_to_original_bytes() {
        let region = b"TERRAIN_GRASS\0TERRAIN_OCEAN\0\0";
        let entries = split_nul_strings(region);
        let mut reencoded = Vec::new();
        for entry in &entries {
            reencoded.extend_from_slice(entry.as_bytes());
            reencoded.push(0);
        }
        assert_eq!(reencoded, region);
    }

    #[test]
    fn header_nibbles() {
        let header = MapHeader {
            scenario_version: 0x3C,
            width: 0,
            height: 0,
            players: 0,
            settings: [0b101, 0, 0, 0],
            terrain_data_size: 0,
            feature_terrain_data_size: 0,
            feature_wonder_data_size: 0,
            resource_data_size: 0,
            mod_data_size: 0,
            map_name_length: 0,
            map_description_length: 0,
        };
        assert_eq!(header.version(), 12);
        assert_eq!(header.scenario(), 3);
        assert!(header.has_world_wrap());
        assert!(!header.has_random_resources());
        assert!(header.has_random_goodies());
    }

    #[test]
    fn nul_terminated_name() {
        let mut raw = [0u8; 64];
        raw[..4].copy_from_slice(b"Roma");
        assert_eq!(nul_terminated(&raw), "Roma");
    }

    #[test]
    fn city_count_widened_by_max_city_id() {
        let mut block = 1u32.to_le_bytes().to_vec();
        for _ in 0..3 {
            block.extend_from_slice(&[0u8; 64]); // name
            block.push(0); // owner
            block.push(0); // flags
            block.extend_from_slice(&0u16.to_le_bytes());
            block.extend_from_slice(&0u32.to_le_bytes());
            block.extend_from_slice(&[0u8; 32]);
        }
        let cities = read_cities(&block, 11, 2).unwrap();
        assert_eq!(cities.len(), 3);
    }

    #[test]
    fn unit_count_clamped_to_section_capacity() {
        let mut block = 500u32.to_le_bytes().to_vec();
        block.extend_from_slice(&[0u8; 48 * 2]);
        let units = read_units(&block, 11).unwrap();
        assert_eq!(units.len(), 2);
    }

    #[test]
    fn river_bits() {
        let tile = Tile {
            terrain: 0,
            resource: 0,
            feature_terrain: 0,
            river: 0b101,
            elevation: 0,
            continent: 0,
            feature_wonder: 0,
            resource_amount: 0,
        };
        assert!(tile.river_southwest());
        assert!(!tile.river_southeast());
        assert!(tile.river_east());
    }
}
