//! A JSON mirror of the decoded data models.
//!
//! Each document is the decoded model wrapped in a small envelope naming the
//! game and the source file format, serialized structurally with field names
//! preserved. Importing a document recovers a model that is field-for-field
//! equal to the original decode.

use crate::{errors::Error, map::MapFile, replay::ReplayFile, save::SaveFile};
use serde::{Deserialize, Serialize};

pub const GAME_NAME: &str = "Civilization 5";

/// Envelope around a decoded `.civ5map`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub game_name: String,
    pub file_format: String,
    pub map: MapFile,
}

/// Envelope around a decoded `.civ5replay`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayDocument {
    pub game_name: String,
    pub file_format: String,
    pub replay: ReplayFile,
}

/// Envelope around a decoded `.civ5save`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub game_name: String,
    pub file_format: String,
    pub save: SaveFile,
}

pub fn export_map(map: &MapFile) -> Result<String, Error> {
    let document = MapDocument {
        game_name: GAME_NAME.to_string(),
        file_format: ".Civ5Map".to_string(),
        map: map.clone(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn import_map(data: &[u8]) -> Result<MapFile, Error> {
    let document: MapDocument = serde_json::from_slice(data)?;
    Ok(document.map)
}

pub fn export_replay(replay: &ReplayFile) -> Result<String, Error> {
    let document = ReplayDocument {
        game_name: GAME_NAME.to_string(),
        file_format: ".Civ5Replay".to_string(),
        replay: replay.clone(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn import_replay(data: &[u8]) -> Result<ReplayFile, Error> {
    let document: ReplayDocument = serde_json::from_slice(data)?;
    Ok(document.replay)
}

pub fn export_save(save: &SaveFile) -> Result<String, Error> {
    let document = SaveDocument {
        game_name: GAME_NAME.to_string(),
        file_format: ".Civ5Save".to_string(),
        save: save.clone(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn import_save(data: &[u8]) -> Result<SaveFile, Error> {
    let document: SaveDocument = serde_json::from_slice(data)?;
    Ok(document.save)
}
