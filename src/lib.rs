/*!
A decoder for the binary file formats of Civilization V: map files
(`.civ5map`), end-of-game replays (`.civ5replay`), and save games
(`.civ5save`). The formats are undocumented; the layouts implemented here
were reverse engineered from real files, so many sections are decoded only
far enough to keep the byte cursor aligned.

## Example

```rust,no_run
use civfive::MapFile;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read("earth.Civ5Map")?;
    let map = MapFile::from_slice(&data)?;
    println!("{}x{} tiles", map.header.width, map.header.height);
    for (y, row) in map.tiles.iter().enumerate() {
        for x in 0..row.len() {
            let _terrain = map.terrain_str(y, x);
        }
    }
    Ok(())
}
```

Decoding is strict about structure but tolerant of damage that real files
exhibit: a map file cut short after its tile grid still yields the grid, and
a save file with a truncated compressed payload is decoded as far as the
recovered bytes allow, with the truncation reported on the result.

With the default `json` feature, every decoded model can be exported to and
re-imported from a JSON document that mirrors it field for field.
*/

pub mod cursor;
pub mod derived;
mod errors;
#[cfg(feature = "json")]
pub mod json;
pub mod map;
pub mod replay;
pub mod save;
pub mod schema;

pub use crate::errors::{Error, ErrorKind};
pub use crate::map::{MapFile, MapHeader, Tile, TileImprovement};
pub use crate::replay::{ReplayEvent, ReplayFile};
pub use crate::save::SaveFile;

use std::path::Path;

/// The file formats this crate can decode, detected by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Map,
    Replay,
    Save,
    /// A JSON mirror produced by a previous export
    Json,
}

impl FileKind {
    /// Detects the format from a path's extension, case-insensitively.
    ///
    /// ```rust
    /// use civfive::FileKind;
    ///
    /// assert_eq!(FileKind::from_path("earth.Civ5Map"), Some(FileKind::Map));
    /// assert_eq!(FileKind::from_path("game.civ5save"), Some(FileKind::Save));
    /// assert_eq!(FileKind::from_path("notes.txt"), None);
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<FileKind> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "civ5map" => Some(FileKind::Map),
            "civ5replay" => Some(FileKind::Replay),
            "civ5save" => Some(FileKind::Save),
            "json" => Some(FileKind::Json),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_kind_from_extension() {
        assert_eq!(FileKind::from_path("a/b/earth.Civ5Map"), Some(FileKind::Map));
        assert_eq!(
            FileKind::from_path("game.Civ5Replay"),
            Some(FileKind::Replay)
        );
        assert_eq!(FileKind::from_path("auto.CIV5SAVE"), Some(FileKind::Save));
        assert_eq!(FileKind::from_path("export.json"), Some(FileKind::Json));
        assert_eq!(FileKind::from_path("no_extension"), None);
        assert_eq!(FileKind::from_path("archive.zip"), None);
    }
}
