use civfive::{json, FileKind, MapFile, ReplayFile, SaveFile};
use std::{env, error, fs, process::exit};

fn main() -> Result<(), Box<dyn error::Error>> {
    let args: Vec<String> = env::args().collect();
    let path = match args.get(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: json <file.{{civ5map,civ5replay,civ5save}}>");
            exit(1);
        }
    };

    let data = fs::read(path)?;
    let document = match FileKind::from_path(path) {
        Some(FileKind::Map) => json::export_map(&MapFile::from_slice(&data)?)?,
        Some(FileKind::Replay) => json::export_replay(&ReplayFile::from_slice(&data)?)?,
        Some(FileKind::Save) => {
            let save = SaveFile::from_slice(&data)?;
            if save.decompression.is_truncated() {
                eprintln!("warning: compressed payload is truncated; partial decode");
            }
            json::export_save(&save)?
        }
        Some(FileKind::Json) | None => {
            eprintln!("unrecognized input format: {}", path);
            exit(1);
        }
    };

    println!("{}", document);
    Ok(())
}
