//! High-score persistence: a single record value in a small RON file.
//! Missing file means fresh install (0, no warning); a corrupt file degrades
//! to 0 with a warning instead of failing the round.

use bevy::prelude::*;
use fd_core::GameConfigRes;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq)]
struct Record {
    best: u64,
}

/// The best score seen across rounds, as loaded at startup and updated by
/// each game-over commit.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct HighScore(pub u64);

/// Read the stored record; `(0, None)` when the file does not exist.
pub fn load(path: impl AsRef<Path>) -> (u64, Option<String>) {
    match fs::read_to_string(&path) {
        Ok(txt) => match ron::from_str::<Record>(&txt) {
            Ok(r) => (r.best, None),
            Err(e) => (0, Some(format!("parse highscore: {e}"))),
        },
        Err(_) => (0, None),
    }
}

/// Persist `max(stored, score)`. Returns the resulting best and whether the
/// given score set a new record.
pub fn commit(path: impl AsRef<Path>, score: u64) -> Result<(u64, bool), String> {
    let path = path.as_ref();
    let (stored, _) = load(path);
    let best = stored.max(score);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| format!("create highscore dir: {e}"))?;
        }
    }
    let txt =
        ron::to_string(&Record { best }).map_err(|e| format!("serialize highscore: {e}"))?;
    fs::write(path, txt).map_err(|e| format!("write highscore: {e}"))?;
    Ok((best, score > stored))
}

/// Startup system: read the record into the [`HighScore`] resource.
pub fn load_at_startup(mut commands: Commands, cfg: Res<GameConfigRes>) {
    let (best, warning) = load(&cfg.0.highscore.path);
    if let Some(w) = warning {
        warn!("HIGHSCORE: {w}");
    }
    commands.insert_resource(HighScore(best));
}
