use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CACHE_DIR: &str = "league_table";
const FAVORITE_FILE: &str = "favorite.json";
const FAVORITE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct FavoriteFile {
    version: u32,
    #[serde(default)]
    team_id: Option<u32>,
}

pub fn favorite_path() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR).join(FAVORITE_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(FAVORITE_FILE),
    )
}

/// Missing, unreadable or stale files all read as "no favorite".
pub fn load_favorite_from(path: &Path) -> Option<u32> {
    let raw = fs::read_to_string(path).ok()?;
    let file = serde_json::from_str::<FavoriteFile>(&raw).ok()?;
    if file.version != FAVORITE_VERSION {
        return None;
    }
    file.team_id
}

pub fn save_favorite_to(path: &Path, team_id: Option<u32>) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("create favorite dir")?;
    }
    let file = FavoriteFile {
        version: FAVORITE_VERSION,
        team_id,
    };
    let json = serde_json::to_string(&file).context("serialize favorite")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write favorite")?;
    fs::rename(&tmp, path).context("swap favorite")?;
    Ok(())
}
