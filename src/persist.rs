use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::model::{Match, Player};

const CACHE_DIR: &str = "calcetto_terminal";
const CACHE_FILE: &str = "cache.json";
const CACHE_VERSION: u32 = 1;

/// Last good snapshot of the record store, so the dashboard starts with
/// data before the first fetch completes (or entirely offline).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Snapshot {
    version: u32,
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
    #[serde(default)]
    pub fetched_at: Option<u64>,
}

impl Snapshot {
    pub fn new(players: Vec<Player>, matches: Vec<Match>) -> Self {
        Self {
            version: CACHE_VERSION,
            players,
            matches,
            fetched_at: system_time_to_secs(SystemTime::now()),
        }
    }

    pub fn fetched_at_time(&self) -> Option<SystemTime> {
        self.fetched_at.and_then(system_time_from_secs)
    }
}

/// Best effort: an unreadable, unparsable or version-mismatched cache
/// just means starting empty.
pub fn load_snapshot() -> Option<Snapshot> {
    let path = cache_path()?;
    let raw = fs::read_to_string(&path).ok()?;
    let snapshot = serde_json::from_str::<Snapshot>(&raw).ok()?;
    if snapshot.version != CACHE_VERSION {
        return None;
    }
    Some(snapshot)
}

pub fn save_snapshot(snapshot: &Snapshot) {
    let Some(path) = cache_path() else {
        return;
    };
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    if let Ok(json) = serde_json::to_string(snapshot) {
        let tmp = path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, &path);
        }
    }
}

fn cache_path() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(Path::new(&base).join(CACHE_DIR).join(CACHE_FILE));
        }
    }
    // Fallback to ~/.cache on linux-like systems.
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(CACHE_FILE),
    )
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn system_time_from_secs(secs: u64) -> Option<SystemTime> {
    UNIX_EPOCH.checked_add(std::time::Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_snapshot_carries_its_fetch_time() {
        let before = SystemTime::now();
        let snapshot = Snapshot::new(Vec::new(), Vec::new());
        let at = snapshot.fetched_at_time().expect("fetch time should be set");
        assert!(at >= before - std::time::Duration::from_secs(1));
        assert!(at <= SystemTime::now());
    }

    #[test]
    fn fetch_time_survives_serialization() {
        let snapshot = Snapshot::new(Vec::new(), Vec::new());
        let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
        let restored: Snapshot = serde_json::from_str(&json).expect("snapshot parses");
        assert_eq!(restored.fetched_at, snapshot.fetched_at);
        assert!(restored.fetched_at_time().is_some());
    }
}
