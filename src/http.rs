use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "calcetto_terminal";
const CACHE_FILE: &str = "http_cache.json";

static CLIENT: OnceCell<Client> = OnceCell::new();
static CACHE: Mutex<Option<BodyCacheFile>> = Mutex::new(None);

/// Connection details for the PostgREST endpoint of the record store,
/// read from the environment (`.env.local` / `.env` are loaded at
/// startup).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let url = required_env("SUPABASE_URL")?;
        let anon_key = required_env("SUPABASE_ANON_KEY")?;
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    let value = std::env::var(key).with_context(|| format!("{key} is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("{key} is empty");
    }
    Ok(value)
}

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// GET a REST path (already including its query string) with the store's
/// auth headers and return the raw body.
///
/// Bodies go through an on-disk cache keyed by URL: a previous fetch's
/// validators (ETag / Last-Modified) are replayed as conditional
/// headers, and a 304 answers straight from the cached body.
pub fn get_json(cfg: &StoreConfig, path_and_query: &str) -> Result<String> {
    let client = http_client()?;
    let url = format!("{}/rest/v1/{}", cfg.url, path_and_query);

    let cached_entry = {
        let mut guard = CACHE.lock().expect("http cache lock poisoned");
        let cache = guard.get_or_insert_with(load_cache_file);
        cache.entries.get(&url).cloned()
    };

    let mut req = client
        .get(&url)
        .header(USER_AGENT, "calcetto-terminal")
        .header("apikey", &cfg.anon_key)
        .header(AUTHORIZATION, format!("Bearer {}", cfg.anon_key));
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(entry) = cached_entry {
            refresh_cache_entry(&url, entry.clone());
            return Ok(entry.body);
        }
        return Err(anyhow::anyhow!("received 304 without cache body"));
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }

    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let last_modified = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let entry = CacheEntry {
        body: body.clone(),
        etag,
        last_modified,
        fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
    };
    refresh_cache_entry(&url, entry);
    Ok(body)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct BodyCacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

fn refresh_cache_entry(key: &str, entry: CacheEntry) {
    let mut guard = CACHE.lock().expect("http cache lock poisoned");
    let cache = guard.get_or_insert_with(load_cache_file);
    cache.version = CACHE_VERSION;
    cache.entries.insert(key.to_string(), entry);
    if let Some(path) = cache_path() {
        let _ = save_cache_to(&path, cache);
    }
}

fn load_cache_file() -> BodyCacheFile {
    let Some(path) = cache_path() else {
        return BodyCacheFile::default();
    };
    load_cache_from(&path)
}

fn load_cache_from(path: &Path) -> BodyCacheFile {
    let Some(raw) = fs::read_to_string(path).ok() else {
        return BodyCacheFile::default();
    };
    let cache = serde_json::from_str::<BodyCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return BodyCacheFile::default();
    }
    cache
}

fn save_cache_to(path: &Path, cache: &BodyCacheFile) -> Result<()> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).ok();
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(cache).context("serialize http cache")?;
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, path).context("swap http cache")?;
    Ok(())
}

fn cache_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_cache_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("calcetto_http_cache_{}", std::process::id()));
        let path = dir.join(CACHE_FILE);

        let mut cache = BodyCacheFile {
            version: CACHE_VERSION,
            ..Default::default()
        };
        cache.entries.insert(
            "https://store.example/rest/v1/players".to_string(),
            CacheEntry {
                body: "[]".to_string(),
                etag: Some("\"abc123\"".to_string()),
                last_modified: None,
                fetched_at: 1700000000,
            },
        );
        save_cache_to(&path, &cache).expect("cache should save");

        let loaded = load_cache_from(&path);
        let entry = &loaded.entries["https://store.example/rest/v1/players"];
        assert_eq!(entry.body, "[]");
        assert_eq!(entry.etag.as_deref(), Some("\"abc123\""));
        assert_eq!(entry.last_modified, None);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn version_mismatch_discards_the_cache() {
        let dir = std::env::temp_dir().join(format!("calcetto_http_stale_{}", std::process::id()));
        let path = dir.join(CACHE_FILE);

        let mut stale = BodyCacheFile {
            version: CACHE_VERSION + 1,
            ..Default::default()
        };
        stale.entries.insert(
            "url".to_string(),
            CacheEntry {
                body: "old".to_string(),
                etag: None,
                last_modified: None,
                fetched_at: 0,
            },
        );
        save_cache_to(&path, &stale).expect("cache should save");

        assert!(load_cache_from(&path).entries.is_empty());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unreadable_cache_starts_empty() {
        let path = Path::new("/nonexistent/calcetto/http_cache.json");
        assert!(load_cache_from(path).entries.is_empty());
    }
}
