use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// File cache of raw scoreboard responses, kept for debugging score
/// discrepancies after the fact
pub struct SnapshotCache {
    raw_dir: PathBuf,
}

impl SnapshotCache {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let raw_dir = cache_dir.as_ref().join("raw");
        fs::create_dir_all(&raw_dir).context("Failed to create raw cache directory")?;
        Ok(Self { raw_dir })
    }

    /// Overwrite the snapshot stored under `key`
    pub fn save_raw(&self, key: &str, data: &Value) -> Result<()> {
        let file_path = self.build_raw_path(key);
        let json = serde_json::to_string_pretty(data).context("Failed to serialize snapshot")?;
        fs::write(&file_path, json)
            .with_context(|| format!("Failed to write snapshot {}", file_path.display()))?;
        debug!("Saved scoreboard snapshot: {}", file_path.display());
        Ok(())
    }

    pub fn load_raw(&self, key: &str) -> Result<Option<Value>> {
        let file_path = self.build_raw_path(key);
        if !file_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&file_path)?;
        let data = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse JSON from {:?}. First 200 chars: {}",
                file_path,
                &json[..json.len().min(200)]
            )
        })?;
        Ok(Some(data))
    }

    pub fn scoreboard_key(season: i32, week: u32) -> String {
        format!("scoreboard-{}-w{:02}", season, week)
    }

    fn build_raw_path(&self, key: &str) -> PathBuf {
        self.raw_dir.join(format!("{}.json", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path()).unwrap();
        let key = SnapshotCache::scoreboard_key(2025, 3);
        assert_eq!(key, "scoreboard-2025-w03");

        assert!(cache.load_raw(&key).unwrap().is_none());
        cache.save_raw(&key, &json!({"events": []})).unwrap();
        assert_eq!(cache.load_raw(&key).unwrap(), Some(json!({"events": []})));
    }
}
