//! On-disk JSON cache with a freshness window
//!
//! Each entry is a file holding `{ "written_at": ..., "payload": ... }`.
//! Freshness is judged from `written_at`, not the file modification time, so
//! copying a cache directory keeps entries valid for the same window.

use crate::error::{FinanceError, FinanceResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifies one cached price series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }

    /// `fdr_<ticker>_<YYYYMMDD>_<YYYYMMDD>.json`
    ///
    /// Characters outside `[A-Za-z0-9._-]` in the ticker become `_`.
    pub fn file_name(&self) -> String {
        let ticker: String = self
            .ticker
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!(
            "fdr_{}_{}_{}.json",
            ticker,
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    written_at: DateTime<Utc>,
    payload: T,
}

/// File-per-entry cache
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Fresh payload for `key`, if any
    ///
    /// Missing, stale, unreadable or corrupt entries are all a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        self.get_at(key, Utc::now()).await
    }

    async fn get_at<T: DeserializeOwned>(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<T> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), "Failed to read cache entry: {}", e);
                return None;
            }
        };

        let envelope: Envelope<T> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(path = %path.display(), "Ignoring corrupt cache entry: {}", e);
                return None;
            }
        };

        // A timestamp in the future counts as age zero
        let age = (now - envelope.written_at).to_std().unwrap_or_default();
        if age > self.ttl {
            debug!(path = %path.display(), age_secs = age.as_secs(), "Cache entry is stale");
            return None;
        }

        info!(ticker = key.ticker.as_str(), "Cache hit");
        Some(envelope.payload)
    }

    /// Store `value` under `key`
    ///
    /// The entry is written to a temporary file in the cache directory and
    /// renamed over the target, so readers see the old or the new entry,
    /// never a partial one.
    pub async fn put<T: Serialize>(&self, key: &CacheKey, value: &T) -> FinanceResult<()> {
        self.put_at(key, value, Utc::now()).await
    }

    async fn put_at<T: Serialize>(
        &self,
        key: &CacheKey,
        value: &T,
        written_at: DateTime<Utc>,
    ) -> FinanceResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| FinanceError::Cache(format!("{}: {e}", self.dir.display())))?;

        let bytes = serde_json::to_vec_pretty(&Envelope {
            written_at,
            payload: value,
        })
        .map_err(|e| FinanceError::Cache(e.to_string()))?;

        let target = self.path_for(key);
        let temp = self.dir.join(format!(
            ".{}.{}-{}.tmp",
            key.file_name(),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = tokio::fs::write(&temp, &bytes).await {
            return Err(FinanceError::Cache(format!("{}: {e}", temp.display())));
        }
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(FinanceError::Cache(format!("{}: {e}", target.display())));
        }

        debug!(path = %target.display(), "Cache entry written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn key(ticker: &str) -> CacheKey {
        CacheKey::new(
            ticker,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
    }

    #[test]
    fn test_file_name() {
        assert_eq!(key("TSLA").file_name(), "fdr_TSLA_20250101_20250331.json");
        assert_eq!(key("1211.HK").file_name(), "fdr_1211.HK_20250101_20250331.json");
        assert_eq!(key("../x y").file_name(), "fdr_.._x_y_20250101_20250331.json");
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested"), Duration::from_secs(3600));

        cache.put(&key("TSLA"), &json!({"close": 251.2})).await.unwrap();
        let hit: Option<Value> = cache.get(&key("TSLA")).await;
        assert_eq!(hit, Some(json!({"close": 251.2})));

        let miss: Option<Value> = cache.get(&key("BYD")).await;
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_stale_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), Duration::from_secs(2 * 3600));
        let written = Utc::now() - chrono::Duration::hours(3);

        cache
            .put_at(&key("TSLA"), &json!([1, 2]), written)
            .await
            .unwrap();

        let stale: Option<Value> = cache.get(&key("TSLA")).await;
        assert!(stale.is_none());

        // Still fresh when judged from a point inside the window
        let fresh: Option<Value> = cache
            .get_at(&key("TSLA"), written + chrono::Duration::hours(2))
            .await;
        assert_eq!(fresh, Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), Duration::from_secs(3600));
        std::fs::write(cache.path_for(&key("TSLA")), b"{not json").unwrap();

        let hit: Option<Value> = cache.get(&key("TSLA")).await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path(), Duration::from_secs(3600));

        cache.put(&key("TSLA"), &json!(1)).await.unwrap();
        cache.put(&key("TSLA"), &json!(2)).await.unwrap();

        let hit: Option<Value> = cache.get(&key("TSLA")).await;
        assert_eq!(hit, Some(json!(2)));

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }
}
