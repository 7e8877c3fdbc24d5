//! # Bulletin Fetching and Caching
//!
//! Everything with I/O lives here, outside the pure core. A year's bulletin is
//! fetched over HTTP and kept in a cache so the dashboard does not download
//! the same text on every refresh.
//!
//! ## Collaborators
//!
//! - [`BulletinSource`]: where bulletin text comes from ([`HttpBulletinSource`]
//!   in production, any stub in tests)
//! - [`BulletinCache`]: a `key → (text, fetched_at)` store
//!   ([`FileCache`] on disk, [`MemoryCache`] in process)
//! - [`BulletinStore`]: combines the two under a caller-chosen TTL
//!
//! The store never reads the clock; `now` is passed to [`BulletinStore::load`].
//!
//! ## Error Handling
//!
//! - **Network failures**: surface as [`FetchError::Http`], unless a stale
//!   cache entry exists, in which case the stale text is served
//! - **Cache corruption**: unreadable entries are logged and refetched
//! - **Cache write failures**: logged, the fresh text is still returned

use crate::config::StationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from fetching or caching bulletin text.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cache file operations failed (permissions, disk space)
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),

    /// Cache entry could not be encoded or decoded
    #[error("cache entry: {0}")]
    Codec(#[from] serde_json::Error),
}

/// A cached bulletin and when it was fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub text: String,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// True if the entry is younger than `ttl` at `now`.
    ///
    /// Entries stamped in the future are treated as stale.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => false,
        }
    }
}

/// Key → entry storage for bulletin text.
pub trait BulletinCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, FetchError>;
    fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), FetchError>;
}

/// In-process cache, mainly for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BulletinCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, FetchError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), FetchError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }
}

/// One JSON file per key under a directory.
///
/// Using a directory under /tmp means the cache is cleared on reboot.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BulletinCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, FetchError> {
        let data = match fs::read(self.path_for(key)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), FetchError> {
        fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_vec(entry)?;
        fs::write(self.path_for(key), data)?;
        Ok(())
    }
}

/// Somewhere a year's bulletin text can be fetched from.
pub trait BulletinSource {
    fn fetch_year(&self, year: i32) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Fetches bulletins over HTTP from the configured URL template.
#[derive(Debug, Clone)]
pub struct HttpBulletinSource {
    client: reqwest::Client,
    station: StationConfig,
}

impl HttpBulletinSource {
    /// Build a source with a 30 s request timeout.
    pub fn new(station: StationConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, station })
    }
}

impl BulletinSource for HttpBulletinSource {
    async fn fetch_year(&self, year: i32) -> Result<String, FetchError> {
        let url = self.station.bulletin_url_for(year);
        info!(%url, "fetching tide bulletin");
        let text = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(bytes = text.len(), "bulletin downloaded");
        Ok(text)
    }
}

/// Cache-first access to yearly bulletins.
pub struct BulletinStore<S, C> {
    source: S,
    cache: C,
    ttl: Duration,
    station_code: String,
}

impl<S: BulletinSource, C: BulletinCache> BulletinStore<S, C> {
    pub fn new(source: S, cache: C, ttl: Duration, station_code: impl Into<String>) -> Self {
        Self {
            source,
            cache,
            ttl,
            station_code: station_code.into(),
        }
    }

    /// Cache key for a station's year.
    fn key(&self, year: i32) -> String {
        format!("{}-{year}", self.station_code)
    }

    /// Return the bulletin text for `year`, fetching only if the cached copy is
    /// missing or older than the TTL at `now`.
    pub async fn load(&self, year: i32, now: DateTime<Utc>) -> Result<String, FetchError> {
        let key = self.key(year);

        let cached = match self.cache.get(&key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%key, "unreadable cache entry, refetching: {e}");
                None
            }
        };

        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.ttl) {
                debug!(%key, "bulletin cache hit");
                return Ok(entry.text.clone());
            }
        }

        let text = match self.source.fetch_year(year).await {
            Ok(text) => text,
            Err(e) => {
                return match cached {
                    Some(stale) => {
                        warn!(%key, "fetch failed, serving stale bulletin: {e}");
                        Ok(stale.text)
                    }
                    None => Err(e),
                };
            }
        };

        let entry = CacheEntry {
            text,
            fetched_at: now,
        };
        if let Err(e) = self.cache.put(&key, &entry) {
            warn!(%key, "could not write bulletin cache: {e}");
        }
        Ok(entry.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Returns canned text and counts calls.
    struct StubSource {
        text: Option<String>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn ok(text: &str) -> Self {
            Self {
                text: Some(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                text: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl BulletinSource for StubSource {
        async fn fetch_year(&self, year: i32) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.text {
                Some(text) => Ok(format!("{year}:{text}")),
                None => Err(io::Error::other("offline").into()),
            }
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 3, hour, 0, 0).unwrap()
    }

    const DAY: Duration = Duration::from_secs(86_400);

    #[test]
    fn freshness_respects_ttl() {
        let entry = CacheEntry {
            text: String::new(),
            fetched_at: at(6),
        };
        assert!(entry.is_fresh(at(6), DAY));
        assert!(entry.is_fresh(at(23), DAY));
        assert!(!entry.is_fresh(at(7), Duration::from_secs(3600)));
        assert!(!entry.is_fresh(at(5), DAY));
    }

    #[tokio::test]
    async fn fresh_entry_skips_source() {
        let store = BulletinStore::new(StubSource::ok("bulletin"), MemoryCache::new(), DAY, "TK");

        assert_eq!(store.load(2025, at(6)).await.unwrap(), "2025:bulletin");
        assert_eq!(store.load(2025, at(12)).await.unwrap(), "2025:bulletin");
        assert_eq!(store.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_entry_is_refetched() {
        let ttl = Duration::from_secs(3600);
        let store = BulletinStore::new(StubSource::ok("bulletin"), MemoryCache::new(), ttl, "TK");

        store.load(2025, at(6)).await.unwrap();
        store.load(2025, at(8)).await.unwrap();
        assert_eq!(store.source.calls.load(Ordering::SeqCst), 2);

        let entry = store.cache.get("TK-2025").unwrap().unwrap();
        assert_eq!(entry.fetched_at, at(8));
    }

    #[tokio::test]
    async fn years_are_cached_separately() {
        let store = BulletinStore::new(StubSource::ok("b"), MemoryCache::new(), DAY, "TK");
        assert_eq!(store.load(2025, at(6)).await.unwrap(), "2025:b");
        assert_eq!(store.load(2026, at(6)).await.unwrap(), "2026:b");
        assert_eq!(store.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_serves_stale_text() {
        let cache = MemoryCache::new();
        cache
            .put(
                "TK-2025",
                &CacheEntry {
                    text: "old".to_string(),
                    fetched_at: at(0),
                },
            )
            .unwrap();
        let store = BulletinStore::new(StubSource::failing(), cache, Duration::from_secs(60), "TK");

        assert_eq!(store.load(2025, at(12)).await.unwrap(), "old");
    }

    #[tokio::test]
    async fn failed_fetch_without_cache_is_an_error() {
        let store = BulletinStore::new(StubSource::failing(), MemoryCache::new(), DAY, "TK");
        assert!(matches!(
            store.load(2025, at(6)).await,
            Err(FetchError::Cache(_))
        ));
    }

    #[test]
    fn file_cache_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("bulletins"));
        assert!(cache.get("TK-2025").unwrap().is_none());

        let entry = CacheEntry {
            text: "25 1 3TK 507162".to_string(),
            fetched_at: at(6),
        };
        cache.put("TK-2025", &entry).unwrap();
        assert_eq!(cache.get("TK-2025").unwrap(), Some(entry));
    }

    #[tokio::test]
    async fn corrupt_file_entry_is_refetched() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("TK-2025.json"), b"not json").unwrap();
        let cache = FileCache::new(dir.path());
        assert!(matches!(cache.get("TK-2025"), Err(FetchError::Codec(_))));

        let store = BulletinStore::new(StubSource::ok("fresh"), cache, DAY, "TK");
        assert_eq!(store.load(2025, at(6)).await.unwrap(), "2025:fresh");
        assert_eq!(
            store.cache.get("TK-2025").unwrap().unwrap().text,
            "2025:fresh"
        );
    }
}
