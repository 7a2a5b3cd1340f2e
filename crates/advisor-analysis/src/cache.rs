//! Two-tier persistent cache for snapshots and analysis results
//!
//! Each tier pairs an in-memory `TimedCache` front with a durable
//! file-backed store, so intraday repeats are served from memory while
//! entries survive process restarts on disk. The raw tier holds provider
//! snapshots (style-independent), the result tier holds finished analyses
//! keyed per style. Storage faults are logged and reported as misses; the
//! pipeline degrades to recomputing rather than failing a request over a
//! cache fault.

use cached::{Cached, TimedCache};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use advisor_core::InvestorStyle;

/// Cache storage fault; always recoverable by recomputing
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem error
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt or unreadable entry
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The two cache namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Provider snapshots, style-independent, long TTL
    Raw,
    /// Finished analysis results, keyed per style, shorter TTL
    Result,
}

impl CacheTier {
    fn dir_name(&self) -> &'static str {
        match self {
            CacheTier::Raw => "raw",
            CacheTier::Result => "result",
        }
    }
}

/// Composite cache key: ticker, optional style, UTC day bucket.
///
/// The day bucket makes intraday repeats reuse cached data while
/// day-over-day requests miss and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub style: Option<InvestorStyle>,
    pub day: NaiveDate,
}

impl CacheKey {
    /// Key into the raw tier (style-independent)
    pub fn raw(ticker: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            style: None,
            day,
        }
    }

    /// Key into the result tier
    pub fn result(ticker: impl Into<String>, style: InvestorStyle, day: NaiveDate) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            style: Some(style),
            day,
        }
    }

    /// File name for this key; distinct keys never collide
    fn file_name(&self) -> String {
        match self.style {
            Some(style) => format!("{}_{}_{}.json", self.ticker, style, self.day),
            None => format!("{}_{}.json", self.ticker, self.day),
        }
    }
}

/// Disk envelope; entries self-describe their expiry
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope<T> {
    stored_at: DateTime<Utc>,
    ttl_secs: u64,
    value: T,
}

impl<T> CacheEnvelope<T> {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        age.num_seconds() >= 0 && (age.num_seconds() as u64) < self.ttl_secs
    }
}

/// One tier: memory front plus durable directory
struct TierStore {
    dir: PathBuf,
    ttl: Duration,
    memory: Arc<RwLock<TimedCache<CacheKey, serde_json::Value>>>,
}

impl TierStore {
    fn new(dir: PathBuf, ttl: Duration) -> Self {
        Self {
            dir,
            ttl,
            memory: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    async fn try_get(&self, key: &CacheKey) -> Result<Option<serde_json::Value>, CacheError> {
        {
            let mut memory = self.memory.write().await;
            if let Some(value) = memory.cache_get(key) {
                return Ok(Some(value.clone()));
            }
        }

        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        let envelope: CacheEnvelope<serde_json::Value> = serde_json::from_str(&raw)?;

        if !envelope.is_fresh(Utc::now()) {
            // Expired entries behave as absent; leave removal to the next put
            return Ok(None);
        }

        let mut memory = self.memory.write().await;
        let _ = memory.cache_set(key.clone(), envelope.value.clone());
        Ok(Some(envelope.value))
    }

    async fn try_put(&self, key: &CacheKey, value: serde_json::Value) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;

        let envelope = CacheEnvelope {
            stored_at: Utc::now(),
            ttl_secs: self.ttl.as_secs(),
            value: value.clone(),
        };

        // Write-then-rename keeps a concurrent reader on either the whole
        // old entry or the whole new one, never a partial file.
        let path = self.entry_path(key);
        let tmp = self.dir.join(format!(".{}.tmp", key.file_name()));
        fs::write(&tmp, serde_json::to_vec_pretty(&envelope)?)?;
        fs::rename(&tmp, &path)?;

        let mut memory = self.memory.write().await;
        let _ = memory.cache_set(key.clone(), value);
        Ok(())
    }
}

/// Two-tier cache manager.
///
/// Constructed once per process with injected storage root and TTLs; the
/// handle is shared (via `Arc`) by every orchestrator instance.
pub struct CacheManager {
    raw: TierStore,
    result: TierStore,
}

impl CacheManager {
    /// Create a cache manager rooted at `dir` with per-tier TTLs
    pub fn new(dir: impl AsRef<Path>, raw_ttl: Duration, result_ttl: Duration) -> Self {
        let root = dir.as_ref();
        Self {
            raw: TierStore::new(root.join(CacheTier::Raw.dir_name()), raw_ttl),
            result: TierStore::new(root.join(CacheTier::Result.dir_name()), result_ttl),
        }
    }

    fn tier(&self, tier: CacheTier) -> &TierStore {
        match tier {
            CacheTier::Raw => &self.raw,
            CacheTier::Result => &self.result,
        }
    }

    /// Look up an entry. Missing, expired and unreadable entries all
    /// return `None`; the caller decides whether to repopulate.
    pub async fn get<T: DeserializeOwned>(&self, tier: CacheTier, key: &CacheKey) -> Option<T> {
        match self.tier(tier).try_get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(typed) => {
                    tracing::debug!(ticker = %key.ticker, ?tier, "cache hit");
                    Some(typed)
                }
                Err(e) => {
                    tracing::warn!(ticker = %key.ticker, ?tier, error = %e, "cache entry has wrong shape, treating as miss");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(ticker = %key.ticker, ?tier, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(ticker = %key.ticker, ?tier, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store an entry, replacing whatever was there. Storage faults are
    /// logged and swallowed; a dead cache must never fail a request.
    pub async fn put<T: Serialize>(&self, tier: CacheTier, key: &CacheKey, value: &T) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(ticker = %key.ticker, ?tier, error = %e, "cache serialize failed, skipping write");
                return;
            }
        };

        if let Err(e) = self.tier(tier).try_put(key, json).await {
            tracing::warn!(ticker = %key.ticker, ?tier, error = %e, "cache write failed, continuing without");
        }
    }
}
