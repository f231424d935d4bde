//! Response cache keyed by the SHA-256 of the canonical request JSON.

use chrono::{DateTime, Utc};
use nq_core::{CacheEntry, CacheStorage, ChatResponse, Error, Result};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Compact JSON with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Lowercase hex SHA-256 of the canonical JSON of `request`.
pub fn request_hash<T: Serialize + ?Sized>(request: &T) -> Result<String> {
    let canonical = canonical_json(&serde_json::to_value(request)?);
    Ok(hash_canonical(&canonical))
}

fn hash_canonical(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct ResponseCache {
    store: Arc<dyn CacheStorage>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStorage>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached response for `request`, if one is still live.
    pub async fn get<T: Serialize + ?Sized + Sync>(&self, request: &T) -> Result<Option<ChatResponse>> {
        let hash = request_hash(request)?;
        let Some(entry) = self.store.get_live(&hash, Utc::now()).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<ChatResponse>(&entry.response_payload) {
            Ok(response) => {
                debug!("💾 Cache hit for {}", hash);
                Ok(Some(response))
            }
            Err(e) => {
                warn!("Ignoring undecodable cache entry {}: {}", hash, e);
                Ok(None)
            }
        }
    }

    /// Store `response` for `request` for the configured TTL.
    pub async fn set<T: Serialize + ?Sized + Sync>(&self, request: &T, response: &ChatResponse) -> Result<()> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::InvalidInput(format!("Cache TTL out of range: {}", e)))?;
        self.set_until(request, response, Utc::now() + ttl).await
    }

    pub async fn set_until<T: Serialize + ?Sized + Sync>(
        &self,
        request: &T,
        response: &ChatResponse,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let request_payload = canonical_json(&serde_json::to_value(request)?);
        let entry = CacheEntry {
            request_hash: hash_canonical(&request_payload),
            request_payload,
            response_payload: serde_json::to_string(response)?,
            created_at: Utc::now(),
            expires_at,
        };
        self.store.put(entry).await
    }

    /// Delete every expired entry, returning how many went.
    pub async fn sweep(&self) -> Result<u64> {
        let purged = self.store.purge_expired(Utc::now()).await?;
        if purged > 0 {
            info!("🧹 Swept {} expired cache entr{}", purged, if purged == 1 { "y" } else { "ies" });
        }
        Ok(purged)
    }
}

/// Sweep `cache` every `every` until the returned task is aborted.
pub fn spawn_sweeper(cache: Arc<ResponseCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = cache.sweep().await {
                error!("Cache sweep failed: {}", e);
            }
        }
    })
}
