use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use volare_core::flight::FlightSearchResult;

/// Read-through cache for serialized search results. The cache is a
/// performance layer only: `get` degrades to a miss and `set` to a no-op on
/// any backing-store failure, so the search pipeline behaves identically
/// with the store down.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<FlightSearchResult>;
    async fn set(&self, key: &str, value: &FlightSearchResult, ttl: Duration);
}

#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResultCache for RedisCache {
    async fn get(&self, key: &str) -> Option<FlightSearchResult> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Redis unavailable, treating {} as a miss: {}", key, e);
                return None;
            }
        };
        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Redis read failed for {}: {}", key, e);
                return None;
            }
        };
        raw.and_then(|payload| match serde_json::from_str(&payload) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        })
    }

    async fn set(&self, key: &str, value: &FlightSearchResult, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not serialize result for {}: {}", key, e);
                return;
            }
        };
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Redis unavailable, skipping write for {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, payload, ttl.as_secs())
            .await
        {
            warn!("Redis write failed for {}: {}", key, e);
        } else {
            debug!("Cached {} for {}s", key, ttl.as_secs());
        }
    }
}

/// In-process cache with the same expiry semantics as the Redis store.
/// Backs tests and deployments without a configured Redis URL. Entries are
/// stored serialized so hits round-trip exactly like the network path.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (Instant, String)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<FlightSearchResult> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((expires_at, payload)) if *expires_at > now => {
                serde_json::from_str(payload).ok()
            }
            Some(_) => {
                // Expired: prune on read so stale entries can never be served.
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: &FlightSearchResult, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not serialize result for {}: {}", key, e);
                return;
            }
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (Instant::now() + ttl, payload));
    }
}
