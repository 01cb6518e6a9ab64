use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur with the shared seen-set
#[derive(Debug, Error)]
pub enum DedupeError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),
}

/// Short-lived seen-set keyed by donor + request
///
/// L1 is an in-process `moka` cache; the optional Redis tier lets several
/// instances share the set. Entries expire after the TTL, so a later
/// re-broadcast can alert the donor again.
pub struct NotificationDeduper {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    local: moka::future::Cache<String, ()>,
    ttl_secs: u64,
}

/// Seen-set key for one donor alert
pub fn alert_key(donor_id: Uuid, request_id: Uuid) -> String {
    format!("alert:{}:{}", request_id, donor_id)
}

impl NotificationDeduper {
    /// In-process seen-set only
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let local = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            redis: None,
            local,
            ttl_secs,
        }
    }

    /// Seen-set shared through Redis
    pub async fn with_redis(redis_url: &str, capacity: u64, ttl_secs: u64) -> Result<Self, DedupeError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        let mut deduper = Self::new(capacity, ttl_secs);
        deduper.redis = Some(Arc::new(tokio::sync::Mutex::new(redis)));
        Ok(deduper)
    }

    /// Record an alert; returns false when it was already sent within the TTL
    pub async fn claim(&self, donor_id: Uuid, request_id: Uuid) -> bool {
        let key = alert_key(donor_id, request_id);

        let fresh = self.local.entry(key.clone()).or_insert(()).await.is_fresh();
        if !fresh {
            tracing::trace!("Seen-set hit (L1): {}", key);
            return false;
        }

        if let Some(redis) = &self.redis {
            match self.claim_shared(redis, &key).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::trace!("Seen-set hit (L2): {}", key);
                    return false;
                }
                Err(e) => {
                    tracing::warn!("Shared seen-set unavailable, using local entry for {}: {}", key, e);
                }
            }
        }

        true
    }

    async fn claim_shared(
        &self,
        redis: &tokio::sync::Mutex<ConnectionManager>,
        key: &str,
    ) -> Result<bool, DedupeError> {
        let mut conn = redis.lock().await;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut *conn)
            .await?;
        Ok(reply.is_some())
    }

    /// Forget an alert so a later broadcast may retry it
    pub async fn release(&self, donor_id: Uuid, request_id: Uuid) {
        let key = alert_key(donor_id, request_id);
        self.local.invalidate(&key).await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let result: redis::RedisResult<()> =
                redis::cmd("DEL").arg(&key).query_async(&mut *conn).await;
            if let Err(e) = result {
                tracing::warn!("Failed to release shared seen-set entry {}: {}", key, e);
            }
        }
    }
}
