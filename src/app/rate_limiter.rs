use anyhow::Result;
use redis::AsyncCommands;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::infra::cache::RedisCache;

#[derive(Debug, Clone, Copy)]
pub enum RateWindow {
    Hour,
}

impl RateWindow {
    pub fn seconds(&self) -> u64 {
        match self {
            RateWindow::Hour => 60 * 60,
        }
    }
}

/// Index of the fixed window that contains `now`.
pub fn current_window(window_seconds: u64) -> u64 {
    let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
    now / window_seconds
}

pub struct RateLimitInfo {
    pub limited: bool,
    pub remaining: u32,
}

#[derive(Clone)]
pub struct RateLimiter {
    cache: RedisCache,
}

impl RateLimiter {
    pub fn new(cache: RedisCache) -> Self {
        Self { cache }
    }

    /// Checks the counter for `action` and counts this attempt when it is allowed.
    pub async fn hit(
        &self,
        user_id: Uuid,
        action: &str,
        limit: u32,
        window: RateWindow,
    ) -> Result<RateLimitInfo> {
        let window_seconds = window.seconds();
        let key = self.cache.key(&format!(
            "ratelimit:{}:{}:{}",
            user_id,
            action,
            current_window(window_seconds)
        ));

        let mut conn = self.cache.client().get_multiplexed_async_connection().await?;
        let count: u32 = conn.get::<_, Option<u32>>(&key).await?.unwrap_or(0);

        if count >= limit {
            tracing::debug!(
                user_id = %user_id,
                action = action,
                window = ?window,
                count = count,
                limit = limit,
                "Rate limit exceeded"
            );
            return Ok(RateLimitInfo {
                limited: true,
                remaining: 0,
            });
        }

        let _: () = conn.incr(&key, 1).await?;
        if count == 0 {
            let _: () = conn.expire(&key, window_seconds as i64).await?;
        }

        Ok(RateLimitInfo {
            limited: false,
            remaining: limit.saturating_sub(count + 1),
        })
    }
}
