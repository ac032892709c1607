//! Fixed-window rate limiting
//!
//! Counters live in the same store as the keys so that every process
//! sharing the store shares the limit. Windows are aligned to the epoch:
//! `window_start = floor(now_ms / 60_000) * 60_000`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::api_key::{ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

/// Window width in milliseconds (one minute)
pub const WINDOW_MILLIS: i64 = 60_000;

/// Start of the window containing `now`, in epoch milliseconds
pub fn window_start(now: DateTime<Utc>) -> i64 {
    now.timestamp_millis().div_euclid(WINDOW_MILLIS) * WINDOW_MILLIS
}

/// Store-backed fixed-window rate limiter
#[derive(Debug)]
pub struct RateLimiter<R> {
    repository: Arc<R>,
}

impl<R> Clone for RateLimiter<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R> RateLimiter<R>
where
    R: ApiKeyRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Whether a request for this key is allowed at `now`.
    ///
    /// A key without a cap never touches the store. The count-and-check
    /// happens atomically inside the repository, so concurrent callers
    /// can never push a window past its limit.
    pub async fn allow(
        &self,
        key_id: &ApiKeyId,
        limit: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let Some(limit) = limit else {
            return Ok(true);
        };

        let window = window_start(now);

        // Housekeeping: drop everything older than the previous window.
        // Purely advisory, a failure here must not deny the request.
        if let Err(error) = self
            .repository
            .rate_counter_purge_before(window - WINDOW_MILLIS)
            .await
        {
            warn!(%error, "rate window purge failed");
        }

        let count = self
            .repository
            .rate_counter_increment(key_id, window, limit)
            .await?;

        Ok(count.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;
    use chrono::{Duration, TimeZone};

    fn limiter() -> RateLimiter<InMemoryApiKeyRepository> {
        RateLimiter::new(Arc::new(InMemoryApiKeyRepository::new()))
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 30).unwrap()
    }

    #[test]
    fn test_window_start_alignment() {
        let now = fixed_now();
        let start = window_start(now);

        assert_eq!(start % WINDOW_MILLIS, 0);
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
    }

    #[test]
    fn test_same_minute_shares_a_window() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(
            window_start(base),
            window_start(base + Duration::seconds(59))
        );
        assert_ne!(
            window_start(base),
            window_start(base + Duration::seconds(60))
        );
    }

    #[tokio::test]
    async fn test_limit_enforced_within_window() {
        let limiter = limiter();
        let id = ApiKeyId::new("key-1");
        let now = fixed_now();

        for _ in 0..3 {
            assert!(limiter.allow(&id, Some(3), now).await.unwrap());
        }
        assert!(!limiter.allow(&id, Some(3), now).await.unwrap());
        // Still denied; the failed attempt did not consume anything
        assert!(!limiter.allow(&id, Some(3), now).await.unwrap());
    }

    #[tokio::test]
    async fn test_new_window_resets_the_count() {
        let limiter = limiter();
        let id = ApiKeyId::new("key-1");
        let now = fixed_now();

        assert!(limiter.allow(&id, Some(1), now).await.unwrap());
        assert!(!limiter.allow(&id, Some(1), now).await.unwrap());

        let next_minute = now + Duration::seconds(60);
        assert!(limiter.allow(&id, Some(1), next_minute).await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_have_independent_windows() {
        let limiter = limiter();
        let now = fixed_now();

        assert!(limiter
            .allow(&ApiKeyId::new("key-1"), Some(1), now)
            .await
            .unwrap());
        assert!(limiter
            .allow(&ApiKeyId::new("key-2"), Some(1), now)
            .await
            .unwrap());
        assert!(!limiter
            .allow(&ApiKeyId::new("key-1"), Some(1), now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_no_cap_always_allows() {
        let limiter = limiter();
        let id = ApiKeyId::new("key-1");
        let now = fixed_now();

        for _ in 0..200 {
            assert!(limiter.allow(&id, None, now).await.unwrap());
        }
    }
}
