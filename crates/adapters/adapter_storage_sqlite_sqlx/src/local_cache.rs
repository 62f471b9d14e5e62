//! `SQLite` implementation of [`LocalCache`].

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use sprinkler_app::ports::LocalCache;
use sprinkler_domain::error::SprinklerError;
use sprinkler_domain::relay::RelayId;
use sprinkler_domain::time::Timestamp;

use crate::error::StorageError;

const LAST_DURATION_KEY: &str = "last_duration_minutes";

const SELECT_PREFERENCE: &str = "SELECT value FROM preferences WHERE key = ?";
const UPSERT_PREFERENCE: &str = "INSERT INTO preferences (key, value) VALUES (?, ?) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";
const SELECT_EXPIRIES: &str = "SELECT relay_id, expires_at FROM relay_expiries ORDER BY relay_id";
const UPSERT_EXPIRY: &str = "INSERT INTO relay_expiries (relay_id, expires_at) VALUES (?, ?) \
     ON CONFLICT(relay_id) DO UPDATE SET expires_at = excluded.expires_at";
const DELETE_EXPIRY: &str = "DELETE FROM relay_expiries WHERE relay_id = ?";

/// `SQLite`-backed local cache.
#[derive(Clone)]
pub struct SqliteLocalCache {
    pool: SqlitePool,
}

impl SqliteLocalCache {
    /// Create a new cache using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_expiry(relay_id: i64, expires_at: &str) -> Result<(RelayId, Timestamp), StorageError> {
    let relay = u8::try_from(relay_id)
        .ok()
        .and_then(|raw| RelayId::new(raw).ok())
        .ok_or_else(|| StorageError::Corrupt {
            column: "relay_id",
            value: relay_id.to_string(),
        })?;
    let expires_at = DateTime::parse_from_rfc3339(expires_at)
        .map_err(|_| StorageError::Corrupt {
            column: "expires_at",
            value: expires_at.to_string(),
        })?
        .with_timezone(&Utc);
    Ok((relay, expires_at))
}

impl LocalCache for SqliteLocalCache {
    fn last_duration(&self) -> impl Future<Output = Result<Option<u32>, SprinklerError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<(String,)> = sqlx::query_as(SELECT_PREFERENCE)
                .bind(LAST_DURATION_KEY)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            // a garbled value falls back to the default duration
            Ok(row.and_then(|(value,)| value.parse().ok()))
        }
    }

    fn set_last_duration(
        &self,
        minutes: u32,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT_PREFERENCE)
                .bind(LAST_DURATION_KEY)
                .bind(minutes.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }

    fn expiries(
        &self,
    ) -> impl Future<Output = Result<Vec<(RelayId, Timestamp)>, SprinklerError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<(i64, String)> = sqlx::query_as(SELECT_EXPIRIES)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            let mut entries = Vec::with_capacity(rows.len());
            for (relay_id, expires_at) in rows {
                match parse_expiry(relay_id, &expires_at) {
                    Ok(entry) => entries.push(entry),
                    Err(err) => tracing::warn!(error = %err, "skipping unreadable relay expiry"),
                }
            }
            Ok(entries)
        }
    }

    fn set_expiry(
        &self,
        relay: RelayId,
        expires_at: Timestamp,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT_EXPIRY)
                .bind(i64::from(relay.get()))
                .bind(expires_at.to_rfc3339_opts(SecondsFormat::Millis, true))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }

    fn clear_expiry(
        &self,
        relay: RelayId,
    ) -> impl Future<Output = Result<(), SprinklerError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(DELETE_EXPIRY)
                .bind(i64::from(relay.get()))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use chrono::TimeDelta;
    use sprinkler_domain::time::now;

    async fn setup() -> SqliteLocalCache {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteLocalCache::new(db.pool().clone())
    }

    fn relay(raw: u8) -> RelayId {
        RelayId::new(raw).unwrap()
    }

    fn millis(ts: Timestamp) -> i64 {
        ts.timestamp_millis()
    }

    #[tokio::test]
    async fn should_have_no_last_duration_initially() {
        let cache = setup().await;
        assert_eq!(cache.last_duration().await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_overwrite_last_duration() {
        let cache = setup().await;
        cache.set_last_duration(10).await.unwrap();
        cache.set_last_duration(25).await.unwrap();
        assert_eq!(cache.last_duration().await.unwrap(), Some(25));
    }

    #[tokio::test]
    async fn should_store_and_list_expiries_by_relay() {
        let cache = setup().await;
        let t0 = now();
        cache
            .set_expiry(relay(3), t0 + TimeDelta::seconds(60))
            .await
            .unwrap();
        cache
            .set_expiry(relay(1), t0 + TimeDelta::seconds(300))
            .await
            .unwrap();

        let entries = cache.expiries().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, relay(1));
        assert_eq!(
            millis(entries[0].1),
            millis(t0 + TimeDelta::seconds(300))
        );
        assert_eq!(entries[1].0, relay(3));
    }

    #[tokio::test]
    async fn should_replace_expiry_of_same_relay() {
        let cache = setup().await;
        let t0 = now();
        cache.set_expiry(relay(2), t0).await.unwrap();
        cache
            .set_expiry(relay(2), t0 + TimeDelta::seconds(5))
            .await
            .unwrap();

        let entries = cache.expiries().await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(millis(entries[0].1), millis(t0 + TimeDelta::seconds(5)));
    }

    #[tokio::test]
    async fn should_clear_expiry_and_ignore_missing_entries() {
        let cache = setup().await;
        cache.set_expiry(relay(0), now()).await.unwrap();

        cache.clear_expiry(relay(0)).await.unwrap();
        cache.clear_expiry(relay(0)).await.unwrap();

        assert!(cache.expiries().await.unwrap().is_empty());
    }

    #[test]
    fn should_reject_unparsable_rows() {
        assert!(parse_expiry(9, "2026-01-01T00:00:00Z").is_err());
        assert!(parse_expiry(1, "yesterday").is_err());
        let (id, _) = parse_expiry(1, "2026-01-01T00:00:00.000Z").unwrap();
        assert_eq!(id, relay(1));
    }
}
