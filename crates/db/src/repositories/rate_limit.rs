use chrono::{DateTime, Utc};
use sqlx::Row;

use opsforce_core::domain::rate_limit::RateLimitRecord;

use super::{RateLimitRepository, RepositoryError};
use crate::DbPool;

pub struct SqlRateLimitRepository {
    pool: DbPool,
}

impl SqlRateLimitRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<RateLimitRecord, RepositoryError> {
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let endpoint: String =
        row.try_get("endpoint").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let blocked_until_str: Option<String> =
        row.try_get("blocked_until").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let blocked_until = blocked_until_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(RateLimitRecord { user_id, endpoint, blocked_until, updated_at })
}

#[async_trait::async_trait]
impl RateLimitRepository for SqlRateLimitRepository {
    async fn upsert(&self, record: RateLimitRecord) -> Result<(), RepositoryError> {
        let blocked_until_str = record.blocked_until.map(|dt| dt.to_rfc3339());

        sqlx::query(
            "INSERT INTO rate_limit (user_id, endpoint, blocked_until, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, endpoint) DO UPDATE SET
                 blocked_until = excluded.blocked_until,
                 updated_at = excluded.updated_at",
        )
        .bind(&record.user_id)
        .bind(&record.endpoint)
        .bind(&blocked_until_str)
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(
        &self,
        user_id: &str,
        endpoint: &str,
    ) -> Result<Option<RateLimitRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, endpoint, blocked_until, updated_at
             FROM rate_limit WHERE user_id = ? AND endpoint = ?",
        )
        .bind(user_id)
        .bind(endpoint)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use opsforce_core::domain::rate_limit::RateLimitRecord;

    use super::SqlRateLimitRepository;
    use crate::repositories::RateLimitRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn upsert_and_find_round_trips() {
        let pool = setup().await;
        let repo = SqlRateLimitRepository::new(pool);
        let now = Utc::now();

        repo.upsert(RateLimitRecord {
            user_id: "U-900".to_string(),
            endpoint: "workforce.chat".to_string(),
            blocked_until: Some(now + Duration::minutes(30)),
            updated_at: now,
        })
        .await
        .expect("upsert");

        let found = repo
            .find("U-900", "workforce.chat")
            .await
            .expect("find")
            .expect("record exists");
        assert!(found.is_blocked(now));

        let missing = repo.find("U-900", "workforce.reports").await.expect("find");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_the_block_window_for_the_same_key() {
        let pool = setup().await;
        let repo = SqlRateLimitRepository::new(pool);
        let now = Utc::now();

        repo.upsert(RateLimitRecord {
            user_id: "U-900".to_string(),
            endpoint: "workforce.chat".to_string(),
            blocked_until: Some(now + Duration::minutes(30)),
            updated_at: now,
        })
        .await
        .expect("first upsert");

        repo.upsert(RateLimitRecord {
            user_id: "U-900".to_string(),
            endpoint: "workforce.chat".to_string(),
            blocked_until: Some(now + Duration::hours(24)),
            updated_at: now,
        })
        .await
        .expect("second upsert");

        let found = repo
            .find("U-900", "workforce.chat")
            .await
            .expect("find")
            .expect("record exists");
        let until = found.blocked_until.expect("window set");
        assert!(until - now > Duration::hours(23));
    }
}
