use chrono::{DateTime, Utc};
use sqlx::Row;

use opsforce_core::domain::alert::{AlertPriority, ConversationEntry, ConversationEntryId};
use opsforce_core::domain::persona::AgentId;

use super::{ConversationLogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlConversationLogRepository {
    pool: DbPool,
}

impl SqlConversationLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationEntry, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let recipient: String =
        row.try_get("recipient").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let employee_id_str: String =
        row.try_get("employee_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let priority_str: String =
        row.try_get("priority").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let body: String = row.try_get("body").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let payload_str: String =
        row.try_get("payload").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let approved: Option<bool> =
        row.try_get("approved").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let employee_id = AgentId::parse(&employee_id_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown agent id `{employee_id_str}`")))?;
    let priority = AlertPriority::parse(&priority_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown priority `{priority_str}`")))?;
    let payload = serde_json::from_str(&payload_str)
        .map_err(|e| RepositoryError::Decode(format!("payload is not valid JSON: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(ConversationEntry {
        id: ConversationEntryId(id),
        recipient,
        employee_id,
        priority,
        body,
        payload,
        approved,
        created_at,
    })
}

#[async_trait::async_trait]
impl ConversationLogRepository for SqlConversationLogRepository {
    async fn append(&self, entry: ConversationEntry) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(&entry.payload)
            .map_err(|e| RepositoryError::Decode(format!("payload serialization failed: {e}")))?;

        sqlx::query(
            "INSERT INTO conversation_log (id, recipient, employee_id, priority, body, payload,
                                           approved, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id.0)
        .bind(&entry.recipient)
        .bind(entry.employee_id.as_str())
        .bind(entry.priority.as_str())
        .bind(&entry.body)
        .bind(&payload)
        .bind(entry.approved)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ConversationEntryId,
    ) -> Result<Option<ConversationEntry>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, recipient, employee_id, priority, body, payload, approved, created_at
             FROM conversation_log WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_entry(r)?)),
            None => Ok(None),
        }
    }

    async fn list_recent_for_recipient(
        &self,
        recipient: &str,
        limit: u32,
    ) -> Result<Vec<ConversationEntry>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, recipient, employee_id, priority, body, payload, approved, created_at
             FROM conversation_log
             WHERE recipient = ?
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(recipient)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()
    }

    async fn set_approval(
        &self,
        id: &ConversationEntryId,
        approved: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE conversation_log SET approved = ? WHERE id = ?")
            .bind(approved)
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::MissingEntry(id.0.clone()));
        }

        Ok(())
    }
}
