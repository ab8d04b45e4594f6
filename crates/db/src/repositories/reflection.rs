use chrono::{DateTime, Utc};
use sqlx::Row;

use opsforce_core::domain::persona::AgentId;
use opsforce_core::domain::reflection::{ReflectionEntry, ReflectionId};

use super::{ReflectionRepository, RepositoryError};
use crate::DbPool;

pub struct SqlReflectionRepository {
    pool: DbPool,
}

impl SqlReflectionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<ReflectionEntry, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let employee_id_str: String =
        row.try_get("employee_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let action_ref: String =
        row.try_get("action_ref").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let reasoning: String =
        row.try_get("reasoning").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let expected_outcome: String =
        row.try_get("expected_outcome").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let confidence: f64 =
        row.try_get("confidence").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let what_would_change_mind: String = row
        .try_get("what_would_change_mind")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let recorded_at_str: String =
        row.try_get("recorded_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let employee_id = AgentId::parse(&employee_id_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown agent id `{employee_id_str}`")))?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(ReflectionEntry {
        id: ReflectionId(id),
        employee_id,
        action_ref,
        reasoning,
        expected_outcome,
        confidence,
        what_would_change_mind,
        recorded_at,
    })
}

#[async_trait::async_trait]
impl ReflectionRepository for SqlReflectionRepository {
    async fn append(&self, entry: ReflectionEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO reflection_entry (id, employee_id, action_ref, reasoning,
                                           expected_outcome, confidence, what_would_change_mind,
                                           recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id.0)
        .bind(entry.employee_id.as_str())
        .bind(&entry.action_ref)
        .bind(&entry.reasoning)
        .bind(&entry.expected_outcome)
        .bind(entry.confidence)
        .bind(&entry.what_would_change_mind)
        .bind(entry.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_for_employee(
        &self,
        employee_id: AgentId,
        limit: u32,
    ) -> Result<Vec<ReflectionEntry>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, employee_id, action_ref, reasoning, expected_outcome, confidence,
                    what_would_change_mind, recorded_at
             FROM reflection_entry
             WHERE employee_id = ?
             ORDER BY recorded_at DESC
             LIMIT ?",
        )
        .bind(employee_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()
    }
}
