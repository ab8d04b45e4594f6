use chrono::{DateTime, Utc};
use sqlx::Row;

use opsforce_core::domain::incident::{
    IncidentId, IncidentStatus, IncidentType, SecurityIncident,
};

use super::{IncidentRepository, RepositoryError};
use crate::DbPool;

pub struct SqlIncidentRepository {
    pool: DbPool,
}

impl SqlIncidentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_incident(row: &sqlx::sqlite::SqliteRow) -> Result<SecurityIncident, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let incident_type_str: String =
        row.try_get("incident_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let strike_count: i64 =
        row.try_get("strike_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let action_taken: String =
        row.try_get("action_taken").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let blocked_until_str: Option<String> =
        row.try_get("blocked_until").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let incident_type = IncidentType::parse(&incident_type_str).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown incident type `{incident_type_str}`"))
    })?;
    let status = IncidentStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown incident status `{status_str}`")))?;

    let blocked_until = blocked_until_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(SecurityIncident {
        id: IncidentId(id),
        user_id,
        incident_type,
        strike_count: strike_count.max(0) as u32,
        status,
        action_taken,
        blocked_until,
        created_at,
        updated_at,
    })
}

#[async_trait::async_trait]
impl IncidentRepository for SqlIncidentRepository {
    async fn find_open(
        &self,
        user_id: &str,
        incident_type: IncidentType,
    ) -> Result<Option<SecurityIncident>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, incident_type, strike_count, status, action_taken,
                    blocked_until, created_at, updated_at
             FROM security_incident
             WHERE user_id = ? AND incident_type = ? AND status != 'resolved'
             ORDER BY updated_at DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(incident_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_incident(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, incident: SecurityIncident) -> Result<(), RepositoryError> {
        let blocked_until_str = incident.blocked_until.map(|dt| dt.to_rfc3339());

        sqlx::query(
            "INSERT INTO security_incident (id, user_id, incident_type, strike_count, status,
                                            action_taken, blocked_until, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 strike_count = excluded.strike_count,
                 status = excluded.status,
                 action_taken = excluded.action_taken,
                 blocked_until = excluded.blocked_until,
                 updated_at = excluded.updated_at",
        )
        .bind(&incident.id.0)
        .bind(&incident.user_id)
        .bind(incident.incident_type.as_str())
        .bind(incident.strike_count as i64)
        .bind(incident.status.as_str())
        .bind(&incident.action_taken)
        .bind(&blocked_until_str)
        .bind(incident.created_at.to_rfc3339())
        .bind(incident.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SecurityIncident>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, user_id, incident_type, strike_count, status, action_taken,
                    blocked_until, created_at, updated_at
             FROM security_incident
             WHERE user_id = ?
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_incident).collect::<Result<Vec<_>, _>>()
    }
}
