use std::collections::HashMap;

use tokio::sync::RwLock;

use opsforce_core::domain::alert::{ConversationEntry, ConversationEntryId};
use opsforce_core::domain::incident::{IncidentType, SecurityIncident};
use opsforce_core::domain::persona::AgentId;
use opsforce_core::domain::rate_limit::RateLimitRecord;
use opsforce_core::domain::reflection::ReflectionEntry;

use super::{
    ConversationLogRepository, IncidentRepository, RateLimitRepository, ReflectionRepository,
    RepositoryError,
};

#[derive(Default)]
pub struct InMemoryConversationLogRepository {
    entries: RwLock<Vec<ConversationEntry>>,
}

impl InMemoryConversationLogRepository {
    pub async fn entries(&self) -> Vec<ConversationEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ConversationLogRepository for InMemoryConversationLogRepository {
    async fn append(&self, entry: ConversationEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ConversationEntryId,
    ) -> Result<Option<ConversationEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|entry| entry.id == *id).cloned())
    }

    async fn list_recent_for_recipient(
        &self,
        recipient: &str,
        limit: u32,
    ) -> Result<Vec<ConversationEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut matching: Vec<ConversationEntry> =
            entries.iter().filter(|entry| entry.recipient == recipient).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn set_approval(
        &self,
        id: &ConversationEntryId,
        approved: bool,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|entry| entry.id == *id) {
            Some(entry) => {
                entry.approved = Some(approved);
                Ok(())
            }
            None => Err(RepositoryError::MissingEntry(id.0.clone())),
        }
    }
}

#[derive(Default)]
pub struct InMemoryIncidentRepository {
    incidents: RwLock<HashMap<String, SecurityIncident>>,
    fail_saves: RwLock<bool>,
}

impl InMemoryIncidentRepository {
    /// Makes every subsequent save fail; exercises the best-effort
    /// persistence path in the escalation service.
    pub async fn fail_saves(&self, fail: bool) {
        *self.fail_saves.write().await = fail;
    }
}

#[async_trait::async_trait]
impl IncidentRepository for InMemoryIncidentRepository {
    async fn find_open(
        &self,
        user_id: &str,
        incident_type: IncidentType,
    ) -> Result<Option<SecurityIncident>, RepositoryError> {
        let incidents = self.incidents.read().await;
        let mut open: Vec<&SecurityIncident> = incidents
            .values()
            .filter(|incident| {
                incident.user_id == user_id
                    && incident.incident_type == incident_type
                    && incident.status.is_open()
            })
            .collect();
        open.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(open.first().map(|incident| (*incident).clone()))
    }

    async fn save(&self, incident: SecurityIncident) -> Result<(), RepositoryError> {
        if *self.fail_saves.read().await {
            return Err(RepositoryError::Decode("simulated write failure".to_string()));
        }
        let mut incidents = self.incidents.write().await;
        incidents.insert(incident.id.0.clone(), incident);
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SecurityIncident>, RepositoryError> {
        let incidents = self.incidents.read().await;
        let mut matching: Vec<SecurityIncident> = incidents
            .values()
            .filter(|incident| incident.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    records: RwLock<HashMap<(String, String), RateLimitRecord>>,
}

#[async_trait::async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn upsert(&self, record: RateLimitRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.insert((record.user_id.clone(), record.endpoint.clone()), record);
        Ok(())
    }

    async fn find(
        &self,
        user_id: &str,
        endpoint: &str,
    ) -> Result<Option<RateLimitRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.get(&(user_id.to_string(), endpoint.to_string())).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryReflectionRepository {
    entries: RwLock<Vec<ReflectionEntry>>,
}

impl InMemoryReflectionRepository {
    pub async fn entries(&self) -> Vec<ReflectionEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ReflectionRepository for InMemoryReflectionRepository {
    async fn append(&self, entry: ReflectionEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn recent_for_employee(
        &self,
        employee_id: AgentId,
        limit: u32,
    ) -> Result<Vec<ReflectionEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        let mut matching: Vec<ReflectionEntry> =
            entries.iter().filter(|entry| entry.employee_id == employee_id).cloned().collect();
        matching.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}
