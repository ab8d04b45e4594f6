use async_trait::async_trait;
use thiserror::Error;

use opsforce_core::domain::alert::{ConversationEntry, ConversationEntryId};
use opsforce_core::domain::incident::{IncidentType, SecurityIncident};
use opsforce_core::domain::persona::AgentId;
use opsforce_core::domain::rate_limit::RateLimitRecord;
use opsforce_core::domain::reflection::ReflectionEntry;

pub mod conversation;
pub mod incident;
pub mod memory;
pub mod rate_limit;
pub mod reflection;

pub use conversation::SqlConversationLogRepository;
pub use incident::SqlIncidentRepository;
pub use memory::{
    InMemoryConversationLogRepository, InMemoryIncidentRepository, InMemoryRateLimitRepository,
    InMemoryReflectionRepository,
};
pub use rate_limit::SqlRateLimitRepository;
pub use reflection::SqlReflectionRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("no conversation entry with id `{0}`")]
    MissingEntry(String),
}

/// Per-recipient alert inbox. Rows append on dispatch; only the approval
/// flag mutates afterwards.
#[async_trait]
pub trait ConversationLogRepository: Send + Sync {
    async fn append(&self, entry: ConversationEntry) -> Result<(), RepositoryError>;

    async fn find_by_id(
        &self,
        id: &ConversationEntryId,
    ) -> Result<Option<ConversationEntry>, RepositoryError>;

    async fn list_recent_for_recipient(
        &self,
        recipient: &str,
        limit: u32,
    ) -> Result<Vec<ConversationEntry>, RepositoryError>;

    async fn set_approval(
        &self,
        id: &ConversationEntryId,
        approved: bool,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait IncidentRepository: Send + Sync {
    /// Most recent incident for the pair whose status is not resolved.
    async fn find_open(
        &self,
        user_id: &str,
        incident_type: IncidentType,
    ) -> Result<Option<SecurityIncident>, RepositoryError>;

    async fn save(&self, incident: SecurityIncident) -> Result<(), RepositoryError>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SecurityIncident>, RepositoryError>;
}

#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    async fn upsert(&self, record: RateLimitRecord) -> Result<(), RepositoryError>;

    async fn find(
        &self,
        user_id: &str,
        endpoint: &str,
    ) -> Result<Option<RateLimitRecord>, RepositoryError>;
}

/// Append-only journal; there is deliberately no update or delete surface.
#[async_trait]
pub trait ReflectionRepository: Send + Sync {
    async fn append(&self, entry: ReflectionEntry) -> Result<(), RepositoryError>;

    async fn recent_for_employee(
        &self,
        employee_id: AgentId,
        limit: u32,
    ) -> Result<Vec<ReflectionEntry>, RepositoryError>;
}
