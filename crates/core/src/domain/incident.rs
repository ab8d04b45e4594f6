use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentId(pub String);

impl IncidentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Abuse/threat signal categories the escalation machine tracks. One open
/// incident exists per (user, incident type) at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    PromptInjection,
    AbusiveLanguage,
    UnauthorizedAccess,
    Spam,
    DataExfiltration,
}

impl IncidentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PromptInjection => "prompt_injection",
            Self::AbusiveLanguage => "abusive_language",
            Self::UnauthorizedAccess => "unauthorized_access",
            Self::Spam => "spam",
            Self::DataExfiltration => "data_exfiltration",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prompt_injection" => Some(Self::PromptInjection),
            "abusive_language" => Some(Self::AbusiveLanguage),
            "unauthorized_access" => Some(Self::UnauthorizedAccess),
            "spam" => Some(Self::Spam),
            "data_exfiltration" => Some(Self::DataExfiltration),
            _ => None,
        }
    }
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Detected,
    Warned,
    Blocked,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::Warned => "warned",
            Self::Blocked => "blocked",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "detected" => Some(Self::Detected),
            "warned" => Some(Self::Warned),
            "blocked" => Some(Self::Blocked),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

/// Strike record for one offender and one incident type. Rows are historical:
/// they are created on first detection, mutated on repeat offenses, and left
/// in place once resolved or expired.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityIncident {
    pub id: IncidentId,
    pub user_id: String,
    pub incident_type: IncidentType,
    pub strike_count: u32,
    pub status: IncidentStatus,
    pub action_taken: String,
    pub blocked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecurityIncident {
    /// An incident whose block window has elapsed no longer gates the user;
    /// the next detection opens a fresh row.
    pub fn block_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, IncidentStatus::Blocked)
            && self.blocked_until.map(|until| until <= now).unwrap_or(false)
    }
}
