use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::persona::AgentId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Info,
    Warning,
    Critical,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Warning => "⚠️",
            Self::Critical => "🚨",
        }
    }
}

/// A proactive notification raised by an agent, before fan-out. Dispatch
/// produces one independently mutable `ConversationEntry` per admin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub employee_id: AgentId,
    pub priority: AlertPriority,
    pub message: String,
    pub needs_approval: bool,
    pub details: Option<Value>,
}

impl AlertMessage {
    pub fn new(employee_id: AgentId, priority: AlertPriority, message: impl Into<String>) -> Self {
        Self { employee_id, priority, message: message.into(), needs_approval: false, details: None }
    }

    pub fn needs_approval(mut self) -> Self {
        self.needs_approval = true;
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntryId(pub String);

impl ConversationEntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// One recipient's copy of a dispatched alert in the conversation log.
/// The prose body and the machine-readable payload carry the same content
/// so a consuming UI can render either form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: ConversationEntryId,
    pub recipient: String,
    pub employee_id: AgentId,
    pub priority: AlertPriority,
    pub body: String,
    pub payload: Value,
    pub approved: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AgentId, AlertMessage, AlertPriority};

    #[test]
    fn priority_round_trips_through_string_form() {
        for priority in [AlertPriority::Info, AlertPriority::Warning, AlertPriority::Critical] {
            assert_eq!(AlertPriority::parse(priority.as_str()), Some(priority));
        }
        assert_eq!(AlertPriority::parse("urgent"), None);
    }

    #[test]
    fn builder_defaults_to_no_approval_and_no_details() {
        let alert = AlertMessage::new(AgentId::Sales, AlertPriority::Info, "pipeline update");
        assert!(!alert.needs_approval);
        assert!(alert.details.is_none());

        let gated = AlertMessage::new(AgentId::Legal, AlertPriority::Warning, "contract risk")
            .needs_approval()
            .with_details(json!({"contract": "acme-msa"}));
        assert!(gated.needs_approval);
        assert_eq!(gated.details.expect("details set")["contract"], "acme-msa");
    }
}
