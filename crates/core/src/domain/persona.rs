use serde::{Deserialize, Serialize};

/// Closed roster of virtual employees. Declaration order is the routing
/// tie-break order, so new agents belong at the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    ChiefOfStaff,
    Sales,
    SecurityGuard,
    Marketing,
    Legal,
    Investigator,
    FollowUp,
    Finance,
}

impl AgentId {
    pub const ALL: [AgentId; 8] = [
        AgentId::ChiefOfStaff,
        AgentId::Sales,
        AgentId::SecurityGuard,
        AgentId::Marketing,
        AgentId::Legal,
        AgentId::Investigator,
        AgentId::FollowUp,
        AgentId::Finance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChiefOfStaff => "chief_of_staff",
            Self::Sales => "sales",
            Self::SecurityGuard => "security_guard",
            Self::Marketing => "marketing",
            Self::Legal => "legal",
            Self::Investigator => "investigator",
            Self::FollowUp => "follow_up",
            Self::Finance => "finance",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "chief_of_staff" => Some(Self::ChiefOfStaff),
            "sales" => Some(Self::Sales),
            "security_guard" => Some(Self::SecurityGuard),
            "marketing" => Some(Self::Marketing),
            "legal" => Some(Self::Legal),
            "investigator" => Some(Self::Investigator),
            "follow_up" => Some(Self::FollowUp),
            "finance" => Some(Self::Finance),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable persona definition. Built once at startup by the registry;
/// every other component borrows it from there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub id: AgentId,
    pub display_name: String,
    pub emoji: String,
    pub tone_rules: Vec<String>,
    pub core_motivation: String,
    pub uncertainty_rule: String,
    pub disagreement_protocol: String,
}
