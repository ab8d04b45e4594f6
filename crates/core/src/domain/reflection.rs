use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::persona::AgentId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionId(pub String);

impl ReflectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// One autonomous decision's audit record: why it was made, what was
/// expected, and what evidence would falsify it. Immutable once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub id: ReflectionId,
    pub employee_id: AgentId,
    pub action_ref: String,
    pub reasoning: String,
    pub expected_outcome: String,
    pub confidence: f64,
    pub what_would_change_mind: String,
    pub recorded_at: DateTime<Utc>,
}

impl ReflectionEntry {
    pub fn new(
        employee_id: AgentId,
        action_ref: impl Into<String>,
        reasoning: impl Into<String>,
        expected_outcome: impl Into<String>,
        confidence: f64,
        what_would_change_mind: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if !(0.0..=1.0).contains(&confidence) || confidence.is_nan() {
            return Err(DomainError::InvalidConfidence(confidence));
        }

        Ok(Self {
            id: ReflectionId::generate(),
            employee_id,
            action_ref: action_ref.into(),
            reasoning: reasoning.into(),
            expected_outcome: expected_outcome.into(),
            confidence,
            what_would_change_mind: what_would_change_mind.into(),
            recorded_at: Utc::now(),
        })
    }
}
