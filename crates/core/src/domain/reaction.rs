use serde::{Deserialize, Serialize};

use super::persona::AgentId;

/// Output of one successful persona completion. Failed completions never
/// produce a partially populated result; they simply do not appear.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionResult {
    pub agent_id: AgentId,
    pub text: String,
}

impl ReactionResult {
    pub fn new(agent_id: AgentId, text: impl Into<String>) -> Self {
        Self { agent_id, text: text.into() }
    }
}
