use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Enforcement record consumed by the request-gating layer. The escalation
/// machine decides policy and writes these; it never enforces them itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub user_id: String,
    pub endpoint: String,
    pub blocked_until: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RateLimitRecord {
    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.map(|until| until > now).unwrap_or(false)
    }
}
