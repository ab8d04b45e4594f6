use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::incident::{IncidentId, IncidentStatus, IncidentType, SecurityIncident};

/// Strikes at which blocking starts and at which it hardens. Fixed by
/// policy; deployments do not tune these.
pub const SHORT_BLOCK_THRESHOLD: u32 = 3;
pub const LONG_BLOCK_THRESHOLD: u32 = 5;

pub const SHORT_BLOCK_MINUTES: i64 = 30;
pub const LONG_BLOCK_HOURS: i64 = 24;

/// Who the offending user is, as seen by the duty roster. Administrators
/// and duty-role holders are never struck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenderIdentity {
    pub user_id: String,
    pub is_admin: bool,
    pub holds_duty_role: bool,
}

impl OffenderIdentity {
    pub fn regular(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), is_admin: false, holds_duty_role: false }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), is_admin: true, holds_duty_role: false }
    }

    pub fn exempt(&self) -> bool {
        self.is_admin || self.holds_duty_role
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationDisposition {
    /// Offender is exempt; nothing is recorded.
    StoodDown,
    /// A strike was recorded below the blocking thresholds.
    Warned,
    /// The strike crossed a blocking threshold.
    Blocked,
}

/// The decision for one detection: the incident row to persist (fresh or
/// mutated) plus what the caller must do about it. Pure data; persistence
/// and notification side effects belong to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscalationOutcome {
    pub disposition: EscalationDisposition,
    pub incident: Option<SecurityIncident>,
    /// Set on a block transition, and only on a block transition.
    pub notify_operator: bool,
}

/// Per-(user, incident-type) strike ladder:
/// strikes 1–2 warn, 3–4 block for 30 minutes, 5+ block for 24 hours.
/// An expired block ends the incident's enforcement life; the next
/// detection opens a fresh row and the old one stays as history.
#[derive(Clone, Copy, Debug, Default)]
pub struct EscalationPolicy;

impl EscalationPolicy {
    pub fn assess(
        &self,
        prior: Option<&SecurityIncident>,
        offender: &OffenderIdentity,
        incident_type: IncidentType,
        now: DateTime<Utc>,
    ) -> EscalationOutcome {
        if offender.exempt() {
            return EscalationOutcome {
                disposition: EscalationDisposition::StoodDown,
                incident: None,
                notify_operator: false,
            };
        }

        let continuing = prior.filter(|incident| !incident.block_expired(now));

        let (id, strike_count, created_at) = match continuing {
            Some(incident) => (incident.id.clone(), incident.strike_count + 1, incident.created_at),
            None => (IncidentId::generate(), 1, now),
        };

        let (status, action_taken, blocked_until) = ladder(strike_count, now);
        let disposition = match status {
            IncidentStatus::Blocked => EscalationDisposition::Blocked,
            _ => EscalationDisposition::Warned,
        };

        EscalationOutcome {
            disposition,
            notify_operator: disposition == EscalationDisposition::Blocked,
            incident: Some(SecurityIncident {
                id,
                user_id: offender.user_id.clone(),
                incident_type,
                strike_count,
                status,
                action_taken,
                blocked_until,
                created_at,
                updated_at: now,
            }),
        }
    }
}

fn ladder(strike_count: u32, now: DateTime<Utc>) -> (IncidentStatus, String, Option<DateTime<Utc>>) {
    if strike_count >= LONG_BLOCK_THRESHOLD {
        (
            IncidentStatus::Blocked,
            "blocked_24h".to_string(),
            Some(now + Duration::hours(LONG_BLOCK_HOURS)),
        )
    } else if strike_count >= SHORT_BLOCK_THRESHOLD {
        (
            IncidentStatus::Blocked,
            "blocked_30min".to_string(),
            Some(now + Duration::minutes(SHORT_BLOCK_MINUTES)),
        )
    } else {
        (IncidentStatus::Warned, format!("warning_{strike_count}"), None)
    }
}
