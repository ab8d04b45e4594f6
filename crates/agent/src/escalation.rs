use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use opsforce_core::directory::AdminDirectory;
use opsforce_core::domain::incident::{IncidentType, SecurityIncident};
use opsforce_core::domain::rate_limit::RateLimitRecord;
use opsforce_core::escalation::{EscalationDisposition, EscalationPolicy};
use opsforce_db::repositories::{IncidentRepository, RateLimitRepository};
use opsforce_slack::blocks;
use opsforce_slack::relay::OperatorRelay;

/// Rate-limit rows written by escalation all target the chat surface; the
/// request-gating layer keys its checks the same way.
pub const RATE_LIMIT_ENDPOINT: &str = "workforce.chat";

/// In-process view of one detection, returned even when the strike write
/// fails so the caller is never silently blind to the event.
#[derive(Clone, Debug, PartialEq)]
pub struct EscalationReport {
    pub disposition: EscalationDisposition,
    pub incident: Option<SecurityIncident>,
    pub persisted: bool,
}

/// Applies the strike policy and owns its side effects: incident upsert,
/// rate-limit write-through, and the operator notice on block transitions.
/// Detections for the same (user, incident type) are serialized behind a
/// keyed mutex so concurrent reports cannot under-count strikes.
pub struct EscalationService {
    policy: EscalationPolicy,
    incidents: Arc<dyn IncidentRepository>,
    rate_limits: Arc<dyn RateLimitRepository>,
    relay: Arc<dyn OperatorRelay>,
    directory: AdminDirectory,
    locks: Mutex<HashMap<(String, IncidentType), Arc<Mutex<()>>>>,
}

impl EscalationService {
    pub fn new(
        incidents: Arc<dyn IncidentRepository>,
        rate_limits: Arc<dyn RateLimitRepository>,
        relay: Arc<dyn OperatorRelay>,
        directory: AdminDirectory,
    ) -> Self {
        Self {
            policy: EscalationPolicy,
            incidents,
            rate_limits,
            relay,
            directory,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn record_detection(
        &self,
        user_id: &str,
        incident_type: IncidentType,
    ) -> EscalationReport {
        let lock = self.lock_for(user_id, incident_type).await;
        let _guard = lock.lock().await;

        let offender = self.directory.identify(user_id);
        let now = Utc::now();

        // A failed read degrades to "no prior incident": the strike ladder
        // may restart low, but the detection is still recorded.
        let prior = match self.incidents.find_open(user_id, incident_type).await {
            Ok(prior) => prior,
            Err(error) => {
                warn!(
                    event_name = "escalation.incident_read_failed",
                    user_id = %user_id,
                    incident_type = %incident_type,
                    error = %error,
                    "open-incident lookup failed; assessing without history"
                );
                None
            }
        };

        let outcome = self.policy.assess(prior.as_ref(), &offender, incident_type, now);

        let Some(incident) = outcome.incident.clone() else {
            info!(
                event_name = "escalation.stood_down",
                user_id = %user_id,
                incident_type = %incident_type,
                "offender holds an admin or duty role; stood down"
            );
            return EscalationReport {
                disposition: outcome.disposition,
                incident: None,
                persisted: false,
            };
        };

        let mut persisted = true;
        if let Err(error) = self.incidents.save(incident.clone()).await {
            persisted = false;
            warn!(
                event_name = "escalation.strike_write_failed",
                user_id = %user_id,
                incident_type = %incident_type,
                strike_count = incident.strike_count,
                error = %error,
                "strike write failed; next detection may re-read a stale count"
            );
        }

        let record = RateLimitRecord {
            user_id: user_id.to_string(),
            endpoint: RATE_LIMIT_ENDPOINT.to_string(),
            blocked_until: incident.blocked_until,
            updated_at: now,
        };
        if let Err(error) = self.rate_limits.upsert(record).await {
            warn!(
                event_name = "escalation.rate_limit_write_failed",
                user_id = %user_id,
                error = %error,
                "rate-limit write-through failed; gating layer will lag this transition"
            );
        }

        if outcome.notify_operator {
            if let Err(error) = self.relay.broadcast(blocks::block_notice(&incident)).await {
                warn!(
                    event_name = "escalation.relay_failed",
                    user_id = %user_id,
                    error = %error,
                    "block notice broadcast failed"
                );
            }
        }

        info!(
            event_name = "escalation.strike.recorded",
            user_id = %user_id,
            incident_type = %incident_type,
            strike_count = incident.strike_count,
            action = %incident.action_taken,
            persisted,
            "escalation transition applied"
        );

        EscalationReport { disposition: outcome.disposition, incident: Some(incident), persisted }
    }

    async fn lock_for(&self, user_id: &str, incident_type: IncidentType) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry((user_id.to_string(), incident_type))
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use opsforce_core::directory::AdminDirectory;
    use opsforce_core::domain::incident::{IncidentStatus, IncidentType};
    use opsforce_core::escalation::EscalationDisposition;
    use opsforce_db::repositories::{
        InMemoryIncidentRepository, InMemoryRateLimitRepository, IncidentRepository,
        RateLimitRepository,
    };
    use opsforce_slack::relay::InMemoryRelay;

    use super::{EscalationService, RATE_LIMIT_ENDPOINT};

    struct Harness {
        service: Arc<EscalationService>,
        incidents: Arc<InMemoryIncidentRepository>,
        rate_limits: Arc<InMemoryRateLimitRepository>,
        relay: Arc<InMemoryRelay>,
    }

    fn harness() -> Harness {
        let incidents = Arc::new(InMemoryIncidentRepository::default());
        let rate_limits = Arc::new(InMemoryRateLimitRepository::default());
        let relay = Arc::new(InMemoryRelay::default());
        let service = Arc::new(EscalationService::new(
            Arc::clone(&incidents) as Arc<dyn IncidentRepository>,
            Arc::clone(&rate_limits) as Arc<dyn RateLimitRepository>,
            Arc::clone(&relay) as Arc<dyn opsforce_slack::relay::OperatorRelay>,
            AdminDirectory::new(vec!["U-founder".to_string()], vec!["U-oncall".to_string()]),
        ));
        Harness { service, incidents, rate_limits, relay }
    }

    #[tokio::test]
    async fn five_detections_walk_the_full_ladder() {
        let harness = harness();

        for _ in 0..4 {
            harness.service.record_detection("U-900", IncidentType::PromptInjection).await;
        }
        let report =
            harness.service.record_detection("U-900", IncidentType::PromptInjection).await;

        let incident = report.incident.expect("incident recorded");
        assert_eq!(incident.strike_count, 5);
        assert_eq!(incident.status, IncidentStatus::Blocked);
        assert_eq!(incident.action_taken, "blocked_24h");
        assert!(report.persisted);

        let stored = harness
            .incidents
            .find_open("U-900", IncidentType::PromptInjection)
            .await
            .expect("find")
            .expect("stored incident");
        assert_eq!(stored.strike_count, 5);
    }

    #[tokio::test]
    async fn block_transitions_write_through_to_the_rate_limit_table() {
        let harness = harness();

        for _ in 0..3 {
            harness.service.record_detection("U-900", IncidentType::Spam).await;
        }

        let record = harness
            .rate_limits
            .find("U-900", RATE_LIMIT_ENDPOINT)
            .await
            .expect("find")
            .expect("record written");
        assert!(record.blocked_until.is_some());
    }

    #[tokio::test]
    async fn only_block_transitions_notify_the_operator() {
        let harness = harness();

        harness.service.record_detection("U-900", IncidentType::Spam).await;
        harness.service.record_detection("U-900", IncidentType::Spam).await;
        assert!(harness.relay.sent().await.is_empty(), "warnings stay quiet");

        harness.service.record_detection("U-900", IncidentType::Spam).await;
        assert_eq!(harness.relay.sent().await.len(), 1, "third strike broadcasts the block");
    }

    #[tokio::test]
    async fn admin_detections_are_stood_down_without_any_writes() {
        let harness = harness();

        let report =
            harness.service.record_detection("U-founder", IncidentType::AbusiveLanguage).await;

        assert_eq!(report.disposition, EscalationDisposition::StoodDown);
        assert!(report.incident.is_none());
        let stored = harness
            .incidents
            .find_open("U-founder", IncidentType::AbusiveLanguage)
            .await
            .expect("find");
        assert!(stored.is_none());
        assert!(harness.relay.sent().await.is_empty());
    }

    #[tokio::test]
    async fn duty_role_holders_are_also_exempt() {
        let harness = harness();
        let report = harness.service.record_detection("U-oncall", IncidentType::Spam).await;
        assert_eq!(report.disposition, EscalationDisposition::StoodDown);
    }

    #[tokio::test]
    async fn failed_strike_write_still_reports_the_incident() {
        let harness = harness();
        harness.incidents.fail_saves(true).await;

        let report =
            harness.service.record_detection("U-900", IncidentType::PromptInjection).await;

        assert!(!report.persisted);
        let incident = report.incident.expect("in-process incident still reported");
        assert_eq!(incident.strike_count, 1);
    }

    #[tokio::test]
    async fn concurrent_detections_for_the_same_pair_do_not_under_count() {
        let harness = harness();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let service = Arc::clone(&harness.service);
            handles.push(tokio::spawn(async move {
                service.record_detection("U-900", IncidentType::PromptInjection).await
            }));
        }
        for handle in handles {
            handle.await.expect("task completes");
        }

        let stored = harness
            .incidents
            .find_open("U-900", IncidentType::PromptInjection)
            .await
            .expect("find")
            .expect("stored incident");
        assert_eq!(stored.strike_count, 5, "serialized updates must count every detection");
        assert_eq!(stored.action_taken, "blocked_24h");
    }

    #[tokio::test]
    async fn different_incident_types_track_separate_ladders() {
        let harness = harness();

        harness.service.record_detection("U-900", IncidentType::Spam).await;
        harness.service.record_detection("U-900", IncidentType::PromptInjection).await;

        let spam = harness
            .incidents
            .find_open("U-900", IncidentType::Spam)
            .await
            .expect("find")
            .expect("spam incident");
        let injection = harness
            .incidents
            .find_open("U-900", IncidentType::PromptInjection)
            .await
            .expect("find")
            .expect("injection incident");
        assert_eq!(spam.strike_count, 1);
        assert_eq!(injection.strike_count, 1);
        assert_ne!(spam.id, injection.id);
    }
}
