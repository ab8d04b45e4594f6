use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use opsforce_core::directory::AdminDirectory;
use opsforce_core::domain::alert::{AlertMessage, ConversationEntry, ConversationEntryId};
use opsforce_core::errors::{ApplicationError, DomainError};
use opsforce_core::registry::PersonaRegistry;
use opsforce_db::repositories::{ConversationLogRepository, RepositoryError};
use opsforce_slack::blocks;
use opsforce_slack::relay::OperatorRelay;

/// Fans one alert out to every admin recipient's conversation log and
/// mirrors a single summary to the operator relay. Fire-and-forget: no
/// failure ever reaches the caller's control flow; everything funnels
/// through the log.
pub struct AlertDispatcher {
    log: Arc<dyn ConversationLogRepository>,
    relay: Arc<dyn OperatorRelay>,
    registry: Arc<PersonaRegistry>,
    directory: AdminDirectory,
}

impl AlertDispatcher {
    pub fn new(
        log: Arc<dyn ConversationLogRepository>,
        relay: Arc<dyn OperatorRelay>,
        registry: Arc<PersonaRegistry>,
        directory: AdminDirectory,
    ) -> Self {
        Self { log, relay, registry, directory }
    }

    pub async fn notify(&self, alert: AlertMessage) {
        let profile = self.registry.profile(alert.employee_id);
        let body = format!(
            "{glyph} {name}: {message}",
            glyph = alert.priority.glyph(),
            name = profile.display_name,
            message = alert.message,
        );
        let payload = json!({
            "agent_id": alert.employee_id.as_str(),
            "agent_name": profile.display_name,
            "success": true,
            "needs_approval": alert.needs_approval,
            "details": alert.details,
        });

        for recipient in self.directory.recipients() {
            let entry = ConversationEntry {
                id: ConversationEntryId::generate(),
                recipient: recipient.clone(),
                employee_id: alert.employee_id,
                priority: alert.priority,
                body: body.clone(),
                payload: payload.clone(),
                approved: None,
                created_at: chrono::Utc::now(),
            };

            if let Err(error) = self.log.append(entry).await {
                warn!(
                    event_name = "workforce.alert.log_write_failed",
                    agent = %alert.employee_id,
                    recipient = %recipient,
                    error = %error,
                    "conversation log write failed; alert copy lost"
                );
            }
        }

        // One broadcast for the whole alert; the relay is a shared channel,
        // not a per-recipient inbox.
        let card = blocks::alert_card(&alert, profile);
        if let Err(error) = self.relay.broadcast(card).await {
            warn!(
                event_name = "workforce.alert.relay_failed",
                agent = %alert.employee_id,
                error = %error,
                "operator relay broadcast failed; alert remains in the log"
            );
        }

        info!(
            event_name = "workforce.alert.dispatched",
            agent = %alert.employee_id,
            priority = alert.priority.as_str(),
            recipients = self.directory.recipients().len(),
            "alert dispatched"
        );
    }

    /// Approval mutates one recipient copy. Admin-only: everyone else gets
    /// an explicit rejection rather than a silent drop.
    pub async fn approve_alert(
        &self,
        entry_id: &ConversationEntryId,
        actor: &str,
        approved: bool,
    ) -> Result<(), ApplicationError> {
        if !self.directory.is_admin(actor) {
            return Err(ApplicationError::Domain(DomainError::NotAuthorized {
                actor: actor.to_string(),
                action: "alert.approve".to_string(),
            }));
        }

        self.log.set_approval(entry_id, approved).await.map_err(|error| match error {
            RepositoryError::MissingEntry(id) => ApplicationError::Domain(
                DomainError::InvariantViolation(format!("no conversation entry with id `{id}`")),
            ),
            other => ApplicationError::Persistence(other.to_string()),
        })
    }
}
