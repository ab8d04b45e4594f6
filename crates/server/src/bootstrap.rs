use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use opsforce_agent::llm::{CompletionGateway, GatewayError, HttpCompletionGateway};
use opsforce_agent::{
    AlertDispatcher, EscalationService, ReactionEngine, ReactionEngineConfig, WorkforceRuntime,
};
use opsforce_core::config::{AppConfig, ConfigError, LoadOptions};
use opsforce_core::directory::AdminDirectory;
use opsforce_core::registry::PersonaRegistry;
use opsforce_db::repositories::{
    ReflectionRepository, SqlConversationLogRepository, SqlIncidentRepository,
    SqlRateLimitRepository, SqlReflectionRepository,
};
use opsforce_db::{connect_with_settings, migrations, DbPool};
use opsforce_slack::relay::{HttpSlackRelay, NoopRelay, OperatorRelay};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: WorkforceRuntime,
    pub dispatcher: AlertDispatcher,
    pub escalation: EscalationService,
    pub relay_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("completion gateway setup failed: {0}")]
    Gateway(#[source] GatewayError),
    #[error("relay setup failed: {0}")]
    Relay(#[source] opsforce_slack::relay::RelayError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let registry = Arc::new(PersonaRegistry::builtin());
    let directory = AdminDirectory::new(
        config.workforce.admins.clone(),
        config.workforce.duty_roster.clone(),
    );

    let (relay, relay_mode): (Arc<dyn OperatorRelay>, &'static str) = if config.relay.enabled {
        let relay = HttpSlackRelay::from_config(&config.relay).map_err(BootstrapError::Relay)?;
        (Arc::new(relay), "slack")
    } else {
        (Arc::new(NoopRelay), "noop")
    };

    let gateway: Arc<dyn CompletionGateway> = Arc::new(
        HttpCompletionGateway::from_config(&config.llm).map_err(BootstrapError::Gateway)?,
    );

    let reflections: Arc<dyn ReflectionRepository> =
        Arc::new(SqlReflectionRepository::new(db_pool.clone()));

    let engine = ReactionEngine::new(
        gateway,
        Arc::clone(&registry),
        ReactionEngineConfig {
            max_reply_tokens: config.llm.max_reply_tokens,
            reply_timeout: Duration::from_secs(config.llm.timeout_secs),
            reflection_context_entries: config.workforce.reflection_context_entries,
        },
    )
    .with_reflections(Arc::clone(&reflections));

    let runtime =
        WorkforceRuntime::new(Arc::clone(&registry), engine).with_journal(reflections);

    let dispatcher = AlertDispatcher::new(
        Arc::new(SqlConversationLogRepository::new(db_pool.clone())),
        Arc::clone(&relay),
        Arc::clone(&registry),
        directory.clone(),
    );

    let escalation = EscalationService::new(
        Arc::new(SqlIncidentRepository::new(db_pool.clone())),
        Arc::new(SqlRateLimitRepository::new(db_pool.clone())),
        relay,
        directory,
    );

    Ok(Application { config, db_pool, runtime, dispatcher, escalation, relay_mode })
}

#[cfg(test)]
mod tests {
    use opsforce_core::config::{ConfigOverrides, LoadOptions};
    use opsforce_core::domain::incident::{IncidentStatus, IncidentType};
    use opsforce_core::domain::persona::AgentId;

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                admins: Some(vec!["U-founder".to_string()]),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_relay_config() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                relay_enabled: Some(true),
                relay_bot_token: Some("invalid-token".to_string()),
                relay_channel: Some("#ops".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("relay.bot_token"));
    }

    #[tokio::test]
    async fn integration_smoke_covers_startup_routing_and_escalation_checkpoints() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        assert_eq!(app.relay_mode, "noop");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN \
             ('conversation_log', 'security_incident', 'rate_limit', 'reflection_entry')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected foundation tables to be available after bootstrap");
        assert_eq!(table_count, 4, "bootstrap should expose baseline workforce tables");

        let selected =
            app.runtime.select_relevant_agents("chase this lead and check for security threats");
        assert!(selected.contains(&AgentId::Sales));
        assert!(selected.contains(&AgentId::SecurityGuard));

        for _ in 0..2 {
            app.escalation.record_detection("U-900", IncidentType::PromptInjection).await;
        }
        let report =
            app.escalation.record_detection("U-900", IncidentType::PromptInjection).await;
        let incident = report.incident.expect("incident recorded");
        assert_eq!(incident.status, IncidentStatus::Blocked);
        assert_eq!(incident.action_taken, "blocked_30min");

        app.db_pool.close().await;
    }
}
