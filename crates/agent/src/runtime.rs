use std::sync::Arc;

use tracing::{debug, warn};

use opsforce_core::domain::company::CompanyState;
use opsforce_core::domain::persona::AgentId;
use opsforce_core::domain::reaction::ReactionResult;
use opsforce_core::domain::reflection::ReflectionEntry;
use opsforce_core::presenter::TonePresenter;
use opsforce_core::registry::PersonaRegistry;
use opsforce_core::routing::RelevanceRouter;
use opsforce_db::repositories::ReflectionRepository;

use crate::reactions::ReactionEngine;

/// The agent-reaction surface the rest of the application calls:
/// `select_relevant_agents`, `invoke_agents_parallel`, and
/// `format_agent_reactions`, plus `respond` wiring them together.
pub struct WorkforceRuntime {
    registry: Arc<PersonaRegistry>,
    router: RelevanceRouter,
    presenter: TonePresenter,
    engine: ReactionEngine,
    journal: Option<Arc<dyn ReflectionRepository>>,
}

impl WorkforceRuntime {
    pub fn new(registry: Arc<PersonaRegistry>, engine: ReactionEngine) -> Self {
        let router = RelevanceRouter::new((*registry).clone());
        let presenter = TonePresenter::new((*registry).clone());
        Self { registry, router, presenter, engine, journal: None }
    }

    pub fn with_journal(mut self, journal: Arc<dyn ReflectionRepository>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn select_relevant_agents(&self, message: &str) -> Vec<AgentId> {
        self.router.select(message)
    }

    pub async fn invoke_agents_parallel(
        &self,
        agents: &[AgentId],
        founder_message: &str,
        lead_reply: &str,
    ) -> Vec<ReactionResult> {
        self.engine.react(agents, founder_message, lead_reply, None).await
    }

    pub fn format_agent_reactions(
        &self,
        lead_reply: &str,
        reactions: &[ReactionResult],
    ) -> String {
        self.presenter.format_agent_reactions(lead_reply, reactions)
    }

    /// Full reaction pass for one inbound message: route, fan out, format,
    /// and journal the decision. Total agent failure degrades to the lead
    /// reply alone; the journal write never blocks the reply path.
    pub async fn respond(
        &self,
        founder_message: &str,
        lead_reply: &str,
        company: Option<&CompanyState>,
    ) -> String {
        let selected = self.router.select(founder_message);
        if selected.is_empty() {
            debug!(
                event_name = "workforce.respond.no_selection",
                "no personas selected; returning lead reply unchanged"
            );
            return lead_reply.to_string();
        }

        let reactions =
            self.engine.react(&selected, founder_message, lead_reply, company).await;
        let output = self.presenter.format_agent_reactions(lead_reply, &reactions);

        self.journal_decision(founder_message, &selected, &reactions).await;

        output
    }

    async fn journal_decision(
        &self,
        founder_message: &str,
        selected: &[AgentId],
        reactions: &[ReactionResult],
    ) {
        let Some(journal) = &self.journal else {
            return;
        };

        let roster: Vec<&str> = selected.iter().map(|agent| agent.as_str()).collect();
        let preview: String = founder_message.chars().take(40).collect();
        let confidence = (0.35 + 0.15 * reactions.len() as f64).min(0.9);

        let entry = ReflectionEntry::new(
            self.registry.lead(),
            format!("reaction:{preview}"),
            format!(
                "routed to {} of {} personas by keyword relevance: {}",
                selected.len(),
                self.registry.len(),
                roster.join(", ")
            ),
            format!("{} reactions add useful context to the lead reply", reactions.len()),
            confidence,
            "the operator dismisses the added reactions as noise".to_string(),
        );

        match entry {
            Ok(entry) => {
                if let Err(error) = journal.append(entry).await {
                    warn!(
                        event_name = "workforce.reflection_write_failed",
                        error = %error,
                        "reflection journal write failed; decision unrecorded"
                    );
                }
            }
            Err(error) => {
                warn!(
                    event_name = "workforce.reflection_invalid",
                    error = %error,
                    "reflection entry construction failed"
                );
            }
        }
    }
}
