use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use opsforce_core::domain::company::CompanyState;
use opsforce_core::domain::persona::AgentId;
use opsforce_core::domain::reaction::ReactionResult;
use opsforce_core::registry::PersonaRegistry;
use opsforce_db::repositories::ReflectionRepository;

use crate::llm::{CompletionGateway, CompletionRequest};
use crate::prompts;

#[derive(Clone, Debug)]
pub struct ReactionEngineConfig {
    pub max_reply_tokens: u32,
    pub reply_timeout: Duration,
    pub reflection_context_entries: u32,
}

impl Default for ReactionEngineConfig {
    fn default() -> Self {
        Self {
            max_reply_tokens: 150,
            reply_timeout: Duration::from_secs(8),
            reflection_context_entries: 3,
        }
    }
}

/// Fans one completion request out per selected persona. Reactions are
/// advisory: any failure drops that persona silently and the batch
/// proceeds. There are no retries.
pub struct ReactionEngine {
    gateway: Arc<dyn CompletionGateway>,
    registry: Arc<PersonaRegistry>,
    reflections: Option<Arc<dyn ReflectionRepository>>,
    config: ReactionEngineConfig,
}

impl ReactionEngine {
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        registry: Arc<PersonaRegistry>,
        config: ReactionEngineConfig,
    ) -> Self {
        Self { gateway, registry, reflections: None, config }
    }

    pub fn with_reflections(mut self, reflections: Arc<dyn ReflectionRepository>) -> Self {
        self.reflections = Some(reflections);
        self
    }

    /// Invokes every agent concurrently and returns results in input order
    /// minus failures. The join waits for every request to finish or fail;
    /// one slow or erroring agent never voids the others. An all-failure
    /// batch yields an empty list, not an error.
    pub async fn react(
        &self,
        agents: &[AgentId],
        founder_message: &str,
        lead_reply: &str,
        company: Option<&CompanyState>,
    ) -> Vec<ReactionResult> {
        let mut seen = HashSet::new();
        let unique: Vec<AgentId> =
            agents.iter().copied().filter(|agent| seen.insert(*agent)).collect();

        let mut handles = Vec::with_capacity(unique.len());
        for agent in unique {
            let gateway = Arc::clone(&self.gateway);
            let reflections = self.reflections.clone();
            let profile = self.registry.profile(agent).clone();
            let founder_message = founder_message.to_string();
            let lead_reply = lead_reply.to_string();
            let company = company.cloned();
            let max_reply_tokens = self.config.max_reply_tokens;
            let reply_timeout = self.config.reply_timeout;
            let context_entries = self.config.reflection_context_entries;

            handles.push((
                agent,
                tokio::spawn(async move {
                    let history = match reflections {
                        Some(repo) => repo
                            .recent_for_employee(agent, context_entries)
                            .await
                            .unwrap_or_default(),
                        None => Vec::new(),
                    };

                    let request = CompletionRequest {
                        system: prompts::persona_system_prompt(&profile),
                        user: prompts::reaction_user_prompt(
                            &founder_message,
                            &lead_reply,
                            company.as_ref(),
                            &history,
                        ),
                        max_tokens: max_reply_tokens,
                    };

                    tokio::time::timeout(reply_timeout, gateway.complete(request)).await
                }),
            ));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (agent, handle) in handles {
            match handle.await {
                Ok(Ok(Ok(text))) if !text.trim().is_empty() => {
                    debug!(
                        event_name = "workforce.reaction.completed",
                        agent = %agent,
                        "agent reaction completed"
                    );
                    results.push(ReactionResult::new(agent, text.trim().to_string()));
                }
                Ok(Ok(Ok(_))) | Ok(Ok(Err(_))) | Ok(Err(_)) | Err(_) => {
                    warn!(
                        event_name = "workforce.reaction.dropped",
                        agent = %agent,
                        "agent reaction dropped; continuing without it"
                    );
                }
            }
        }

        results
    }
}
