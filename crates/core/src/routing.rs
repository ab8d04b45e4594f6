use crate::domain::persona::AgentId;
use crate::registry::PersonaRegistry;

/// Upper bound on how many personas react to a single message.
pub const MAX_SELECTED_AGENTS: usize = 4;

/// Keyword-driven persona selection. Pure: the only inputs are the message
/// text and the registry's static keyword table.
#[derive(Clone, Debug)]
pub struct RelevanceRouter {
    registry: PersonaRegistry,
}

impl RelevanceRouter {
    pub fn new(registry: PersonaRegistry) -> Self {
        Self { registry }
    }

    /// Selects up to four personas, descending keyword-match count, ties
    /// broken by registry declaration order. Greetings and keyword-free
    /// messages select nobody: silence is preferred over noise.
    pub fn select(&self, message: &str) -> Vec<AgentId> {
        let normalized = message.trim().to_lowercase();
        if normalized.is_empty() || self.is_casual_greeting(&normalized) {
            return Vec::new();
        }

        // Each keyword counts once per message regardless of repetition:
        // the score is a topic-applies signal, not an intensity measure.
        let mut scores: Vec<(AgentId, u32)> = self
            .registry
            .agents()
            .map(|agent| {
                let hits = self
                    .registry
                    .keywords(agent)
                    .iter()
                    .filter(|keyword| normalized.contains(**keyword))
                    .count() as u32;
                (agent, hits)
            })
            .collect();

        scores.sort_by(|a, b| b.1.cmp(&a.1));

        scores
            .into_iter()
            .filter(|(_, score)| *score > 0)
            .take(MAX_SELECTED_AGENTS)
            .map(|(agent, _)| agent)
            .collect()
    }

    fn is_casual_greeting(&self, normalized: &str) -> bool {
        let stripped = normalized.trim_end_matches(['!', '.', '?']).trim_end();
        self.registry.greetings().iter().any(|greeting| *greeting == stripped)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::persona::AgentId;
    use crate::registry::PersonaRegistry;

    use super::{RelevanceRouter, MAX_SELECTED_AGENTS};

    fn router() -> RelevanceRouter {
        RelevanceRouter::new(PersonaRegistry::builtin())
    }

    #[test]
    fn greetings_never_trigger_the_workforce() {
        let router = router();
        for greeting in ["hi", "Hello!", "HEY", "good morning.", "  thanks  ", "thank you!"] {
            assert_eq!(router.select(greeting), Vec::new(), "greeting: {greeting}");
        }
    }

    #[test]
    fn keyword_free_messages_select_nobody() {
        let router = router();
        assert_eq!(router.select("the weather is nice today"), Vec::new());
        assert_eq!(router.select(""), Vec::new());
    }

    #[test]
    fn selection_is_bounded_sorted_and_nonzero() {
        let router = router();
        let selected = router.select(
            "new campaign launch for the enterprise customer, check the contract, \
             chase the overdue invoice, investigate the pipeline and plan the roadmap",
        );

        assert!(!selected.is_empty());
        assert!(selected.len() <= MAX_SELECTED_AGENTS);

        let registry = PersonaRegistry::builtin();
        let normalized = "new campaign launch for the enterprise customer, check the contract, \
             chase the overdue invoice, investigate the pipeline and plan the roadmap"
            .to_lowercase();
        let score = |agent: AgentId| {
            registry.keywords(agent).iter().filter(|kw| normalized.contains(**kw)).count()
        };
        for pair in selected.windows(2) {
            assert!(score(pair[0]) >= score(pair[1]), "selection must be descending by score");
        }
        for agent in &selected {
            assert!(score(*agent) > 0, "selected agent must have a nonzero score");
        }
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let router = router();
        // "lead" three times still scores sales at 1; security's two distinct
        // keywords outrank it.
        let selected = router.select("lead lead lead, and a security breach");
        let sales_pos = selected.iter().position(|a| *a == AgentId::Sales).expect("sales selected");
        let guard_pos = selected
            .iter()
            .position(|a| *a == AgentId::SecurityGuard)
            .expect("security guard selected");
        assert!(guard_pos < sales_pos);
    }

    #[test]
    fn ties_break_by_registry_declaration_order() {
        let router = router();
        // One keyword each: sales ("deal") and finance ("budget"); sales is
        // declared first.
        let selected = router.select("a deal within budget");
        assert_eq!(selected, vec![AgentId::Sales, AgentId::Finance]);
    }

    #[test]
    fn sales_and_security_scenario_selects_expected_roles() {
        let router = router();
        let selected = router.select("can you chase this lead and check for security threats");

        assert!(selected.contains(&AgentId::Sales));
        assert!(selected.contains(&AgentId::SecurityGuard));
        assert!(selected.len() <= MAX_SELECTED_AGENTS);
        // Overlapping keywords make these two plausible companions.
        assert!(selected.contains(&AgentId::Investigator));
        assert!(selected.contains(&AgentId::FollowUp));
    }
}
