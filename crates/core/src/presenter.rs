use crate::domain::persona::AgentId;
use crate::domain::reaction::ReactionResult;
use crate::registry::PersonaRegistry;

/// Stress level above which any content is presented as an incident.
pub const INCIDENT_STRESS_THRESHOLD: f64 = 0.7;

const CRISIS_WORDS: [&str; 5] = ["attack", "down", "critical", "blocked", "breach"];
const STRATEGY_WORDS: [&str; 3] = ["recommend", "long-term", "objective"];
const URGENCY_GLYPH: &str = "🚨";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyContext {
    Casual,
    Incident,
    Strategic,
    Report,
}

/// Formats agent output for the conversation surface. Routine reactions
/// read like chat messages; urgent or structured content earns visual
/// weight.
#[derive(Clone, Debug)]
pub struct TonePresenter {
    registry: PersonaRegistry,
}

impl TonePresenter {
    pub fn new(registry: PersonaRegistry) -> Self {
        Self { registry }
    }

    /// Crisis-coded words force `Incident` regardless of stress; elevated
    /// stress alone also forces it; strategy-coded words yield `Strategic`;
    /// everything else stays `Casual`. `Report` is only ever requested
    /// explicitly by callers.
    pub fn classify(&self, content: &str, stress_level: Option<f64>) -> ReplyContext {
        let normalized = content.to_lowercase();

        if CRISIS_WORDS.iter().any(|word| normalized.contains(word)) {
            return ReplyContext::Incident;
        }
        if stress_level.map(|stress| stress > INCIDENT_STRESS_THRESHOLD).unwrap_or(false) {
            return ReplyContext::Incident;
        }
        if STRATEGY_WORDS.iter().any(|word| normalized.contains(word)) {
            return ReplyContext::Strategic;
        }

        ReplyContext::Casual
    }

    pub fn format(&self, agent: AgentId, content: &str, context: ReplyContext) -> String {
        let profile = self.registry.profile(agent);
        match context {
            ReplyContext::Casual => format!("{} {content}", profile.emoji),
            ReplyContext::Incident => format!("{URGENCY_GLYPH} {} {content}", profile.emoji),
            ReplyContext::Strategic | ReplyContext::Report => {
                format!("{}\n{} {content}", profile.display_name, profile.emoji)
            }
        }
    }

    pub fn format_natural(&self, agent: AgentId, content: &str, stress_level: Option<f64>) -> String {
        let context = self.classify(content, stress_level);
        self.format(agent, content, context)
    }

    /// Combines the lead reply with a reaction batch. An empty batch returns
    /// the lead reply untouched. The lead persona's reaction is surfaced
    /// first when present; everything else keeps the router's order.
    pub fn format_agent_reactions(&self, lead_reply: &str, reactions: &[ReactionResult]) -> String {
        if reactions.is_empty() {
            return lead_reply.to_string();
        }

        let lead = self.registry.lead();
        let mut ordered: Vec<&ReactionResult> = Vec::with_capacity(reactions.len());
        ordered.extend(reactions.iter().filter(|reaction| reaction.agent_id == lead));
        ordered.extend(reactions.iter().filter(|reaction| reaction.agent_id != lead));

        let mut output = lead_reply.to_string();
        for reaction in ordered {
            let formatted = self.format_natural(reaction.agent_id, &reaction.text, None);
            output.push_str("\n\n");
            output.push_str(&formatted);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::persona::AgentId;
    use crate::domain::reaction::ReactionResult;
    use crate::registry::PersonaRegistry;

    use super::{ReplyContext, TonePresenter};

    fn presenter() -> TonePresenter {
        TonePresenter::new(PersonaRegistry::builtin())
    }

    #[test]
    fn crisis_words_force_incident_without_a_stress_signal() {
        let presenter = presenter();
        assert_eq!(
            presenter.classify("possible data breach on the portal", None),
            ReplyContext::Incident
        );
        assert_eq!(presenter.classify("API is DOWN again", None), ReplyContext::Incident);
    }

    #[test]
    fn crisis_words_outrank_strategy_words() {
        let presenter = presenter();
        assert_eq!(
            presenter.classify("I recommend we address the breach first", Some(0.1)),
            ReplyContext::Incident
        );
    }

    #[test]
    fn elevated_stress_alone_forces_incident() {
        let presenter = presenter();
        assert_eq!(presenter.classify("quiet day so far", Some(0.9)), ReplyContext::Incident);
        assert_eq!(presenter.classify("quiet day so far", Some(0.7)), ReplyContext::Casual);
    }

    #[test]
    fn strategy_words_classify_strategic() {
        let presenter = presenter();
        assert_eq!(
            presenter.classify("recommend a long-term objective here", Some(0.2)),
            ReplyContext::Strategic
        );
    }

    #[test]
    fn default_context_is_casual() {
        let presenter = presenter();
        assert_eq!(presenter.classify("shipping the release notes now", None), ReplyContext::Casual);
    }

    #[test]
    fn casual_format_never_adds_a_name_line() {
        let presenter = presenter();
        let formatted = presenter.format(AgentId::Sales, "the demo went well", ReplyContext::Casual);
        assert!(!formatted.contains('\n'));
        assert!(formatted.starts_with("💼"));
    }

    #[test]
    fn incident_format_adds_the_urgency_glyph() {
        let presenter = presenter();
        let formatted =
            presenter.format(AgentId::SecurityGuard, "containment underway", ReplyContext::Incident);
        assert!(formatted.starts_with("🚨 🛡️"));
    }

    #[test]
    fn strategic_and_report_formats_lead_with_the_display_name() {
        let presenter = presenter();
        for context in [ReplyContext::Strategic, ReplyContext::Report] {
            let formatted = presenter.format(AgentId::Finance, "runway holds at 14 months", context);
            let mut lines = formatted.lines();
            assert_eq!(lines.next(), Some("Quill"));
            assert!(lines.next().expect("content line").starts_with("📊"));
        }
    }

    #[test]
    fn format_natural_treats_breach_as_an_incident_without_a_stress_signal() {
        let presenter = presenter();
        let formatted =
            presenter.format_natural(AgentId::SecurityGuard, "possible breach in progress", None);
        assert!(formatted.starts_with("🚨"));
    }

    #[test]
    fn empty_reaction_batch_returns_the_lead_reply_unchanged() {
        let presenter = presenter();
        let lead_reply = "On it — checking the deploy logs now.";
        assert_eq!(presenter.format_agent_reactions(lead_reply, &[]), lead_reply);
    }

    #[test]
    fn lead_persona_reaction_sorts_first_in_the_batch() {
        let presenter = presenter();
        let reactions = vec![
            ReactionResult::new(AgentId::Sales, "two accounts asked about this"),
            ReactionResult::new(AgentId::ChiefOfStaff, "sequencing this after the launch"),
            ReactionResult::new(AgentId::Finance, "no budget impact"),
        ];

        let output = presenter.format_agent_reactions("lead reply", &reactions);
        let chief = output.find("sequencing this after the launch").expect("chief present");
        let sales = output.find("two accounts asked about this").expect("sales present");
        let finance = output.find("no budget impact").expect("finance present");
        assert!(chief < sales && sales < finance);
    }
}
