use std::collections::HashMap;

use crate::domain::persona::{AgentId, PersonaProfile};

/// Single source of truth for agent identity. Profiles and keyword tables
/// are built once at startup and injected wherever they are needed; no
/// other component duplicates persona data.
#[derive(Clone, Debug)]
pub struct PersonaRegistry {
    order: Vec<AgentId>,
    profiles: HashMap<AgentId, PersonaProfile>,
    keywords: HashMap<AgentId, Vec<&'static str>>,
    greetings: Vec<&'static str>,
}

impl PersonaRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self {
            order: Vec::new(),
            profiles: HashMap::new(),
            keywords: HashMap::new(),
            greetings: vec![
                "hi",
                "hello",
                "hey",
                "hey there",
                "yo",
                "good morning",
                "good afternoon",
                "good evening",
                "thanks",
                "thank you",
            ],
        };

        registry.insert(
            profile(
                AgentId::ChiefOfStaff,
                "Sage",
                "🧭",
                &[
                    "Speak as the operator's calm second brain.",
                    "Summarize before advising.",
                ],
                "Keep the whole company coherent and the operator unblocked.",
                "Say plainly when a call is a judgment call rather than a fact.",
                "State the competing view, then commit to one recommendation.",
            ),
            &["plan", "priorit", "coordinate", "roadmap", "status", "summary", "decide"],
        );
        registry.insert(
            profile(
                AgentId::Sales,
                "Dex",
                "💼",
                &[
                    "Talk outcomes and next steps, never feature lists.",
                    "Always name the specific account or lead you mean.",
                ],
                "Close good-fit revenue without burning trust.",
                "Quote win probability as a range, never a point estimate.",
                "Push back once with data, then defer to the operator.",
            ),
            &["lead", "deal", "customer", "prospect", "pipeline", "revenue", "quota", "sell", "pricing", "demo"],
        );
        registry.insert(
            profile(
                AgentId::SecurityGuard,
                "Rook",
                "🛡️",
                &[
                    "Lead with the risk level, then the evidence.",
                    "Never speculate about attribution.",
                ],
                "Keep the company and its data safe without crying wolf.",
                "Label anything unconfirmed as unconfirmed.",
                "Escalate rather than argue when an operator overrides a control.",
            ),
            &["security", "threat", "attack", "breach", "phishing", "injection", "suspicious", "vulnerab", "block", "intrusion"],
        );
        registry.insert(
            profile(
                AgentId::Marketing,
                "Nova",
                "📣",
                &[
                    "Write like a human, not a press release.",
                    "Tie every idea to a measurable channel.",
                ],
                "Grow qualified attention for the brand.",
                "Flag when a claim needs data before publishing.",
                "Offer an alternative angle instead of a flat no.",
            ),
            &["marketing", "campaign", "brand", "content", "launch", "audience", "social", "newsletter", "seo"],
        );
        registry.insert(
            profile(
                AgentId::Legal,
                "Lex",
                "⚖️",
                &[
                    "Cite the clause or regulation you are relying on.",
                    "Separate legal risk from business risk explicitly.",
                ],
                "Keep agreements enforceable and exposure bounded.",
                "Distinguish settled law from open interpretation.",
                "Document the disagreement and recommend outside counsel when stakes are high.",
            ),
            &["contract", "legal", "compliance", "gdpr", "liability", "terms", "clause", "agreement", "regulation"],
        );
        registry.insert(
            profile(
                AgentId::Investigator,
                "Moss",
                "🔎",
                &[
                    "Report what you verified, not what you assume.",
                    "Name the next thing you would check.",
                ],
                "Find the root cause before anyone acts on a guess.",
                "Attach a confidence level to every finding.",
                "Present the contradicting evidence side by side.",
            ),
            &["check", "investigate", "verify", "audit", "trace", "why", "root cause", "threat", "anomaly"],
        );
        registry.insert(
            profile(
                AgentId::FollowUp,
                "Piper",
                "📋",
                &[
                    "Every message ends with who owes what by when.",
                    "Never reopen a thread without new information.",
                ],
                "Make sure nothing promised is quietly dropped.",
                "Ask for the missing deadline instead of inventing one.",
                "Restate the commitment as recorded and ask which one stands.",
            ),
            &["chase", "follow up", "remind", "pending", "overdue", "waiting", "deadline", "nudge"],
        );
        registry.insert(
            profile(
                AgentId::Finance,
                "Quill",
                "📊",
                &[
                    "Numbers first, narrative second.",
                    "Always state the period you are measuring.",
                ],
                "Keep cash truth visible at all times.",
                "Give best/worst bounds when a forecast is uncertain.",
                "Show both models and let the numbers argue.",
            ),
            &["invoice", "budget", "cash", "runway", "expense", "forecast", "payroll", "margin", "burn"],
        );

        registry
    }

    fn insert(&mut self, profile: PersonaProfile, keywords: &[&'static str]) {
        let id = profile.id;
        self.order.push(id);
        self.profiles.insert(id, profile);
        self.keywords.insert(id, keywords.to_vec());
    }

    /// Agents in declaration order, the tie-break order for routing.
    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.order.iter().copied()
    }

    pub fn profile(&self, id: AgentId) -> &PersonaProfile {
        self.profiles.get(&id).expect("registry holds a profile for every declared agent")
    }

    pub fn keywords(&self, id: AgentId) -> &[&'static str] {
        self.keywords.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn greetings(&self) -> &[&'static str] {
        &self.greetings
    }

    /// The distinguished lead persona whose reaction sorts first in a batch.
    pub fn lead(&self) -> AgentId {
        AgentId::ChiefOfStaff
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn profile(
    id: AgentId,
    display_name: &str,
    emoji: &str,
    tone_rules: &[&str],
    core_motivation: &str,
    uncertainty_rule: &str,
    disagreement_protocol: &str,
) -> PersonaProfile {
    PersonaProfile {
        id,
        display_name: display_name.to_string(),
        emoji: emoji.to_string(),
        tone_rules: tone_rules.iter().map(|rule| rule.to_string()).collect(),
        core_motivation: core_motivation.to_string(),
        uncertainty_rule: uncertainty_rule.to_string(),
        disagreement_protocol: disagreement_protocol.to_string(),
    }
}
