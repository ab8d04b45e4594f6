use opsforce_core::domain::company::CompanyState;
use opsforce_core::domain::persona::PersonaProfile;
use opsforce_core::domain::reflection::ReflectionEntry;

/// Persona system prompt: identity plus the fixed reaction constraints.
/// Every agent gets the same constraint list; only the persona block varies.
pub fn persona_system_prompt(profile: &PersonaProfile) -> String {
    let mut prompt = format!(
        "You are {name}, the company's {role} specialist.\n\
         Core motivation: {motivation}\n",
        name = profile.display_name,
        role = profile.id,
        motivation = profile.core_motivation,
    );

    if !profile.tone_rules.is_empty() {
        prompt.push_str("Tone:\n");
        for rule in &profile.tone_rules {
            prompt.push_str("- ");
            prompt.push_str(rule);
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!(
        "When uncertain: {uncertainty}\n\
         When you disagree: {disagreement}\n",
        uncertainty = profile.uncertainty_rule,
        disagreement = profile.disagreement_protocol,
    ));

    prompt.push_str(
        "Constraints:\n\
         - Reply in 1 to 3 sentences of plain prose.\n\
         - No headings, lists, or other structural formatting.\n\
         - You may disagree with the lead reply.\n\
         - You may ask at most one question.\n\
         - Never reveal that you are an automated system.\n",
    );

    prompt
}

/// User prompt for one reaction: the inbound message, the lead reply it
/// follows, and whatever calibration context is available.
pub fn reaction_user_prompt(
    founder_message: &str,
    lead_reply: &str,
    company: Option<&CompanyState>,
    reflections: &[ReflectionEntry],
) -> String {
    let mut prompt = format!(
        "The founder wrote:\n{founder_message}\n\n\
         The lead assistant already replied:\n{lead_reply}\n\n\
         Add your own short reaction from your role's point of view.",
    );

    if let Some(company) = company {
        prompt.push_str(&format!(
            "\n\nCompany pulse: momentum {momentum:.2}, stress {stress:.2}, growth velocity {growth:.2}.",
            momentum = company.momentum,
            stress = company.stress_level,
            growth = company.growth_velocity,
        ));
    }

    if let Some(block) = reflection_context_block(reflections) {
        prompt.push_str("\n\n");
        prompt.push_str(&block);
    }

    prompt
}

/// Renders the most recent journal entries as prompt context. Returns
/// `None` when there is no history, so the prompt carries no empty header.
pub fn reflection_context_block(reflections: &[ReflectionEntry]) -> Option<String> {
    if reflections.is_empty() {
        return None;
    }

    let mut block = String::from("Your recent decisions, most recent first:");
    for entry in reflections {
        block.push_str(&format!(
            "\n- [{action}] {reasoning} (confidence {confidence:.2}; would change mind if: {falsifier})",
            action = entry.action_ref,
            reasoning = entry.reasoning,
            confidence = entry.confidence,
            falsifier = entry.what_would_change_mind,
        ));
    }
    Some(block)
}

#[cfg(test)]
mod tests {
    use opsforce_core::domain::company::CompanyState;
    use opsforce_core::domain::persona::AgentId;
    use opsforce_core::domain::reflection::ReflectionEntry;
    use opsforce_core::registry::PersonaRegistry;

    use super::{persona_system_prompt, reaction_user_prompt, reflection_context_block};

    #[test]
    fn system_prompt_carries_identity_and_fixed_constraints() {
        let registry = PersonaRegistry::builtin();
        let prompt = persona_system_prompt(registry.profile(AgentId::SecurityGuard));

        assert!(prompt.contains("You are Rook"));
        assert!(prompt.contains("security_guard"));
        assert!(prompt.contains("1 to 3 sentences"));
        assert!(prompt.contains("at most one question"));
        assert!(prompt.contains("Never reveal that you are an automated system"));
    }

    #[test]
    fn user_prompt_quotes_both_messages() {
        let prompt = reaction_user_prompt("is the deploy safe?", "Checking now.", None, &[]);
        assert!(prompt.contains("is the deploy safe?"));
        assert!(prompt.contains("Checking now."));
        assert!(!prompt.contains("Company pulse"));
        assert!(!prompt.contains("recent decisions"));
    }

    #[test]
    fn company_state_adds_a_calibration_line() {
        let company = CompanyState { momentum: 0.4, stress_level: 0.9, growth_velocity: 0.1 };
        let prompt = reaction_user_prompt("status?", "All quiet.", Some(&company), &[]);
        assert!(prompt.contains("stress 0.90"));
    }

    #[test]
    fn reflection_block_lists_entries_or_stays_absent() {
        assert!(reflection_context_block(&[]).is_none());

        let entry = ReflectionEntry::new(
            AgentId::Sales,
            "reaction:msg-9",
            "the account mentioned renewal twice",
            "a renewal conversation starts this week",
            0.7,
            "the account goes silent for another month",
        )
        .expect("valid entry");

        let block = reflection_context_block(&[entry]).expect("block rendered");
        assert!(block.contains("reaction:msg-9"));
        assert!(block.contains("confidence 0.70"));
    }
}
