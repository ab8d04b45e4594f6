use serde::Serialize;

use opsforce_core::domain::alert::{AlertMessage, AlertPriority};
use opsforce_core::domain::incident::SecurityIncident;
use opsforce_core::domain::persona::PersonaProfile;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ButtonElement> },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// Broadcast card for a dispatched alert. One card summarizes the alert for
/// the operator channel; per-recipient copies live in the conversation log.
pub fn alert_card(alert: &AlertMessage, profile: &PersonaProfile) -> MessageTemplate {
    let glyph = alert.priority.glyph();
    let mut builder =
        MessageBuilder::new(format!("{glyph} {} — {}", profile.display_name, alert.message))
            .section("workforce.alert.header.v1", |section| {
                section.mrkdwn(format!(
                    "{glyph} *{}* {}\n{}",
                    profile.display_name, profile.emoji, alert.message
                ));
            });

    if alert.needs_approval {
        builder = builder.actions("workforce.alert.actions.v1", |actions| {
            actions
                .button(
                    ButtonElement::new("alert.approve.v1", "Approve")
                        .style(ButtonStyle::Primary)
                        .value(alert.employee_id.as_str()),
                )
                .button(
                    ButtonElement::new("alert.dismiss.v1", "Dismiss")
                        .style(ButtonStyle::Danger)
                        .value(alert.employee_id.as_str()),
                );
        });
    }

    builder
        .context("workforce.alert.context.v1", |context| {
            context.plain(format!(
                "From {} · priority {}",
                alert.employee_id,
                alert.priority.as_str()
            ));
        })
        .build()
}

/// Broadcast notice for an escalation block transition. Sent on block
/// transitions only; warnings never reach the operator channel.
pub fn block_notice(incident: &SecurityIncident) -> MessageTemplate {
    let window = incident
        .blocked_until
        .map(|until| until.to_rfc3339())
        .unwrap_or_else(|| "unspecified".to_string());

    MessageBuilder::new(format!(
        "User {} blocked after {} strikes ({})",
        incident.user_id, incident.strike_count, incident.incident_type
    ))
    .section("workforce.escalation.summary.v1", |section| {
        section.mrkdwn(format!(
            "{} *User blocked*\n`{}` hit strike {} for `{}` — action `{}`.",
            AlertPriority::Critical.glyph(),
            incident.user_id,
            incident.strike_count,
            incident.incident_type,
            incident.action_taken
        ));
    })
    .context("workforce.escalation.context.v1", |context| {
        context.plain(format!("Blocked until {window}"));
    })
    .build()
}
