pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod escalation;
pub mod presenter;
pub mod registry;
pub mod routing;

pub use directory::AdminDirectory;
pub use domain::alert::{
    AlertMessage, AlertPriority, ConversationEntry, ConversationEntryId,
};
pub use domain::company::{CompanyState, Objective};
pub use domain::incident::{
    IncidentId, IncidentStatus, IncidentType, SecurityIncident,
};
pub use domain::persona::{AgentId, PersonaProfile};
pub use domain::rate_limit::RateLimitRecord;
pub use domain::reaction::ReactionResult;
pub use domain::reflection::{ReflectionEntry, ReflectionId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use escalation::{
    EscalationDisposition, EscalationOutcome, EscalationPolicy, OffenderIdentity,
};
pub use presenter::{ReplyContext, TonePresenter};
pub use registry::PersonaRegistry;
pub use routing::{RelevanceRouter, MAX_SELECTED_AGENTS};
