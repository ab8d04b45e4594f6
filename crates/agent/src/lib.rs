//! Agent Workforce Runtime - persona fan-out and escalation orchestration
//!
//! This crate is the operational half of the workforce core:
//! - **Completion Gateway** (`llm`) - one stateless HTTP call per persona
//! - **Prompts** (`prompts`) - persona system prompts + reflection context
//! - **Parallel Reactions** (`reactions`) - concurrent fan-out, partial-failure tolerant
//! - **Alert Dispatch** (`dispatcher`) - per-admin conversation log + relay broadcast
//! - **Escalation** (`escalation`) - strike ladder with serialized persistence
//! - **Runtime** (`runtime`) - the three-function surface the app calls
//!
//! # Architecture
//!
//! ```text
//! inbound text → RelevanceRouter → ReactionEngine → TonePresenter → reply
//!                                        ↓
//!                               ReflectionJournal
//! abuse signal → EscalationService → incident + rate-limit rows → relay
//! agent alert  → AlertDispatcher  → conversation log (per admin) → relay
//! ```
//!
//! # Failure Principle
//!
//! Reactions are advisory and alerts are fire-and-forget. A dropped persona
//! reply, a failed log write, or a dead relay degrades output; it never
//! produces a user-visible error.

pub mod dispatcher;
pub mod escalation;
pub mod llm;
pub mod prompts;
pub mod reactions;
pub mod runtime;

pub use dispatcher::AlertDispatcher;
pub use escalation::{EscalationReport, EscalationService, RATE_LIMIT_ENDPOINT};
pub use llm::{CompletionGateway, CompletionRequest, GatewayError, HttpCompletionGateway};
pub use reactions::{ReactionEngine, ReactionEngineConfig};
pub use runtime::WorkforceRuntime;
