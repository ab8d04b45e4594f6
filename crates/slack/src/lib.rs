//! Slack Integration - outbound operator relay
//!
//! This crate is the broadcast channel for the agent workforce:
//! - **Relay** (`relay`) - `OperatorRelay` trait with pluggable transports
//! - **Block Kit** (`blocks`) - Rich message builders (alert cards, block notices)
//!
//! The relay is strictly best-effort: every caller treats a failed broadcast
//! as a logged non-event. The conversation log in the database is the
//! durable per-recipient record; this channel only mirrors it to Slack.

pub mod blocks;
pub mod relay;
