//! Webhook gateway for the triage bot: HTTP surface, bot identity,
//! application state, and the dialogue controller that drives the
//! conversation.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod dialogue;
pub mod identity;
pub mod state;
