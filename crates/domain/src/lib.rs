//! Shared types for the Diana triage gateway.
//!
//! Holds the configuration model, the error type used across all crates,
//! and the triage wire/domain types (evidence, questions, conditions,
//! dialogue phases) that the session store and the service adapters share.

pub mod config;
pub mod error;
pub mod triage;

pub use config::Config;
pub use error::{Error, Result};
