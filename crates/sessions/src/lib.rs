//! Session management for the Diana triage gateway.
//!
//! One [`Session`] per chat room, owned exclusively by the dialogue
//! controller and persisted by the JSON-file-backed [`SessionStore`].
//! Store unavailability degrades to an ephemeral in-memory map — a
//! broken disk never takes the conversation down.

pub mod session;
pub mod store;

pub use session::Session;
pub use store::SessionStore;
