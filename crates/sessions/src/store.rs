//! Controller-owned session store.
//!
//! Sessions live in an in-memory map and are mirrored to `sessions.json`
//! under the configured state path.  Persistence is best-effort: an
//! unreadable or unwritable state directory degrades the store to
//! memory-only for the process lifetime (logged, never fatal), matching
//! the "ephemeral fallback" contract of the session-store interface.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::session::Session;

pub struct SessionStore {
    /// `None` = ephemeral mode (persistence unavailable).
    path: Option<PathBuf>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Open the store at `state_path/sessions.json`.
    ///
    /// Never fails: directory or file problems fall back to an empty
    /// ephemeral store, as does a corrupt sessions file.
    pub fn open(state_path: &Path) -> Self {
        if let Err(e) = std::fs::create_dir_all(state_path) {
            tracing::warn!(
                path = %state_path.display(),
                error = %e,
                "state directory unavailable, session store is ephemeral"
            );
            return Self::ephemeral();
        }

        let file = state_path.join("sessions.json");
        let sessions: HashMap<String, Session> = if file.exists() {
            match std::fs::read_to_string(&file) {
                Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                    tracing::warn!(path = %file.display(), error = %e, "corrupt sessions file, starting empty");
                    HashMap::new()
                }),
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "unreadable sessions file, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        tracing::info!(
            sessions = sessions.len(),
            path = %file.display(),
            "session store loaded"
        );

        Self {
            path: Some(file),
            sessions: RwLock::new(sessions),
        }
    }

    /// A memory-only store; state disappears with the process.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the session for a room.
    pub fn get(&self, room_id: &str) -> Option<Session> {
        self.sessions.read().get(room_id).cloned()
    }

    /// Insert or replace a session under its room id.
    pub fn put(&self, session: Session) {
        self.sessions
            .write()
            .insert(session.room_id.clone(), session);
    }

    /// Fetch the session for a room, creating a fresh one when absent.
    /// Returns `(session, is_new)`.
    pub fn resolve_or_create(&self, room_id: &str, nickname: Option<String>) -> (Session, bool) {
        if let Some(existing) = self.get(room_id) {
            return (existing, false);
        }

        let session = Session::new(room_id, nickname);
        tracing::info!(
            room_id = %room_id,
            session_id = %session.session_id,
            "new session created"
        );
        self.put(session.clone());
        (session, true)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Mirror the in-memory map to disk.  Failures are logged and
    /// swallowed: a diagnosis conclusion that fails to persist is still a
    /// conclusion.
    pub fn persist(&self) {
        let Some(ref path) = self.path else {
            return;
        };

        let sessions = self.sessions.read();
        let json = match serde_json::to_string_pretty(&*sessions) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "serializing sessions failed, skipping persist");
                return;
            }
        };

        if let Err(e) = std::fs::write(path, json) {
            tracing::warn!(path = %path.display(), error = %e, "persisting sessions failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diana_domain::triage::{DialoguePhase, Evidence};

    #[test]
    fn round_trip_preserves_session_fields() {
        let dir = tempfile::tempdir().unwrap();

        let store = SessionStore::open(dir.path());
        let (mut session, is_new) = store.resolve_or_create("room-7", Some("Grace".into()));
        assert!(is_new);

        session.age = Some(30);
        session.sex = Some("male".into());
        session.phase = DialoguePhase::DiagnosticsInProgress;
        session.evidence.push(Evidence {
            id: "s1".into(),
            choice_id: "present".into(),
        });
        store.put(session.clone());
        store.persist();

        // Fresh store instance over the same path = process restart.
        let reloaded = SessionStore::open(dir.path());
        let restored = reloaded.get("room-7").expect("session survives restart");

        assert_eq!(restored.session_id, session.session_id);
        assert_eq!(restored.age, Some(30));
        assert_eq!(restored.sex.as_deref(), Some("male"));
        assert_eq!(restored.phase, DialoguePhase::DiagnosticsInProgress);
        assert_eq!(restored.evidence, session.evidence);
        assert_eq!(restored.nickname.as_deref(), Some("Grace"));
    }

    #[test]
    fn resolve_or_create_returns_existing() {
        let store = SessionStore::ephemeral();
        let (first, created) = store.resolve_or_create("room-1", None);
        assert!(created);

        let (second, created) = store.resolve_or_create("room-1", Some("ignored".into()));
        assert!(!created);
        assert_eq!(second.session_id, first.session_id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ephemeral_store_persist_is_a_noop() {
        let store = SessionStore::ephemeral();
        store.put(Session::new("room-1", None));
        store.persist();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sessions.json"), "{not json").unwrap();

        let store = SessionStore::open(dir.path());
        assert!(store.is_empty());
    }
}
