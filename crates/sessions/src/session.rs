use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use diana_domain::triage::{ConditionDetail, DialoguePhase, Evidence, Question};

/// Conversation state for one chat room.
///
/// `evidence`, the counters, and `pending_question` belong to the current
/// diagnosis cycle and are wiped together by [`Session::clear`].  The
/// `old_*` fields survive clearing: they snapshot the last concluded cycle
/// so a follow-up doctor search can be seeded from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub room_id: String,
    /// Conversation-correlation token for the intent service; minted once,
    /// stable for the room's lifetime.
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    /// How many times we prompted for symptoms in this cycle (0 → 1 gate).
    #[serde(default)]
    pub ask_symptoms_count: u32,
    /// Follow-up questions answered in this cycle.
    #[serde(default)]
    pub questions_count: u32,
    #[serde(default)]
    pub pending_question: Option<Question>,
    #[serde(default)]
    pub phase: DialoguePhase,
    /// Specialty id resolved during the doctor-search flow, consumed when
    /// the address arrives.
    #[serde(default)]
    pub pending_specialty: Option<String>,
    #[serde(default)]
    pub old_evidence: Vec<Evidence>,
    #[serde(default)]
    pub old_condition: Option<ConditionDetail>,
}

impl Session {
    pub fn new(room_id: impl Into<String>, nickname: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            room_id: room_id.into(),
            session_id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            nickname,
            age: None,
            sex: None,
            evidence: Vec::new(),
            ask_symptoms_count: 0,
            questions_count: 0,
            pending_question: None,
            phase: DialoguePhase::Idle,
            pending_specialty: None,
            old_evidence: Vec::new(),
            old_condition: None,
        }
    }

    /// End the current diagnosis cycle: counters, evidence, the pending
    /// question, the pending specialty, and the phase all reset in one
    /// call.  Demographics, nickname, and the `old_*` snapshot are kept.
    pub fn clear(&mut self) {
        self.questions_count = 0;
        self.ask_symptoms_count = 0;
        self.evidence.clear();
        self.pending_question = None;
        self.pending_specialty = None;
        self.phase = DialoguePhase::Idle;
        self.touch();
    }

    /// Whether both demographic facts required for diagnosis are present.
    pub fn has_user_info(&self) -> bool {
        self.age.is_some() && self.sex.is_some()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
