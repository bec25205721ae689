//! Triage domain types shared between the session store, the service
//! adapters, and the dialogue controller.
//!
//! Field names follow the medical-reasoning wire format so evidence and
//! questions round-trip through the service without translation.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Evidence & symptom parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One symptom observation: a symptom (or question item) identifier plus
/// the chosen answer (`present`, `absent`, `unknown`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub choice_id: String,
}

/// A symptom mention recognized inside free text by the parse operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub choice_id: String,
}

impl From<Mention> for Evidence {
    fn from(m: Mention) -> Self {
        Evidence {
            id: m.id,
            choice_id: m.choice_id,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Diagnosis
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A follow-up question returned by the diagnosis operation, held as the
/// session's pending question until the user answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub items: Vec<QuestionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// A ranked condition candidate.  The service returns candidates sorted by
/// descending probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionCandidate {
    pub id: String,
    pub probability: f64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Full detail of a concluded condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDetail {
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Recommendation text ("consult a doctor within 24 hours", …).
    #[serde(default)]
    pub hint: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dialogue phase
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The conversational mode of a session, gating how the next inbound
/// message is routed.  A single tagged value; a session is never in two
/// phases at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialoguePhase {
    /// Small talk; no flow in progress.
    #[default]
    Idle,
    /// Collecting symptoms or waiting for a follow-up answer.
    DiagnosticsInProgress,
    /// Waiting for the user to name a medical specialty.
    AwaitingSpecialty,
    /// Waiting for an address to search doctors around.
    AwaitingAddress,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Geography
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&DialoguePhase::DiagnosticsInProgress).unwrap();
        assert_eq!(json, "\"diagnostics_in_progress\"");

        let back: DialoguePhase = serde_json::from_str("\"awaiting_specialty\"").unwrap();
        assert_eq!(back, DialoguePhase::AwaitingSpecialty);
    }

    #[test]
    fn phase_defaults_to_idle() {
        assert_eq!(DialoguePhase::default(), DialoguePhase::Idle);
    }

    #[test]
    fn mention_converts_to_evidence() {
        let m = Mention {
            id: "s_21".into(),
            choice_id: "present".into(),
        };
        let e: Evidence = m.into();
        assert_eq!(e.id, "s_21");
        assert_eq!(e.choice_id, "present");
    }
}
