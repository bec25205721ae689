//! The dialogue controller: phase routing, the symptom-parse/diagnosis
//! loop, action dispatch, pending-question resolution, and the doctor
//! search sub-flow.
//!
//! Sessions are loaded, mutated, and stored per delivery without
//! cross-request locking.  Two deliveries for the same room racing each
//! other can lose one of the two updates; room traffic is human-paced and
//! the next message rebuilds the state, so this is accepted.

mod actions;
mod controller;
mod diagnosis;
mod doctor_search;
mod specialty;

#[cfg(test)]
mod testutil;

pub use controller::DialogueController;
pub use specialty::SpecialtyIndex;

// ── Context markers (intent-service wire names) ───────────────────
pub(crate) const DIAGNOSTICS_IN_PROGRESS_CONTEXT: &str = "diagnosticsinprogress";
pub(crate) const SEARCH_DOCTOR_SPECIALTY_CONTEXT: &str = "usersearchdoctorspecialty";
pub(crate) const SEARCH_DOCTOR_ADDRESS_CONTEXT: &str = "usersearchdoctoraddress";

// ── Actions the intent agent classifies ───────────────────────────
pub(crate) const DIAGNOSTICS_START_ACTION: &str = "diagnostics.start";
pub(crate) const UPDATE_USER_INFO_ACTION: &str = "update.user.info";
pub(crate) const INPUT_UNKNOWN_ACTION: &str = "input.unknown";
pub(crate) const SEARCH_DOCTOR_AFTER_DIAGNOSIS_ACTION: &str = "searchdoctorafterdiagnosis";
pub(crate) const WIKIPEDIA_SEARCH_ACTION: &str = "wikipedia.search";
pub(crate) const CANCEL_ACTION: &str = "cancel";

// ── Events fired at the intent agent ──────────────────────────────
pub(crate) const ASK_SYMPTOMS_EVENT: &str = "askforsymptoms";
pub(crate) const ASK_MORE_SYMPTOMS_EVENT: &str = "askformoresymptoms";
pub(crate) const NOT_ENOUGH_SYMPTOMS_EVENT: &str = "diagnosticnotenoughsymptoms";
pub(crate) const ASK_USER_INFO_EVENT: &str = "askuserinfo";
/// The intent agent registers the diagnosis-offer event under this exact
/// name; changing it here breaks the agent-side mapping.
pub(crate) const DIAGNOSTICS_START_EVENT: &str = "diagnosticssart";
pub(crate) const WELCOME_EVENT: &str = "welcome";
pub(crate) const FINAL_CONDITION_EVENT: &str = "finalcondition";
pub(crate) const INFERMEDICA_FALLBACK_EVENT: &str = "infermedicafallback";
pub(crate) const CANT_FIND_SPECIALTY_EVENT: &str = "cantfindspecialty";
pub(crate) const CANT_FIND_ADDRESS_EVENT: &str = "cantfindaddress";
pub(crate) const CANT_FIND_DOCTORS_EVENT: &str = "cantfinddoctors";
pub(crate) const SEARCH_DOCTOR_ASK_ADDRESS_EVENT: &str = "searchdoctoraskaddress";

// ── Fixed user-facing texts ───────────────────────────────────────
pub(crate) const SERVICE_UNAVAILABLE_REPLY: &str =
    "Sorry, the diagnosis service is not available right now. Please try again later";
pub(crate) const NO_ENCYCLOPEDIA_RESULT_REPLY: &str = "Sorry, I can't find anything on Wikipedia.";
