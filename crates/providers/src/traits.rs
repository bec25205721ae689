//! Service seams between the dialogue controller and the outside world.
//!
//! One trait per collaborator.  Implementations are the REST clients in
//! the sibling modules; tests substitute recording mocks.

use serde_json::{Map, Value};

use diana_domain::error::Result;
use diana_domain::triage::{ConditionDetail, GeoPoint, Mention};

use crate::directory::{Doctor, Specialty};
use crate::encyclopedia::ArticleSummary;
use crate::intent::IntentReply;
use crate::medical::{DiagnosisRequest, DiagnosisResponse};
use crate::messaging::{OutboundMessage, PersonProfile, PlatformMessage, WebhookInfo};

/// Intent-recognition service: maps free text or a named conversational
/// event to a reply, an optional action, and parameters.
#[async_trait::async_trait]
pub trait IntentService: Send + Sync {
    async fn classify_text(
        &self,
        text: &str,
        session_id: &str,
        contexts: &[String],
        original: &Value,
    ) -> Result<IntentReply>;

    async fn classify_event(
        &self,
        event: &str,
        parameters: Map<String, Value>,
        session_id: &str,
        contexts: &[String],
        original: &Value,
    ) -> Result<IntentReply>;
}

/// Medical-reasoning service: symptom extraction, diagnosis, and
/// condition detail lookup.
#[async_trait::async_trait]
pub trait MedicalService: Send + Sync {
    async fn parse(&self, text: &str) -> Result<Vec<Mention>>;

    async fn diagnose(&self, request: &DiagnosisRequest) -> Result<DiagnosisResponse>;

    async fn condition(&self, condition_id: &str) -> Result<ConditionDetail>;
}

/// Free-text address → coordinates.  `Ok(None)` means the service had no
/// match (distinct from the service being unreachable).
#[async_trait::async_trait]
pub trait GeocodingService: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>>;
}

/// Specialist directory: provider search around a point plus the
/// specialty vocabulary loaded into the approximate-match index.
#[async_trait::async_trait]
pub trait DirectoryService: Send + Sync {
    async fn find_doctors(&self, location: GeoPoint, specialty_uid: &str) -> Result<Vec<Doctor>>;

    async fn list_specialties(&self) -> Result<Vec<Specialty>>;
}

/// Encyclopedia lookups used to enrich conclusions and answer search
/// requests.  `Ok(None)` = no article/image found.
#[async_trait::async_trait]
pub trait EncyclopediaService: Send + Sync {
    async fn summary(&self, term: &str) -> Result<Option<ArticleSummary>>;

    async fn image(&self, term: &str) -> Result<Option<String>>;
}

/// Messaging-platform REST surface: profile resolution, message fetch,
/// outbound sends, and webhook management.
#[async_trait::async_trait]
pub trait MessagingService: Send + Sync {
    async fn me(&self) -> Result<PersonProfile>;

    async fn person(&self, person_id: &str) -> Result<PersonProfile>;

    async fn message(&self, message_id: &str) -> Result<PlatformMessage>;

    async fn send_text(&self, room_id: &str, text: &str) -> Result<()>;

    async fn send(&self, room_id: &str, message: OutboundMessage) -> Result<()>;

    async fn list_webhooks(&self) -> Result<Vec<WebhookInfo>>;

    async fn create_webhook(&self, name: &str, target_url: &str) -> Result<WebhookInfo>;

    async fn delete_webhook(&self, webhook_id: &str) -> Result<()>;
}
