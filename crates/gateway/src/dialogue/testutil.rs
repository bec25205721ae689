//! Recording mocks for the six service seams plus a controller harness.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use diana_domain::config::Config;
use diana_domain::error::{Error, Result};
use diana_domain::triage::{ConditionDetail, GeoPoint, Mention};
use diana_providers::{
    ArticleSummary, DiagnosisRequest, DiagnosisResponse, Doctor, IntentReply, IntentService,
    MedicalService, MessagingService, DirectoryService, EncyclopediaService, GeocodingService,
    OutboundMessage, PersonProfile, PlatformMessage, Specialty, WebhookInfo,
};
use diana_sessions::SessionStore;

use crate::api::webhook::WebhookDelivery;
use crate::identity::BotIdentity;

use super::controller::DialogueController;
use super::specialty::SpecialtyIndex;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intent
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub enum IntentCall {
    Text {
        text: String,
        contexts: Vec<String>,
    },
    Event {
        name: String,
        parameters: Map<String, Value>,
        contexts: Vec<String>,
    },
}

#[derive(Default)]
pub struct MockIntent {
    pub replies: Mutex<VecDeque<IntentReply>>,
    pub calls: Mutex<Vec<IntentCall>>,
}

impl MockIntent {
    pub fn push_reply(&self, reply: IntentReply) {
        self.replies.lock().push_back(reply);
    }

    pub fn event_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                IntentCall::Event { name, .. } => Some(name.clone()),
                IntentCall::Text { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl IntentService for MockIntent {
    async fn classify_text(
        &self,
        text: &str,
        _session_id: &str,
        contexts: &[String],
        _original: &Value,
    ) -> Result<IntentReply> {
        self.calls.lock().push(IntentCall::Text {
            text: text.to_owned(),
            contexts: contexts.to_vec(),
        });
        Ok(self.replies.lock().pop_front().unwrap_or_default())
    }

    async fn classify_event(
        &self,
        event: &str,
        parameters: Map<String, Value>,
        _session_id: &str,
        contexts: &[String],
        _original: &Value,
    ) -> Result<IntentReply> {
        self.calls.lock().push(IntentCall::Event {
            name: event.to_owned(),
            parameters,
            contexts: contexts.to_vec(),
        });
        Ok(self.replies.lock().pop_front().unwrap_or_default())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Medical
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct MockMedical {
    pub parse_results: Mutex<VecDeque<Result<Vec<Mention>>>>,
    pub diagnose_results: Mutex<VecDeque<Result<DiagnosisResponse>>>,
    pub condition_results: Mutex<VecDeque<Result<ConditionDetail>>>,
    pub parse_calls: Mutex<Vec<String>>,
    pub diagnose_calls: Mutex<Vec<DiagnosisRequest>>,
    pub condition_calls: Mutex<Vec<String>>,
}

impl MockMedical {
    pub fn push_parse(&self, mentions: Vec<Mention>) {
        self.parse_results.lock().push_back(Ok(mentions));
    }

    pub fn push_diagnosis(&self, response: DiagnosisResponse) {
        self.diagnose_results.lock().push_back(Ok(response));
    }

    pub fn push_condition(&self, detail: ConditionDetail) {
        self.condition_results.lock().push_back(Ok(detail));
    }
}

#[async_trait]
impl MedicalService for MockMedical {
    async fn parse(&self, text: &str) -> Result<Vec<Mention>> {
        self.parse_calls.lock().push(text.to_owned());
        self.parse_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn diagnose(&self, request: &DiagnosisRequest) -> Result<DiagnosisResponse> {
        self.diagnose_calls.lock().push(request.clone());
        self.diagnose_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(DiagnosisResponse::default()))
    }

    async fn condition(&self, condition_id: &str) -> Result<ConditionDetail> {
        self.condition_calls.lock().push(condition_id.to_owned());
        self.condition_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Medical("no scripted condition".into())))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Geocoding / directory / encyclopedia
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct MockGeocoding {
    pub results: Mutex<VecDeque<Result<Option<GeoPoint>>>>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl GeocodingService for MockGeocoding {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        self.calls.lock().push(address.to_owned());
        self.results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(None))
    }
}

#[derive(Default)]
pub struct MockDirectory {
    pub doctor_results: Mutex<VecDeque<Result<Vec<Doctor>>>>,
    pub specialties: Mutex<Vec<Specialty>>,
    pub find_calls: Mutex<Vec<(GeoPoint, String)>>,
}

#[async_trait]
impl DirectoryService for MockDirectory {
    async fn find_doctors(&self, location: GeoPoint, specialty_uid: &str) -> Result<Vec<Doctor>> {
        self.find_calls
            .lock()
            .push((location, specialty_uid.to_owned()));
        self.doctor_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_specialties(&self) -> Result<Vec<Specialty>> {
        Ok(self.specialties.lock().clone())
    }
}

#[derive(Default)]
pub struct MockEncyclopedia {
    pub summaries: Mutex<VecDeque<Result<Option<ArticleSummary>>>>,
    pub images: Mutex<VecDeque<Result<Option<String>>>>,
}

#[async_trait]
impl EncyclopediaService for MockEncyclopedia {
    async fn summary(&self, _term: &str) -> Result<Option<ArticleSummary>> {
        self.summaries
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(None))
    }

    async fn image(&self, _term: &str) -> Result<Option<String>> {
        self.images.lock().pop_front().unwrap_or_else(|| Ok(None))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Messaging
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct MockMessaging {
    pub messages: Mutex<HashMap<String, PlatformMessage>>,
    pub people: Mutex<HashMap<String, PersonProfile>>,
    pub sent: Mutex<Vec<(String, OutboundMessage)>>,
    pub person_calls: Mutex<Vec<String>>,
}

impl MockMessaging {
    /// Script a fetchable inbound message.
    pub fn put_message(&self, id: &str, room_id: &str, text: &str) {
        let message: PlatformMessage = serde_json::from_value(serde_json::json!({
            "id": id,
            "roomId": room_id,
            "text": text,
        }))
        .unwrap();
        self.messages.lock().insert(id.to_owned(), message);
    }

    pub fn put_person(&self, id: &str, nickname: &str) {
        let person: PersonProfile = serde_json::from_value(serde_json::json!({
            "id": id,
            "nickName": nickname,
        }))
        .unwrap();
        self.people.lock().insert(id.to_owned(), person);
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|(_, m)| m.text.clone().or_else(|| m.markdown.clone()))
            .collect()
    }
}

#[async_trait]
impl MessagingService for MockMessaging {
    async fn me(&self) -> Result<PersonProfile> {
        Err(Error::Messaging("not scripted".into()))
    }

    async fn person(&self, person_id: &str) -> Result<PersonProfile> {
        self.person_calls.lock().push(person_id.to_owned());
        self.people
            .lock()
            .get(person_id)
            .cloned()
            .ok_or_else(|| Error::Messaging(format!("unknown person {person_id}")))
    }

    async fn message(&self, message_id: &str) -> Result<PlatformMessage> {
        self.messages
            .lock()
            .get(message_id)
            .cloned()
            .ok_or_else(|| Error::Messaging(format!("unknown message {message_id}")))
    }

    async fn send_text(&self, room_id: &str, text: &str) -> Result<()> {
        self.send(
            room_id,
            OutboundMessage {
                text: Some(text.to_owned()),
                ..OutboundMessage::default()
            },
        )
        .await
    }

    async fn send(&self, room_id: &str, message: OutboundMessage) -> Result<()> {
        self.sent.lock().push((room_id.to_owned(), message));
        Ok(())
    }

    async fn list_webhooks(&self) -> Result<Vec<WebhookInfo>> {
        Ok(Vec::new())
    }

    async fn create_webhook(&self, _name: &str, _target_url: &str) -> Result<WebhookInfo> {
        Err(Error::Messaging("not scripted".into()))
    }

    async fn delete_webhook(&self, _webhook_id: &str) -> Result<()> {
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Harness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Harness {
    pub controller: DialogueController,
    pub store: Arc<SessionStore>,
    pub intent: Arc<MockIntent>,
    pub medical: Arc<MockMedical>,
    pub geocoding: Arc<MockGeocoding>,
    pub directory: Arc<MockDirectory>,
    pub encyclopedia: Arc<MockEncyclopedia>,
    pub messaging: Arc<MockMessaging>,
    pub specialties: Arc<SpecialtyIndex>,
}

pub fn harness() -> Harness {
    let mut config = Config::default();
    config.dialogue.reply_delay_ms = 0;
    let config = Arc::new(config);

    let store = Arc::new(SessionStore::ephemeral());
    let intent = Arc::new(MockIntent::default());
    let medical = Arc::new(MockMedical::default());
    let geocoding = Arc::new(MockGeocoding::default());
    let directory = Arc::new(MockDirectory::default());
    let encyclopedia = Arc::new(MockEncyclopedia::default());
    let messaging = Arc::new(MockMessaging::default());

    let specialties = Arc::new(SpecialtyIndex::new(config.dialogue.specialty_similarity));
    specialties.replace(vec![
        Specialty {
            uid: "c1".into(),
            name: "Cardiology".into(),
        },
        Specialty {
            uid: "d1".into(),
            name: "Dermatology".into(),
        },
    ]);

    let bot = BotIdentity {
        id: "bot-id".into(),
        name: "Diana".into(),
        short_name: String::new(),
        emails: vec!["diana@sparkbot.io".into()],
        email_domain: "sparkbot.io".into(),
    };

    let controller = DialogueController {
        config,
        store: store.clone(),
        intent: intent.clone(),
        medical: medical.clone(),
        geocoding: geocoding.clone(),
        directory: directory.clone(),
        encyclopedia: encyclopedia.clone(),
        messaging: messaging.clone(),
        specialties: specialties.clone(),
        bot,
    };

    Harness {
        controller,
        store,
        intent,
        medical,
        geocoding,
        directory,
        encyclopedia,
        messaging,
        specialties,
    }
}

/// A messages/created delivery.
pub fn message_delivery(room_id: &str, message_id: &str) -> WebhookDelivery {
    serde_json::from_value(serde_json::json!({
        "resource": "messages",
        "event": "created",
        "data": {
            "id": message_id,
            "roomId": room_id,
            "personId": "user-1",
            "personEmail": "user@example.com"
        }
    }))
    .unwrap()
}

pub fn membership_delivery(room_id: &str) -> WebhookDelivery {
    serde_json::from_value(serde_json::json!({
        "resource": "memberships",
        "event": "created",
        "data": {
            "roomId": room_id,
            "personId": "user-1",
            "personEmail": "user@example.com"
        }
    }))
    .unwrap()
}

/// An intent reply carrying just an action and parameters.
pub fn action_reply(action: &str, parameters: Value) -> IntentReply {
    IntentReply {
        action: Some(action.to_owned()),
        parameters: parameters.as_object().cloned().unwrap_or_default(),
        ..IntentReply::default()
    }
}

/// An intent reply carrying just speech.
pub fn speech_reply(speech: &str) -> IntentReply {
    IntentReply {
        speech: Some(speech.to_owned()),
        ..IntentReply::default()
    }
}
