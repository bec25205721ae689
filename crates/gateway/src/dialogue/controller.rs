//! Delivery handling and reply plumbing for the dialogue controller.
//!
//! Every public entry point returns the acknowledgment message placed in
//! the webhook's 200 response; failures are logged and folded into that
//! message, never propagated to the platform.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Map, Value};

use diana_domain::config::Config;
use diana_domain::triage::DialoguePhase;
use diana_providers::{
    DirectoryService, EncyclopediaService, GeocodingService, IntentMessage, IntentReply,
    IntentService, MedicalService, MessagingService, OutboundMessage,
};
use diana_sessions::{Session, SessionStore};

use crate::api::webhook::{Resource, WebhookDelivery};
use crate::identity::BotIdentity;

use super::specialty::SpecialtyIndex;
use super::{
    DIAGNOSTICS_IN_PROGRESS_CONTEXT, SEARCH_DOCTOR_ADDRESS_CONTEXT,
    SEARCH_DOCTOR_SPECIALTY_CONTEXT, SEARCH_DOCTOR_ASK_ADDRESS_EVENT, CANT_FIND_SPECIALTY_EVENT,
    SERVICE_UNAVAILABLE_REPLY, WELCOME_EVENT,
};

pub struct DialogueController {
    pub(crate) config: Arc<Config>,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) intent: Arc<dyn IntentService>,
    pub(crate) medical: Arc<dyn MedicalService>,
    pub(crate) geocoding: Arc<dyn GeocodingService>,
    pub(crate) directory: Arc<dyn DirectoryService>,
    pub(crate) encyclopedia: Arc<dyn EncyclopediaService>,
    pub(crate) messaging: Arc<dyn MessagingService>,
    pub(crate) specialties: Arc<SpecialtyIndex>,
    pub(crate) bot: BotIdentity,
}

impl DialogueController {
    /// Handle one webhook delivery end to end and return the ack message.
    pub async fn handle_delivery(&self, delivery: &WebhookDelivery) -> String {
        match (delivery.resource, delivery.event.as_str()) {
            (Resource::Messages, "created") => self.handle_message(delivery).await,
            (Resource::Memberships | Resource::Rooms, "created") => {
                self.handle_room_created(delivery).await
            }
            _ => "Ignored".into(),
        }
    }

    async fn handle_message(&self, delivery: &WebhookDelivery) -> String {
        let (Some(message_id), Some(room_id)) =
            (delivery.data.id.as_deref(), delivery.data.room_id.as_deref())
        else {
            return "Ignored".into();
        };

        if self.bot.is_self(
            delivery.data.person_id.as_deref(),
            delivery.data.person_email.as_deref(),
        ) {
            return "Message from bot. Ignoring".into();
        }

        let mut session = self
            .resolve_session(room_id, delivery.data.person_id.as_deref())
            .await;

        let message = match self.messaging.message(message_id).await {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(room_id = %room_id, error = %e, "loading message failed");
                return "Error while loading message".into();
            }
        };

        let Some(text) = message.text else {
            return "Empty message. Ignoring".into();
        };
        let text = self.bot.strip_mention(&text);
        let text = text.trim();

        tracing::debug!(
            room_id = %room_id,
            phase = ?session.phase,
            pending_question = session.pending_question.is_some(),
            "routing message"
        );

        let ack = self.route_message(&mut session, text, delivery).await;

        session.touch();
        self.store.put(session);
        ack
    }

    async fn handle_room_created(&self, delivery: &WebhookDelivery) -> String {
        let Some(room_id) = delivery.data.room_id.as_deref() else {
            return "Ignored".into();
        };

        let mut session = self
            .resolve_session(room_id, delivery.data.person_id.as_deref())
            .await;

        let params = nickname_params(&session);
        let ack = self
            .send_intent_event(&mut session, WELCOME_EVENT, params, delivery)
            .await;

        session.touch();
        self.store.put(session);
        ack
    }

    /// Load the room's session, creating one (with a best-effort nickname
    /// lookup) on first contact.
    async fn resolve_session(&self, room_id: &str, person_id: Option<&str>) -> Session {
        if let Some(existing) = self.store.get(room_id) {
            return existing;
        }

        let nickname = match person_id {
            Some(id) => match self.messaging.person(id).await {
                Ok(profile) => profile.nick_name.or(profile.display_name),
                Err(e) => {
                    tracing::warn!(room_id = %room_id, error = %e, "person lookup failed");
                    None
                }
            },
            None => None,
        };

        let (session, created) = self.store.resolve_or_create(room_id, nickname);
        if created {
            tracing::info!(room_id = %room_id, session_id = %session.session_id, "session created");
        }
        session
    }

    /// Phase routing, first match wins.
    async fn route_message(
        &self,
        session: &mut Session,
        text: &str,
        delivery: &WebhookDelivery,
    ) -> String {
        match session.phase {
            DialoguePhase::DiagnosticsInProgress if session.pending_question.is_some() => {
                self.send_intent_text(session, text, delivery).await
            }
            DialoguePhase::DiagnosticsInProgress => {
                self.parse_symptoms(session, text, delivery).await
            }
            DialoguePhase::AwaitingSpecialty => {
                self.resolve_specialty_input(session, text, delivery).await
            }
            _ => self.send_intent_text(session, text, delivery).await,
        }
    }

    async fn resolve_specialty_input(
        &self,
        session: &mut Session,
        text: &str,
        delivery: &WebhookDelivery,
    ) -> String {
        match self.specialties.resolve(text) {
            Some(uid) => {
                session.pending_specialty = Some(uid.clone());
                session.phase = DialoguePhase::AwaitingAddress;

                let mut params = Map::new();
                params.insert("specialty".into(), Value::String(uid));
                self.send_intent_event(session, SEARCH_DOCTOR_ASK_ADDRESS_EVENT, params, delivery)
                    .await
            }
            None => {
                self.send_intent_event(session, CANT_FIND_SPECIALTY_EVENT, Map::new(), delivery)
                    .await
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Intent round-trips
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Classify free text and act on the result.  Boxed because the action
    /// table can re-enter the intent round-trip.
    pub(crate) fn send_intent_text<'a>(
        &'a self,
        session: &'a mut Session,
        text: &'a str,
        delivery: &'a WebhookDelivery,
    ) -> BoxFuture<'a, String> {
        Box::pin(async move {
            let original = original_payload(delivery);
            let contexts = phase_contexts(session.phase);

            let reply = match self
                .intent
                .classify_text(text, &session.session_id, &contexts, &original)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(room_id = %session.room_id, error = %e, "intent classification failed");
                    return "Error while call to intent service".into();
                }
            };
            self.apply_contexts(session, &reply);

            if let Some(ack) = self.process_doctor_search(session, &reply, delivery).await {
                return ack;
            }
            if let Some(ack) = self.process_pending_answer(session, &reply, delivery).await {
                return ack;
            }
            if let Some(action) = reply.action.clone() {
                if let Some(ack) = self
                    .process_action(session, &action, &reply, Some(text), delivery)
                    .await
                {
                    return ack;
                }
            }

            self.deliver_reply(session, &reply).await
        })
    }

    /// Fire a named event at the intent service and act on the result.
    pub(crate) fn send_intent_event<'a>(
        &'a self,
        session: &'a mut Session,
        event: &'a str,
        parameters: Map<String, Value>,
        delivery: &'a WebhookDelivery,
    ) -> BoxFuture<'a, String> {
        Box::pin(async move {
            let original = original_payload(delivery);
            let contexts = phase_contexts(session.phase);

            let reply = match self
                .intent
                .classify_event(event, parameters, &session.session_id, &contexts, &original)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(room_id = %session.room_id, event = %event, error = %e, "intent event failed");
                    return "Error while call to intent service".into();
                }
            };
            self.apply_contexts(session, &reply);

            if let Some(action) = reply.action.clone() {
                if let Some(ack) = self
                    .process_action(session, &action, &reply, None, delivery)
                    .await
                {
                    return ack;
                }
            }

            self.deliver_reply(session, &reply).await
        })
    }

    /// Move the session into the phase named by the reply's context
    /// markers.  Replies without a marker leave the phase alone.
    fn apply_contexts(&self, session: &mut Session, reply: &IntentReply) {
        for name in &reply.contexts {
            session.phase = match name.as_str() {
                DIAGNOSTICS_IN_PROGRESS_CONTEXT => DialoguePhase::DiagnosticsInProgress,
                SEARCH_DOCTOR_SPECIALTY_CONTEXT => DialoguePhase::AwaitingSpecialty,
                SEARCH_DOCTOR_ADDRESS_CONTEXT => DialoguePhase::AwaitingAddress,
                _ => continue,
            };
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Outbound replies
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Deliver an intent reply: rich messages win over plain speech.
    pub(crate) async fn deliver_reply(&self, session: &Session, reply: &IntentReply) -> String {
        if !reply.messages.is_empty() {
            let outbound = rich_to_outbound(&reply.messages);
            if outbound.is_empty() {
                return "Received empty speech".into();
            }
            for message in outbound {
                if let Err(e) = self.messaging.send(&session.room_id, message).await {
                    tracing::error!(room_id = %session.room_id, error = %e, "sending reply failed");
                    return "Error while sending reply".into();
                }
                self.pace().await;
            }
            return "Reply sent".into();
        }

        if let Some(speech) = &reply.speech {
            return match self.messaging.send_text(&session.room_id, speech).await {
                Ok(()) => "Reply sent".into(),
                Err(e) => {
                    tracing::error!(room_id = %session.room_id, error = %e, "sending reply failed");
                    "Error while sending reply".into()
                }
            };
        }

        "Received empty speech".into()
    }

    /// Best-effort notice when an upstream service is down.
    pub(crate) async fn send_unavailable(&self, room_id: &str) {
        if let Err(e) = self
            .messaging
            .send_text(room_id, SERVICE_UNAVAILABLE_REPLY)
            .await
        {
            tracing::error!(room_id = %room_id, error = %e, "sending unavailability notice failed");
        }
    }

    /// Pause between consecutive sends so multi-message replies arrive in
    /// order on the client.
    pub(crate) async fn pace(&self) {
        let delay = self.config.dialogue.reply_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One variant inside a kind-4 custom payload.
#[derive(Deserialize, Default)]
struct RichPayloadMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    files: Option<Vec<String>>,
    #[serde(default)]
    image: Option<String>,
}

/// Convert fulfillment messages to platform messages.  Kind 0 carries
/// plain speech; kind 4 carries a list of platform payload variants of
/// which one is picked at random.
pub(crate) fn rich_to_outbound(messages: &[IntentMessage]) -> Vec<OutboundMessage> {
    let mut outbound = Vec::new();

    for message in messages {
        match message.kind {
            0 => {
                if let Some(speech) = &message.speech {
                    outbound.push(OutboundMessage {
                        text: Some(speech.clone()),
                        ..OutboundMessage::default()
                    });
                }
            }
            4 => {
                let Some(variants) = message
                    .payload
                    .as_ref()
                    .and_then(|p| p.get("spark"))
                    .and_then(Value::as_array)
                else {
                    continue;
                };
                if variants.is_empty() {
                    continue;
                }

                let pick = rand::thread_rng().gen_range(0..variants.len());
                let payload: RichPayloadMessage = variants[pick]
                    .get("message")
                    .cloned()
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default();

                let mut files = payload.files.unwrap_or_default();
                if let Some(image) = payload.image.filter(|i| !i.is_empty()) {
                    files.push(image);
                }

                outbound.push(OutboundMessage {
                    text: payload.text,
                    markdown: payload.markdown,
                    files: (!files.is_empty()).then_some(files),
                });
            }
            _ => {}
        }
    }

    outbound
}

/// Context names the intent service should see for a phase.
pub(crate) fn phase_contexts(phase: DialoguePhase) -> Vec<String> {
    match phase {
        DialoguePhase::Idle => Vec::new(),
        DialoguePhase::DiagnosticsInProgress => vec![DIAGNOSTICS_IN_PROGRESS_CONTEXT.to_owned()],
        DialoguePhase::AwaitingSpecialty => vec![SEARCH_DOCTOR_SPECIALTY_CONTEXT.to_owned()],
        DialoguePhase::AwaitingAddress => vec![SEARCH_DOCTOR_ADDRESS_CONTEXT.to_owned()],
    }
}

/// The raw delivery, forwarded to the intent service as the platform
/// payload of the request.
pub(crate) fn original_payload(delivery: &WebhookDelivery) -> Value {
    serde_json::to_value(delivery).unwrap_or(Value::Null)
}

pub(crate) fn nickname_params(session: &Session) -> Map<String, Value> {
    let mut params = Map::new();
    if let Some(nickname) = &session.nickname {
        params.insert("nickname".into(), Value::String(nickname.clone()));
    }
    params
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn rich_conversion_keeps_speech_and_payload_messages() {
        let messages = vec![
            IntentMessage {
                kind: 0,
                speech: Some("Hello!".into()),
                payload: None,
            },
            IntentMessage {
                kind: 4,
                speech: None,
                payload: Some(serde_json::json!({
                    "spark": [
                        {"message": {"markdown": "**hi**", "image": "https://img.example/a.png"}}
                    ]
                })),
            },
        ];

        let outbound = rich_to_outbound(&messages);
        assert_eq!(outbound.len(), 2);
        assert_eq!(outbound[0].text.as_deref(), Some("Hello!"));
        assert_eq!(outbound[1].markdown.as_deref(), Some("**hi**"));
        assert_eq!(
            outbound[1].files.as_deref(),
            Some(&["https://img.example/a.png".to_string()][..])
        );
    }

    #[test]
    fn unknown_kinds_and_empty_payloads_are_skipped() {
        let messages = vec![
            IntentMessage {
                kind: 2,
                speech: Some("quick replies".into()),
                payload: None,
            },
            IntentMessage {
                kind: 4,
                speech: None,
                payload: Some(serde_json::json!({ "spark": [] })),
            },
        ];
        assert!(rich_to_outbound(&messages).is_empty());
    }

    #[test]
    fn phase_contexts_match_wire_names() {
        assert!(phase_contexts(DialoguePhase::Idle).is_empty());
        assert_eq!(
            phase_contexts(DialoguePhase::DiagnosticsInProgress),
            vec!["diagnosticsinprogress".to_string()]
        );
        assert_eq!(
            phase_contexts(DialoguePhase::AwaitingAddress),
            vec!["usersearchdoctoraddress".to_string()]
        );
    }
}
