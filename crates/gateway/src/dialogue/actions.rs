//! Action dispatch and pending-question resolution.
//!
//! Actions come back from the intent service attached to a classified
//! reply.  A handled action consumes the turn (the ack is returned);
//! an unhandled one falls through to plain reply delivery.

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use diana_domain::triage::{DialoguePhase, Evidence};
use diana_providers::{IntentReply, OutboundMessage};
use diana_sessions::Session;

use crate::api::webhook::WebhookDelivery;

use super::controller::{nickname_params, DialogueController};
use super::{
    ASK_SYMPTOMS_EVENT, ASK_USER_INFO_EVENT, CANCEL_ACTION, CANT_FIND_SPECIALTY_EVENT,
    DIAGNOSTICS_START_ACTION, DIAGNOSTICS_START_EVENT, INFERMEDICA_FALLBACK_EVENT,
    INPUT_UNKNOWN_ACTION, NO_ENCYCLOPEDIA_RESULT_REPLY, SEARCH_DOCTOR_AFTER_DIAGNOSIS_ACTION,
    SEARCH_DOCTOR_ASK_ADDRESS_EVENT, UPDATE_USER_INFO_ACTION, WIKIPEDIA_SEARCH_ACTION,
};

impl DialogueController {
    /// Dispatch a classified action.  `Some(ack)` means the action was
    /// handled; `None` falls through to delivering the reply as-is.
    pub(crate) fn process_action<'a>(
        &'a self,
        session: &'a mut Session,
        action: &'a str,
        reply: &'a IntentReply,
        raw_text: Option<&'a str>,
        delivery: &'a WebhookDelivery,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            match action {
                DIAGNOSTICS_START_ACTION => Some(if session.has_user_info() {
                    let params = nickname_params(session);
                    self.send_intent_event(session, ASK_SYMPTOMS_EVENT, params, delivery)
                        .await
                } else {
                    self.send_intent_event(session, ASK_USER_INFO_EVENT, Map::new(), delivery)
                        .await
                }),

                UPDATE_USER_INFO_ACTION => {
                    let age = reply.parameters.get("age").and_then(param_age);
                    let sex = reply
                        .parameters
                        .get("sex")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty());

                    Some(match (age, sex) {
                        (Some(age), Some(sex)) => {
                            session.age = Some(age);
                            session.sex = Some(sex.to_owned());

                            let params = nickname_params(session);
                            self.send_intent_event(session, ASK_SYMPTOMS_EVENT, params, delivery)
                                .await
                        }
                        _ => {
                            self.send_intent_event(session, ASK_USER_INFO_EVENT, Map::new(), delivery)
                                .await
                        }
                    })
                }

                SEARCH_DOCTOR_AFTER_DIAGNOSIS_ACTION => {
                    let category = session
                        .old_condition
                        .as_ref()
                        .and_then(|c| c.categories.first())
                        .cloned();
                    let uid = category.as_deref().and_then(|c| self.specialties.resolve(c));

                    Some(match uid {
                        Some(uid) => {
                            session.pending_specialty = Some(uid.clone());
                            session.phase = DialoguePhase::AwaitingAddress;

                            let mut params = Map::new();
                            params.insert("specialty".into(), Value::String(uid));
                            self.send_intent_event(
                                session,
                                SEARCH_DOCTOR_ASK_ADDRESS_EVENT,
                                params,
                                delivery,
                            )
                            .await
                        }
                        None => {
                            self.send_intent_event(
                                session,
                                CANT_FIND_SPECIALTY_EVENT,
                                Map::new(),
                                delivery,
                            )
                            .await
                        }
                    })
                }

                WIKIPEDIA_SEARCH_ACTION => {
                    let term = reply
                        .parameters
                        .get("q")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    Some(self.encyclopedia_search(session, term).await)
                }

                INPUT_UNKNOWN_ACTION if session.phase != DialoguePhase::DiagnosticsInProgress => {
                    match raw_text {
                        Some(text) => Some(self.offer_diagnosis(session, text, reply, delivery).await),
                        None => None,
                    }
                }

                _ => None,
            }
        })
    }

    /// Resolve a reply against the session's pending follow-up question.
    /// `Some(ack)` consumes the turn; `None` means there was nothing
    /// pending (or the user cancelled and the reply should still go out).
    pub(crate) async fn process_pending_answer(
        &self,
        session: &mut Session,
        reply: &IntentReply,
        delivery: &WebhookDelivery,
    ) -> Option<String> {
        if session.phase != DialoguePhase::DiagnosticsInProgress {
            return None;
        }
        let question = session.pending_question.clone()?;
        let action = reply.action.as_deref().unwrap_or_default();

        if action == CANCEL_ACTION {
            session.clear();
            return None;
        }

        if let Some(item) = question.items.first() {
            if let Some(choice) = item.choices.iter().find(|c| c.id == action) {
                session.evidence.push(Evidence {
                    id: item.id.clone(),
                    choice_id: choice.id.clone(),
                });
                session.pending_question = None;
                return Some(self.request_diagnosis(session, delivery).await);
            }
        }

        Some(
            self.send_intent_event(session, INFERMEDICA_FALLBACK_EVENT, Map::new(), delivery)
                .await,
        )
    }

    async fn encyclopedia_search(&self, session: &Session, term: &str) -> String {
        match self.encyclopedia.summary(term).await {
            Ok(Some(summary)) => {
                let message = OutboundMessage {
                    markdown: Some(format!(
                        "{} [More ...]({})",
                        summary.description, summary.link
                    )),
                    ..OutboundMessage::default()
                };
                match self.messaging.send(&session.room_id, message).await {
                    Ok(()) => "Reply sent".into(),
                    Err(e) => {
                        tracing::error!(room_id = %session.room_id, error = %e, "sending encyclopedia result failed");
                        "Error while sending reply".into()
                    }
                }
            }
            Ok(None) => self.send_no_encyclopedia_result(session).await,
            Err(e) => {
                tracing::warn!(term = %term, error = %e, "encyclopedia search failed");
                self.send_no_encyclopedia_result(session).await
            }
        }
    }

    async fn send_no_encyclopedia_result(&self, session: &Session) -> String {
        match self
            .messaging
            .send_text(&session.room_id, NO_ENCYCLOPEDIA_RESULT_REPLY)
            .await
        {
            Ok(()) => "Reply sent".into(),
            Err(e) => {
                tracing::error!(room_id = %session.room_id, error = %e, "sending reply failed");
                "Error while sending reply".into()
            }
        }
    }

    /// Unintelligible input outside a diagnosis: if it still mentions
    /// symptoms, offer to start one; otherwise let the fallback reply
    /// through.
    async fn offer_diagnosis(
        &self,
        session: &mut Session,
        text: &str,
        reply: &IntentReply,
        delivery: &WebhookDelivery,
    ) -> String {
        match self.medical.parse(text).await {
            Ok(mentions) if !mentions.is_empty() => {
                self.send_intent_event(session, DIAGNOSTICS_START_EVENT, Map::new(), delivery)
                    .await
            }
            Ok(_) => self.deliver_reply(session, reply).await,
            Err(e) => {
                tracing::error!(room_id = %session.room_id, error = %e, "symptom parse failed");
                self.send_unavailable(&session.room_id).await;
                "Error while call to medical service".into()
            }
        }
    }
}

/// Age parameters arrive in several shapes: a bare number, a unit-amount
/// object, or a numeric string.
fn param_age(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::Object(map) => map.get("amount").and_then(param_age),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
