//! Symptom parsing and the diagnosis loop.
//!
//! A cycle alternates medical-service calls with intent-service events
//! until a candidate condition crosses the conclusion threshold or the
//! question budget runs out, then concludes: snapshot the cycle into the
//! `old_*` fields, clear the session, persist, and announce the condition
//! enriched with encyclopedia material.

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use diana_domain::triage::Evidence;
use diana_providers::{DiagnosisExtras, DiagnosisRequest};
use diana_sessions::Session;

use crate::api::webhook::WebhookDelivery;

use super::controller::{nickname_params, DialogueController};
use super::{
    ASK_MORE_SYMPTOMS_EVENT, ASK_SYMPTOMS_EVENT, ASK_USER_INFO_EVENT, FINAL_CONDITION_EVENT,
    NOT_ENOUGH_SYMPTOMS_EVENT,
};

impl DialogueController {
    /// Extract symptoms from free text and advance the cycle.
    pub(crate) async fn parse_symptoms(
        &self,
        session: &mut Session,
        text: &str,
        delivery: &WebhookDelivery,
    ) -> String {
        let mentions = match self.medical.parse(text).await {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(room_id = %session.room_id, error = %e, "symptom parse failed");
                self.send_unavailable(&session.room_id).await;
                return "Error while call to medical service".into();
            }
        };

        if !mentions.is_empty() {
            session
                .evidence
                .extend(mentions.into_iter().map(Evidence::from));

            if session.ask_symptoms_count == 0 {
                session.ask_symptoms_count += 1;
                self.send_intent_event(session, ASK_MORE_SYMPTOMS_EVENT, Map::new(), delivery)
                    .await
            } else {
                self.request_diagnosis(session, delivery).await
            }
        } else if session.ask_symptoms_count == 0 {
            session.ask_symptoms_count += 1;
            let params = nickname_params(session);
            self.send_intent_event(session, ASK_SYMPTOMS_EVENT, params, delivery)
                .await
        } else if !session.evidence.is_empty() {
            self.request_diagnosis(session, delivery).await
        } else {
            // Asked twice, got nothing usable. End the cycle.
            session.clear();
            self.send_intent_event(session, NOT_ENOUGH_SYMPTOMS_EVENT, Map::new(), delivery)
                .await
        }
    }

    /// Run one diagnosis round: conclude on a confident candidate, force a
    /// conclusion past the question budget, otherwise pose the follow-up
    /// question.  Boxed because answering the question re-enters here.
    pub(crate) fn request_diagnosis<'a>(
        &'a self,
        session: &'a mut Session,
        delivery: &'a WebhookDelivery,
    ) -> BoxFuture<'a, String> {
        Box::pin(async move {
            let (Some(age), Some(sex)) = (session.age, session.sex.clone()) else {
                return self
                    .send_intent_event(session, ASK_USER_INFO_EVENT, Map::new(), delivery)
                    .await;
            };

            let request = DiagnosisRequest {
                sex,
                age,
                evidence: session.evidence.clone(),
                extras: DiagnosisExtras {
                    ignore_groups: true,
                },
            };

            let response = match self.medical.diagnose(&request).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(room_id = %session.room_id, error = %e, "diagnosis failed");
                    self.send_unavailable(&session.room_id).await;
                    return "Error while call to medical service".into();
                }
            };

            let threshold = self.config.dialogue.conclusion_threshold;
            if let Some(candidate) = response
                .conditions
                .iter()
                .find(|c| c.probability > threshold)
            {
                let (id, probability) = (candidate.id.clone(), candidate.probability);
                return self.conclude(session, &id, probability, delivery).await;
            }

            if session.questions_count > self.config.dialogue.max_questions {
                return match response.conditions.first() {
                    Some(top) => {
                        let (id, probability) = (top.id.clone(), top.probability);
                        self.conclude(session, &id, probability, delivery).await
                    }
                    None => {
                        tracing::error!(room_id = %session.room_id, "question budget spent with no candidates");
                        self.send_unavailable(&session.room_id).await;
                        "Error while call to medical service".into()
                    }
                };
            }

            if let Some(question) = response.question {
                let text = question.text.clone();
                session.pending_question = Some(question);
                session.questions_count += 1;

                return match self.messaging.send_text(&session.room_id, &text).await {
                    Ok(()) => "Reply sent".into(),
                    Err(e) => {
                        tracing::error!(room_id = %session.room_id, error = %e, "sending follow-up question failed");
                        "Error while sending reply".into()
                    }
                };
            }

            tracing::warn!(
                room_id = %session.room_id,
                conditions = response.conditions.len(),
                "diagnosis returned neither a confident candidate nor a question"
            );
            "Received empty result".into()
        })
    }

    /// Conclude the cycle with the given candidate.
    async fn conclude(
        &self,
        session: &mut Session,
        condition_id: &str,
        probability: f64,
        delivery: &WebhookDelivery,
    ) -> String {
        let detail = match self.medical.condition(condition_id).await {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(room_id = %session.room_id, condition_id = %condition_id, error = %e, "condition lookup failed");
                self.send_unavailable(&session.room_id).await;
                return "Error while call to medical service".into();
            }
        };

        session.old_evidence = std::mem::take(&mut session.evidence);
        session.old_condition = Some(detail.clone());
        session.clear();

        // The concluded record is the one worth surviving a restart.
        self.store.put(session.clone());
        self.store.persist();

        let mut params = Map::new();
        params.insert(
            "probability".into(),
            Value::from((probability * 100.0).trunc() as i64),
        );
        params.insert("condition".into(), Value::String(detail.name.clone()));
        if let Some(hint) = &detail.hint {
            params.insert("recommendation".into(), Value::String(hint.clone()));
        }

        match self.encyclopedia.image(&detail.name).await {
            Ok(Some(link)) => {
                params.insert("image".into(), Value::String(link));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(condition = %detail.name, error = %e, "encyclopedia image lookup failed")
            }
        }
        match self.encyclopedia.summary(&detail.name).await {
            Ok(Some(summary)) => {
                params.insert("description".into(), Value::String(summary.description));
                params.insert(
                    "condition".into(),
                    Value::String(format!("[{}]({})", detail.name, summary.link)),
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(condition = %detail.name, error = %e, "encyclopedia summary lookup failed")
            }
        }

        tracing::info!(
            room_id = %session.room_id,
            condition = %detail.name,
            probability = probability,
            "diagnosis concluded"
        );

        self.send_intent_event(session, FINAL_CONDITION_EVENT, params, delivery)
            .await
    }
}
