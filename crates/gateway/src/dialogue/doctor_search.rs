//! Doctor search sub-flow: address → coordinates → directory search →
//! one formatted message per provider.

use serde_json::{Map, Value};

use diana_domain::triage::DialoguePhase;
use diana_providers::{Doctor, IntentReply, OutboundMessage};
use diana_sessions::Session;

use crate::api::webhook::WebhookDelivery;

use super::controller::DialogueController;
use super::{CANT_FIND_ADDRESS_EVENT, CANT_FIND_DOCTORS_EVENT, CANT_FIND_SPECIALTY_EVENT};

impl DialogueController {
    /// Run the search once the user has supplied an address.  `Some(ack)`
    /// consumes the turn; `None` means the session is not waiting for an
    /// address.
    pub(crate) async fn process_doctor_search(
        &self,
        session: &mut Session,
        reply: &IntentReply,
        delivery: &WebhookDelivery,
    ) -> Option<String> {
        if session.phase != DialoguePhase::AwaitingAddress {
            return None;
        }

        let address = str_param(reply, "address").or_else(|| str_param(reply, "city"));
        let Some(address) = address else {
            return Some(
                self.send_intent_event(session, CANT_FIND_ADDRESS_EVENT, Map::new(), delivery)
                    .await,
            );
        };

        // The flow ends here whatever happens next.
        session.phase = DialoguePhase::Idle;
        let Some(specialty) = session.pending_specialty.take() else {
            return Some(
                self.send_intent_event(session, CANT_FIND_SPECIALTY_EVENT, Map::new(), delivery)
                    .await,
            );
        };

        let location = match self.geocoding.geocode(&address).await {
            Ok(Some(point)) => point,
            Ok(None) => {
                return Some(
                    self.send_intent_event(session, CANT_FIND_ADDRESS_EVENT, Map::new(), delivery)
                        .await,
                );
            }
            Err(e) => {
                tracing::error!(room_id = %session.room_id, error = %e, "geocoding failed");
                return Some(
                    self.send_intent_event(session, CANT_FIND_ADDRESS_EVENT, Map::new(), delivery)
                        .await,
                );
            }
        };

        let doctors = match self.directory.find_doctors(location, &specialty).await {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(room_id = %session.room_id, error = %e, "doctor search failed");
                return Some(
                    self.send_intent_event(session, CANT_FIND_DOCTORS_EVENT, Map::new(), delivery)
                        .await,
                );
            }
        };
        if doctors.is_empty() {
            return Some(
                self.send_intent_event(session, CANT_FIND_DOCTORS_EVENT, Map::new(), delivery)
                    .await,
            );
        }

        tracing::info!(
            room_id = %session.room_id,
            specialty = %specialty,
            doctors = doctors.len(),
            "doctor search completed"
        );

        for message in format_doctor_messages(&doctors) {
            if let Err(e) = self.messaging.send(&session.room_id, message).await {
                tracing::error!(room_id = %session.room_id, error = %e, "sending doctor card failed");
                return Some("Error while sending reply".into());
            }
            self.pace().await;
        }

        Some("Reply sent".into())
    }
}

fn str_param<'a>(reply: &'a IntentReply, key: &str) -> Option<String> {
    reply
        .parameters
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// One markdown card per provider, skipping providers with no practice
/// inside the search area.
pub(crate) fn format_doctor_messages(doctors: &[Doctor]) -> Vec<OutboundMessage> {
    doctors.iter().filter_map(format_doctor).collect()
}

fn format_doctor(doctor: &Doctor) -> Option<OutboundMessage> {
    let mut practices = String::from("**Practices:**\n");
    let mut in_area = false;

    for practice in doctor.practices.iter().filter(|p| p.within_search_area) {
        in_area = true;

        match &practice.website {
            Some(site) => practices.push_str(&format!("- [{}]({})\n\n", practice.name, site)),
            None => practices.push_str(&format!("- {}\n\n", practice.name)),
        }

        for phone in practice.phones.iter().filter(|p| p.kind == "landline") {
            practices.push_str(&format!("\t**Phone:** {}\n\n", phone.number));
        }

        if let Some(addr) = &practice.visit_address {
            practices.push_str(&format!(
                "\t**Address:** [{}, {}, {}](https://www.google.com/maps/search/{},{})\n",
                addr.street, addr.city, addr.state_long, addr.lat, addr.lon
            ));
        }
    }

    if !in_area {
        return None;
    }

    let mut markdown = format!(
        "**Dr. {} {}, {}**\n\n",
        doctor.profile.first_name, doctor.profile.last_name, doctor.profile.title
    );
    markdown.push_str(&doctor.profile.bio);
    markdown.push_str("\n\n");
    markdown.push_str(&practices);

    Some(OutboundMessage {
        markdown: Some(markdown),
        files: doctor.profile.image_url.clone().map(|url| vec![url]),
        ..OutboundMessage::default()
    })
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn doctor(json: serde_json::Value) -> Doctor {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn providers_without_nearby_practices_are_dropped() {
        let doctors = vec![
            doctor(serde_json::json!({
                "profile": {"first_name": "Jane", "last_name": "Doe", "title": "MD",
                            "bio": "Cardiologist.", "image_url": "https://img.example/jane.jpg"},
                "practices": [
                    {"name": "Near Clinic", "within_search_area": true,
                     "website": "https://near.example",
                     "phones": [{"number": "555-0101", "type": "landline"},
                                {"number": "555-0102", "type": "fax"}],
                     "visit_address": {"street": "1 Main St", "city": "Springfield",
                                       "state_long": "Illinois", "lat": 39.78, "lon": -89.65}}
                ]
            })),
            doctor(serde_json::json!({
                "profile": {"first_name": "Far", "last_name": "Away", "title": "DO"},
                "practices": [{"name": "Far Clinic", "within_search_area": false}]
            })),
        ];

        let messages = format_doctor_messages(&doctors);
        assert_eq!(messages.len(), 1);

        let markdown = messages[0].markdown.as_deref().unwrap();
        assert!(markdown.starts_with("**Dr. Jane Doe, MD**"));
        assert!(markdown.contains("[Near Clinic](https://near.example)"));
        assert!(markdown.contains("**Phone:** 555-0101"));
        assert!(!markdown.contains("555-0102"));
        assert!(markdown.contains(
            "[1 Main St, Springfield, Illinois](https://www.google.com/maps/search/39.78,-89.65)"
        ));
        assert_eq!(
            messages[0].files.as_deref(),
            Some(&["https://img.example/jane.jpg".to_string()][..])
        );
    }

    #[test]
    fn practice_without_website_is_plain_text() {
        let doctors = vec![doctor(serde_json::json!({
            "profile": {"first_name": "A", "last_name": "B", "title": "MD"},
            "practices": [{"name": "Walk-in", "within_search_area": true}]
        }))];

        let messages = format_doctor_messages(&doctors);
        let markdown = messages[0].markdown.as_deref().unwrap();
        assert!(markdown.contains("- Walk-in\n\n"));
        assert!(messages[0].files.is_none());
    }

    #[test]
    fn all_providers_out_of_area_yields_no_messages() {
        let doctors = vec![doctor(serde_json::json!({
            "profile": {"first_name": "Far", "last_name": "Away", "title": "DO"},
            "practices": [{"name": "Far Clinic", "within_search_area": false}]
        }))];
        assert!(format_doctor_messages(&doctors).is_empty());
    }
}
