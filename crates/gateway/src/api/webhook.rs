//! Platform webhook endpoint.
//!
//! The platform retries deliveries that do not come back 200, and a retry
//! storm against a broken upstream would only repeat the failure, so every
//! delivery is acknowledged with 200 and a status message describing what
//! happened to it.

use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Delivery shape
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Messages,
    Memberships,
    Rooms,
    #[serde(other)]
    Other,
}

/// One webhook delivery.  The payload only carries ids; message text is
/// fetched back through the messaging API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub resource: Resource,
    pub event: String,
    #[serde(default)]
    pub data: DeliveryData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub person_email: Option<String>,
}

fn ack(code: u16, message: &str) -> Value {
    json!({ "status": { "code": code, "message": message } })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn receive(
    State(state): State<AppState>,
    Json(delivery): Json<WebhookDelivery>,
) -> Json<Value> {
    tracing::debug!(
        resource = ?delivery.resource,
        event = %delivery.event,
        room_id = delivery.data.room_id.as_deref().unwrap_or(""),
        "webhook delivery"
    );

    let message = state.controller.handle_delivery(&delivery).await;
    Json(ack(200, &message))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_decodes_camel_case_data() {
        let delivery: WebhookDelivery = serde_json::from_value(json!({
            "resource": "messages",
            "event": "created",
            "data": {
                "id": "m-1",
                "roomId": "r-1",
                "personId": "p-1",
                "personEmail": "user@example.com"
            }
        }))
        .unwrap();

        assert_eq!(delivery.resource, Resource::Messages);
        assert_eq!(delivery.data.room_id.as_deref(), Some("r-1"));
        assert_eq!(delivery.data.person_email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn unknown_resource_is_tolerated() {
        let delivery: WebhookDelivery = serde_json::from_value(json!({
            "resource": "attachmentActions",
            "event": "created",
            "data": {}
        }))
        .unwrap();
        assert_eq!(delivery.resource, Resource::Other);
    }

    #[test]
    fn ack_carries_code_and_message() {
        let value = ack(200, "Reply sent");
        assert_eq!(value["status"]["code"], 200);
        assert_eq!(value["status"]["message"], "Reply sent");
    }
}
