//! Messaging-platform client (Cisco Spark REST surface).
//!
//! The webhook only carries message ids, so the controller reads the
//! text back through `message`, resolves people through `person`, and
//! sends replies as plain text or markdown with optional file
//! attachments.  Webhook management is used once at startup.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use diana_domain::config::MessagingConfig;
use diana_domain::error::{Error, Result};

use crate::traits::MessagingService;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProfile {
    pub id: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMessage {
    pub id: String,
    pub room_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub person_email: Option<String>,
}

/// Outbound message body.  At least one of `text`/`markdown` should be
/// set; `files` attaches images by URL.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInfo {
    pub id: String,
    pub name: String,
    pub target_url: String,
}

#[derive(Deserialize)]
struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendPayload<'a> {
    room_id: &'a str,
    #[serde(flatten)]
    message: OutboundMessage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWebhookPayload<'a> {
    name: &'a str,
    target_url: &'a str,
    resource: &'static str,
    event: &'static str,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct RestMessagingClient {
    http: Client,
    base_url: String,
    token: String,
}

impl RestMessagingClient {
    pub fn new(cfg: &MessagingConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            token: cfg.token.clone().unwrap_or_default(),
        })
    }

    fn request(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.bearer_auth(&self.token)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .request(self.http.get(&url))
            .send()
            .await
            .map_err(|e| Error::Messaging(format!("{path}: {e}")))?;
        Self::decode(path, resp).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(path = %path, status = %status, "platform request rejected");
            return Err(Error::Messaging(format!(
                "{path} returned {status}: {body}"
            )));
        }
        resp.json()
            .await
            .map_err(|e| Error::Messaging(format!("decoding {path} response: {e}")))
    }
}

#[async_trait::async_trait]
impl MessagingService for RestMessagingClient {
    async fn me(&self) -> Result<PersonProfile> {
        self.get_json("people/me").await
    }

    async fn person(&self, person_id: &str) -> Result<PersonProfile> {
        self.get_json(&format!("people/{person_id}")).await
    }

    async fn message(&self, message_id: &str) -> Result<PlatformMessage> {
        self.get_json(&format!("messages/{message_id}")).await
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
        let url = format!("{}/messages", self.base_url);
        let payload = SendPayload { room_id, message };
        let resp = self
            .request(self.http.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Messaging(format!("messages: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(room_id = %room_id, status = %status, "message send rejected");
            return Err(Error::Messaging(format!(
                "messages returned {status}: {body}"
            )));
        }
        Ok(())
    }

    async fn list_webhooks(&self) -> Result<Vec<WebhookInfo>> {
        let envelope: ItemsEnvelope<WebhookInfo> = self.get_json("webhooks").await?;
        Ok(envelope.items)
    }

    async fn create_webhook(&self, name: &str, target_url: &str) -> Result<WebhookInfo> {
        let url = format!("{}/webhooks", self.base_url);
        let payload = CreateWebhookPayload {
            name,
            target_url,
            resource: "all",
            event: "all",
        };
        let resp = self
            .request(self.http.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Messaging(format!("webhooks: {e}")))?;
        Self::decode("webhooks", resp).await
    }

    async fn delete_webhook(&self, webhook_id: &str) -> Result<()> {
        let url = format!("{}/webhooks/{webhook_id}", self.base_url);
        let resp = self
            .request(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| Error::Messaging(format!("webhooks: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Messaging(format!(
                "webhooks delete returned {status}: {body}"
            )));
        }
        Ok(())
    }
}
