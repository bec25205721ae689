//! Intent-recognition client (api.ai v1 `/query` protocol).
//!
//! Both text queries and named events go through the same endpoint; the
//! reply carries fulfillment speech, optional rich messages, a recognized
//! action with parameters, and the active context names.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use diana_domain::config::IntentConfig;
use diana_domain::error::{Error, Result};

use crate::traits::IntentService;

const PROTOCOL_VERSION: &str = "20150910";
const REQUEST_SOURCE: &str = "spark";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Normalized reply
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A classification result, normalized for the controller: empty strings
/// on the wire become `None` so presence checks are explicit.
#[derive(Debug, Clone, Default)]
pub struct IntentReply {
    pub speech: Option<String>,
    pub messages: Vec<IntentMessage>,
    pub action: Option<String>,
    pub parameters: Map<String, Value>,
    /// Names of the contexts active after this turn.
    pub contexts: Vec<String>,
}

/// One fulfillment message.  Kind 0 is plain speech; kind 4 carries a
/// custom platform payload.
#[derive(Debug, Clone)]
pub struct IntentMessage {
    pub kind: u32,
    pub speech: Option<String>,
    pub payload: Option<Value>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<EventBody<'a>>,
    lang: &'a str,
    #[serde(rename = "sessionId")]
    session_id: &'a str,
    contexts: Vec<ContextRef<'a>>,
    #[serde(rename = "originalRequest")]
    original_request: OriginalRequest<'a>,
}

#[derive(Serialize)]
struct EventBody<'a> {
    name: &'a str,
    data: Map<String, Value>,
}

#[derive(Serialize)]
struct ContextRef<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct OriginalRequest<'a> {
    source: &'static str,
    data: &'a Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Option<QueryResult>,
}

#[derive(Deserialize)]
struct QueryResult {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    fulfillment: Fulfillment,
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default)]
    contexts: Vec<ContextWire>,
}

#[derive(Deserialize, Default)]
struct Fulfillment {
    #[serde(default)]
    speech: Option<String>,
    #[serde(default)]
    messages: Vec<MessageWire>,
}

#[derive(Deserialize)]
struct MessageWire {
    #[serde(rename = "type", default)]
    kind: u32,
    #[serde(default)]
    speech: Option<String>,
    #[serde(default)]
    payload: Option<Value>,
}

#[derive(Deserialize)]
struct ContextWire {
    name: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<QueryResponse> for IntentReply {
    fn from(resp: QueryResponse) -> Self {
        let Some(result) = resp.result else {
            return IntentReply::default();
        };

        IntentReply {
            speech: non_empty(result.fulfillment.speech),
            messages: result
                .fulfillment
                .messages
                .into_iter()
                .map(|m| IntentMessage {
                    kind: m.kind,
                    speech: non_empty(m.speech),
                    payload: m.payload,
                })
                .collect(),
            action: non_empty(result.action),
            parameters: result.parameters,
            contexts: result.contexts.into_iter().map(|c| c.name).collect(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct RestIntentClient {
    http: Client,
    base_url: String,
    access_token: String,
    lang: String,
}

impl RestIntentClient {
    pub fn new(cfg: &IntentConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            access_token: cfg.access_token.clone().unwrap_or_default(),
            lang: cfg.lang.clone(),
        })
    }

    async fn query(&self, request: &QueryRequest<'_>) -> Result<IntentReply> {
        let url = format!("{}/query", self.base_url);
        let resp = self
            .http
            .post(&url)
            .query(&[("v", PROTOCOL_VERSION)])
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Intent(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = %status, "intent query rejected");
            return Err(Error::Intent(format!("query returned {status}: {body}")));
        }

        let parsed: QueryResponse = resp
            .json()
            .await
            .map_err(|e| Error::Intent(format!("decoding query response: {e}")))?;
        Ok(parsed.into())
    }
}

#[async_trait::async_trait]
impl IntentService for RestIntentClient {
    async fn classify_text(
        &self,
        text: &str,
        session_id: &str,
        contexts: &[String],
        original: &Value,
    ) -> Result<IntentReply> {
        let request = QueryRequest {
            query: Some(text),
            event: None,
            lang: &self.lang,
            session_id,
            contexts: contexts.iter().map(|c| ContextRef { name: c }).collect(),
            original_request: OriginalRequest {
                source: REQUEST_SOURCE,
                data: original,
            },
        };
        self.query(&request).await
    }

    async fn classify_event(
        &self,
        event: &str,
        parameters: Map<String, Value>,
        session_id: &str,
        contexts: &[String],
        original: &Value,
    ) -> Result<IntentReply> {
        let request = QueryRequest {
            query: None,
            event: Some(EventBody {
                name: event,
                data: parameters,
            }),
            lang: &self.lang,
            session_id,
            contexts: contexts.iter().map(|c| ContextRef { name: c }).collect(),
            original_request: OriginalRequest {
                source: REQUEST_SOURCE,
                data: original,
            },
        };
        self.query(&request).await
    }
}
