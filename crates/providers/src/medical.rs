//! Medical-reasoning client (Infermedica v2 protocol).
//!
//! Three operations: `parse` extracts symptom mentions from free text,
//! `diagnosis` ranks condition candidates and may pose a follow-up
//! question, and `conditions/{id}` fetches the concluded condition's
//! detail.  Credentials travel as `App-Id`/`App-Key` headers plus the
//! language model name.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use diana_domain::config::MedicalConfig;
use diana_domain::error::{Error, Result};
use diana_domain::triage::{ConditionCandidate, ConditionDetail, Evidence, Mention, Question};

use crate::traits::MedicalService;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / response shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisRequest {
    pub sex: String,
    pub age: u32,
    pub evidence: Vec<Evidence>,
    pub extras: DiagnosisExtras,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiagnosisExtras {
    pub ignore_groups: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosisResponse {
    #[serde(default)]
    pub conditions: Vec<ConditionCandidate>,
    #[serde(default)]
    pub question: Option<Question>,
}

#[derive(Deserialize)]
struct ParseResponse {
    #[serde(default)]
    mentions: Vec<Mention>,
}

#[derive(Deserialize)]
struct ConditionWire {
    name: String,
    #[serde(default)]
    common_name: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    extras: ConditionExtras,
}

#[derive(Deserialize, Default)]
struct ConditionExtras {
    #[serde(default)]
    hint: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct RestMedicalClient {
    http: Client,
    base_url: String,
    app_id: String,
    app_key: String,
    model: String,
}

impl RestMedicalClient {
    pub fn new(cfg: &MedicalConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            app_id: cfg.app_id.clone().unwrap_or_default(),
            app_key: cfg.app_key.clone().unwrap_or_default(),
            model: cfg.model.clone(),
        })
    }

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("App-Id", &self.app_id)
            .header("App-Key", &self.app_key)
            .header("Model", &self.model)
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        rb: RequestBuilder,
    ) -> Result<T> {
        let resp = self
            .decorate(rb)
            .send()
            .await
            .map_err(|e| Error::Medical(format!("{path}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(path = %path, status = %status, "medical request rejected");
            return Err(Error::Medical(format!("{path} returned {status}: {body}")));
        }

        resp.json()
            .await
            .map_err(|e| Error::Medical(format!("decoding {path} response: {e}")))
    }
}

#[async_trait::async_trait]
impl MedicalService for RestMedicalClient {
    async fn parse(&self, text: &str) -> Result<Vec<Mention>> {
        let url = format!("{}/parse", self.base_url);
        let rb = self.http.post(&url).json(&serde_json::json!({ "text": text }));
        let parsed: ParseResponse = self.execute("parse", rb).await?;
        Ok(parsed.mentions)
    }

    async fn diagnose(&self, request: &DiagnosisRequest) -> Result<DiagnosisResponse> {
        let url = format!("{}/diagnosis", self.base_url);
        let rb = self.http.post(&url).json(request);
        self.execute("diagnosis", rb).await
    }

    async fn condition(&self, condition_id: &str) -> Result<ConditionDetail> {
        let url = format!("{}/conditions/{}", self.base_url, condition_id);
        let wire: ConditionWire = self.execute("conditions", self.http.get(&url)).await?;
        Ok(ConditionDetail {
            name: wire.name,
            common_name: wire.common_name,
            categories: wire.categories,
            hint: wire.extras.hint,
        })
    }
}
