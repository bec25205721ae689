//! Specialist-directory client (BetterDoctor protocol).
//!
//! Two operations: a location-bounded doctor search filtered by
//! specialty, and the full specialty vocabulary used to seed the
//! approximate-match index.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use diana_domain::config::DirectoryConfig;
use diana_domain::error::{Error, Result};
use diana_domain::triage::GeoPoint;

use crate::traits::DirectoryService;

const DOCTOR_FIELDS: &str = "profile(first_name,last_name,title,bio,image_url),\
practices(name,phones,within_search_area,website,visit_address)";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire / shared shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(default)]
    pub profile: DoctorProfile,
    #[serde(default)]
    pub practices: Vec<Practice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Practice {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub within_search_area: bool,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phones: Vec<PracticePhone>,
    #[serde(default)]
    pub visit_address: Option<VisitAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticePhone {
    pub number: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state_long: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

/// One entry of the directory's specialty vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specialty {
    pub uid: String,
    pub name: String,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct RestDirectoryClient {
    http: Client,
    base_url: String,
    api_key: String,
    search_radius: u32,
    max_results: u32,
}

impl RestDirectoryClient {
    pub fn new(cfg: &DirectoryConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: cfg.api_key.clone().unwrap_or_default(),
            search_radius: cfg.search_radius,
            max_results: cfg.max_results,
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .query(&[("user_key", &self.api_key)])
            .send()
            .await
            .map_err(|e| Error::Directory(format!("{path}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(path = %path, status = %status, "directory request rejected");
            return Err(Error::Directory(format!(
                "{path} returned {status}: {body}"
            )));
        }

        let envelope: DataEnvelope<T> = resp
            .json()
            .await
            .map_err(|e| Error::Directory(format!("decoding {path} response: {e}")))?;
        Ok(envelope.data)
    }
}

#[async_trait::async_trait]
impl DirectoryService for RestDirectoryClient {
    async fn find_doctors(&self, location: GeoPoint, specialty_uid: &str) -> Result<Vec<Doctor>> {
        let query = [
            ("skip", "0".to_owned()),
            ("limit", self.max_results.to_string()),
            ("specialty_uid", specialty_uid.to_owned()),
            ("fields", DOCTOR_FIELDS.to_owned()),
            (
                "location",
                format!("{},{},{}", location.lat, location.lng, self.search_radius),
            ),
        ];
        self.fetch("doctors", &query).await
    }

    async fn list_specialties(&self) -> Result<Vec<Specialty>> {
        let query = [("fields", "uid,name".to_owned())];
        self.fetch("specialties", &query).await
    }
}
