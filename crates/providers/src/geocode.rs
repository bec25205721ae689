//! Geocoding client (Google Maps geocode endpoint).

use reqwest::Client;
use serde::Deserialize;

use diana_domain::config::GeocodingConfig;
use diana_domain::error::{Error, Result};
use diana_domain::triage::GeoPoint;

use crate::traits::GeocodingService;

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Deserialize)]
struct Geometry {
    location: LocationWire,
}

#[derive(Deserialize)]
struct LocationWire {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Clone)]
pub struct RestGeocodingClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestGeocodingClient {
    pub fn new(cfg: &GeocodingConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: cfg.api_key.clone().unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
impl GeocodingService for RestGeocodingClient {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        let url = format!("{}/geocode/json", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("address", address), ("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| Error::Geocoding(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = %status, "geocode request rejected");
            return Err(Error::Geocoding(format!(
                "geocode returned {status}: {body}"
            )));
        }

        let parsed: GeocodeResponse = resp
            .json()
            .await
            .map_err(|e| Error::Geocoding(format!("decoding geocode response: {e}")))?;

        Ok(parsed.results.into_iter().next().map(|r| GeoPoint {
            lat: r.geometry.location.lat,
            lng: r.geometry.location.lng,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_result_wins() {
        let parsed: GeocodeResponse = serde_json::from_value(serde_json::json!({
            "results": [
                {"geometry": {"location": {"lat": 48.85, "lng": 2.35}}},
                {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
            ],
            "status": "OK"
        }))
        .unwrap();

        let point = parsed.results.into_iter().next().unwrap();
        assert!((point.geometry.location.lat - 48.85).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_results_decodes_to_empty() {
        let parsed: GeocodeResponse = serde_json::from_value(serde_json::json!({
            "results": [],
            "status": "ZERO_RESULTS"
        }))
        .unwrap();
        assert!(parsed.results.is_empty());
    }
}
