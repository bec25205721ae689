//! Encyclopedia client (MediaWiki API).
//!
//! `summary` uses the opensearch action and keeps the first hit's
//! description and canonical link; `image` asks the pageimages prop for
//! a thumbnail URL.

use reqwest::Client;
use serde_json::Value;

use diana_domain::config::EncyclopediaConfig;
use diana_domain::error::{Error, Result};

use crate::traits::EncyclopediaService;

const THUMBNAIL_SIZE: &str = "500";

/// First opensearch hit for a term.
#[derive(Debug, Clone)]
pub struct ArticleSummary {
    pub description: String,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct RestEncyclopediaClient {
    http: Client,
    base_url: String,
}

impl RestEncyclopediaClient {
    pub fn new(cfg: &EncyclopediaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
        })
    }

    async fn fetch(&self, query: &[(&str, &str)]) -> Result<Value> {
        let resp = self
            .http
            .get(&self.base_url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Encyclopedia(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = %status, "encyclopedia lookup rejected");
            return Err(Error::Encyclopedia(format!(
                "lookup returned {status}: {body}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| Error::Encyclopedia(format!("decoding lookup response: {e}")))
    }
}

/// Opensearch replies are positional arrays: `[term, titles, descriptions,
/// links]`.  Keeps the first description/link pair when both are present
/// and non-empty.
fn first_opensearch_hit(value: &Value) -> Option<ArticleSummary> {
    let description = value.get(2)?.get(0)?.as_str()?;
    let link = value.get(3)?.get(0)?.as_str()?;
    if description.is_empty() || link.is_empty() {
        return None;
    }
    Some(ArticleSummary {
        description: description.to_owned(),
        link: link.to_owned(),
    })
}

/// Pageimages replies key pages by numeric page id, so the single entry
/// is reached by iterating the map.
fn first_thumbnail(value: &Value) -> Option<String> {
    let pages = value.get("query")?.get("pages")?.as_object()?;
    pages
        .values()
        .find_map(|page| page.get("thumbnail")?.get("source")?.as_str())
        .map(str::to_owned)
}

#[async_trait::async_trait]
impl EncyclopediaService for RestEncyclopediaClient {
    async fn summary(&self, term: &str) -> Result<Option<ArticleSummary>> {
        let value = self
            .fetch(&[
                ("action", "opensearch"),
                ("limit", "1"),
                ("namespace", "0"),
                ("format", "json"),
                ("search", term),
            ])
            .await?;
        Ok(first_opensearch_hit(&value))
    }

    async fn image(&self, term: &str) -> Result<Option<String>> {
        let value = self
            .fetch(&[
                ("action", "query"),
                ("prop", "pageimages"),
                ("format", "json"),
                ("pithumbsize", THUMBNAIL_SIZE),
                ("titles", term),
            ])
            .await?;
        Ok(first_thumbnail(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opensearch_hit_extracts_description_and_link() {
        let value = serde_json::json!([
            "Migraine",
            ["Migraine"],
            ["A migraine is a primary headache disorder."],
            ["https://en.wikipedia.org/wiki/Migraine"]
        ]);
        let hit = first_opensearch_hit(&value).unwrap();
        assert!(hit.description.starts_with("A migraine"));
        assert_eq!(hit.link, "https://en.wikipedia.org/wiki/Migraine");
    }

    #[test]
    fn empty_opensearch_reply_is_none() {
        let value = serde_json::json!(["nonsense", [], [], []]);
        assert!(first_opensearch_hit(&value).is_none());
    }

    #[test]
    fn thumbnail_found_under_numeric_page_key() {
        let value = serde_json::json!({
            "query": {
                "pages": {
                    "21035": {
                        "pageid": 21035,
                        "title": "Migraine",
                        "thumbnail": {"source": "https://upload.example/migraine.jpg", "width": 500}
                    }
                }
            }
        });
        assert_eq!(
            first_thumbnail(&value).as_deref(),
            Some("https://upload.example/migraine.jpg")
        );
    }

    #[test]
    fn missing_thumbnail_is_none() {
        let value = serde_json::json!({
            "query": {"pages": {"-1": {"title": "Nope", "missing": ""}}}
        });
        assert!(first_thumbnail(&value).is_none());
    }
}
