use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub intent: IntentConfig,
    #[serde(default)]
    pub medical: MedicalConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub encyclopedia: EncyclopediaConfig,
}

impl Config {
    /// Sanity-check the loaded config.  Returns human-readable warnings;
    /// none of them is fatal (the gateway still boots, degraded).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.messaging.token.is_none() {
            warnings.push("messaging.token is not set — platform calls will fail".into());
        }
        if self.intent.access_token.is_none() {
            warnings.push("intent.access_token is not set — classification will fail".into());
        }
        if self.medical.app_id.is_none() || self.medical.app_key.is_none() {
            warnings.push("medical.app_id/app_key are not set — diagnosis will fail".into());
        }
        if self.server.base_url.is_none() {
            warnings.push("server.base_url is not set — webhook self-registration skipped".into());
        }
        if self.geocoding.api_key.is_none() {
            warnings.push("geocoding.api_key is not set — doctor search will fail".into());
        }
        if self.directory.api_key.is_none() {
            warnings.push("directory.api_key is not set — doctor search will fail".into());
        }
        if !(0.0..=1.0).contains(&self.dialogue.conclusion_threshold) {
            warnings.push(format!(
                "dialogue.conclusion_threshold {} is outside [0, 1]",
                self.dialogue.conclusion_threshold
            ));
        }

        warnings
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_5000")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    /// Public base URL of this gateway (e.g. `https://diana.example.com`).
    /// Used to register the platform webhook at startup; when unset, the
    /// webhook must be registered out of band.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".into(),
            base_url: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dialogue tuning
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Maximum medical follow-up questions per diagnosis cycle.  Once
    /// exceeded, the top-ranked candidate is accepted regardless of its
    /// probability.
    #[serde(default = "d_5")]
    pub max_questions: u32,
    /// A candidate at strictly greater probability concludes immediately.
    #[serde(default = "d_09")]
    pub conclusion_threshold: f64,
    /// Minimum similarity for approximate specialty matching (0–1).
    #[serde(default = "d_03")]
    pub specialty_similarity: f64,
    /// Pause between consecutive outbound messages in multi-message
    /// replies (doctor lists, rich content).
    #[serde(default = "d_300")]
    pub reply_delay_ms: u64,
    /// How often the specialty vocabulary snapshot is re-fetched.
    #[serde(default = "d_1440")]
    pub specialty_refresh_minutes: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_questions: 5,
            conclusion_threshold: 0.9,
            specialty_similarity: 0.3,
            reply_delay_ms: 300,
            specialty_refresh_minutes: 1440,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session persistence
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Directory holding `sessions.json`.  An unwritable path degrades the
    /// store to memory-only for the process lifetime.
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("./data/state"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// External services
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Intent-recognition service (api.ai v1 protocol).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "d_intent_url")]
    pub base_url: String,
    #[serde(default = "d_lang")]
    pub lang: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: d_intent_url(),
            lang: d_lang(),
            timeout_ms: 10_000,
        }
    }
}

/// Medical-reasoning service (Infermedica v2 protocol).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalConfig {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub app_key: Option<String>,
    #[serde(default = "d_medical_url")]
    pub base_url: String,
    #[serde(default = "d_medical_model")]
    pub model: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
}

impl Default for MedicalConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_key: None,
            base_url: d_medical_url(),
            model: d_medical_model(),
            timeout_ms: 10_000,
        }
    }
}

/// Messaging platform REST API (Spark-style).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "d_messaging_url")]
    pub base_url: String,
    /// Email domain the platform assigns to bot accounts; senders under it
    /// are filtered as self-authored.
    #[serde(default = "d_bot_domain")]
    pub bot_email_domain: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: d_messaging_url(),
            bot_email_domain: d_bot_domain(),
            timeout_ms: 10_000,
        }
    }
}

/// Geocoding service (Google Maps protocol).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_geocoding_url")]
    pub base_url: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: d_geocoding_url(),
            timeout_ms: 10_000,
        }
    }
}

/// Specialist directory (BetterDoctor protocol).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_directory_url")]
    pub base_url: String,
    /// Search radius passed to the directory, in its distance units.
    #[serde(default = "d_100")]
    pub search_radius: u32,
    #[serde(default = "d_5u")]
    pub max_results: u32,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: d_directory_url(),
            search_radius: 100,
            max_results: 5,
            timeout_ms: 10_000,
        }
    }
}

/// Encyclopedia lookups (Wikipedia API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncyclopediaConfig {
    #[serde(default = "d_encyclopedia_url")]
    pub base_url: String,
    #[serde(default = "d_10000")]
    pub timeout_ms: u64,
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            base_url: d_encyclopedia_url(),
            timeout_ms: 10_000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Default value helpers (serde)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn d_5000() -> u16 {
    5000
}
fn d_host() -> String {
    "0.0.0.0".into()
}
fn d_5() -> u32 {
    5
}
fn d_09() -> f64 {
    0.9
}
fn d_03() -> f64 {
    0.3
}
fn d_300() -> u64 {
    300
}
fn d_1440() -> u64 {
    1440
}
fn d_state_path() -> PathBuf {
    PathBuf::from("./data/state")
}
fn d_intent_url() -> String {
    "https://api.api.ai/v1".into()
}
fn d_lang() -> String {
    "en".into()
}
fn d_medical_url() -> String {
    "https://api.infermedica.com/v2".into()
}
fn d_medical_model() -> String {
    "infermedica-en".into()
}
fn d_messaging_url() -> String {
    "https://api.ciscospark.com/v1".into()
}
fn d_bot_domain() -> String {
    "sparkbot.io".into()
}
fn d_geocoding_url() -> String {
    "https://maps.googleapis.com/maps/api".into()
}
fn d_directory_url() -> String {
    "https://api.betterdoctor.com/2016-03-01".into()
}
fn d_encyclopedia_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}
fn d_10000() -> u64 {
    10_000
}
fn d_100() -> u32 {
    100
}
fn d_5u() -> u32 {
    5
}
