//! Wiring: config → adapters → controller → [`AppState`], plus the
//! startup side effects (specialty refresh, webhook self-registration).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use diana_domain::config::Config;
use diana_providers::{
    MessagingService, RestDirectoryClient, RestEncyclopediaClient, RestGeocodingClient,
    RestIntentClient, RestMedicalClient, RestMessagingClient,
};
use diana_sessions::SessionStore;

use crate::dialogue::{DialogueController, SpecialtyIndex};
use crate::identity::BotIdentity;
use crate::state::AppState;

/// The name under which the gateway registers its platform webhook.
const WEBHOOK_NAME: &str = "DianaWebhook";

/// Build the full application state from a loaded config.
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    for warning in config.validate() {
        tracing::warn!("{warning}");
    }

    let store = Arc::new(SessionStore::open(&config.sessions.state_path));

    let intent = Arc::new(
        RestIntentClient::new(&config.intent).context("building intent client")?,
    );
    let medical = Arc::new(
        RestMedicalClient::new(&config.medical).context("building medical client")?,
    );
    let geocoding = Arc::new(
        RestGeocodingClient::new(&config.geocoding).context("building geocoding client")?,
    );
    let directory = Arc::new(
        RestDirectoryClient::new(&config.directory).context("building directory client")?,
    );
    let encyclopedia = Arc::new(
        RestEncyclopediaClient::new(&config.encyclopedia)
            .context("building encyclopedia client")?,
    );
    let messaging = Arc::new(
        RestMessagingClient::new(&config.messaging).context("building messaging client")?,
    );

    let bot = match messaging.me().await {
        Ok(profile) => {
            let identity = BotIdentity::from_profile(&profile, &config.messaging.bot_email_domain);
            tracing::info!(bot = %identity.name, "bot identity resolved");
            identity
        }
        Err(e) => {
            tracing::warn!(error = %e, "bot identity lookup failed, filtering by email domain only");
            BotIdentity::with_domain(&config.messaging.bot_email_domain)
        }
    };

    let specialties = Arc::new(SpecialtyIndex::new(config.dialogue.specialty_similarity));

    let controller = Arc::new(DialogueController {
        config: config.clone(),
        store: store.clone(),
        intent,
        medical,
        geocoding,
        directory,
        encyclopedia,
        messaging,
        specialties,
        bot,
    });

    Ok(AppState {
        config,
        store,
        controller,
    })
}

/// Launch the periodic specialty-vocabulary refresh.  The first fetch
/// happens immediately so approximate matching works from the start.
pub fn spawn_background_tasks(state: &AppState) {
    let controller = state.controller.clone();
    let minutes = state.config.dialogue.specialty_refresh_minutes.max(1);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
        loop {
            ticker.tick().await;
            match controller.directory.list_specialties().await {
                Ok(specialties) if !specialties.is_empty() => {
                    tracing::info!(count = specialties.len(), "specialty vocabulary refreshed");
                    controller.specialties.replace(specialties);
                }
                Ok(_) => {
                    tracing::warn!("specialty refresh returned an empty list, keeping previous");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "specialty refresh failed");
                }
            }
        }
    });
}

/// Point the platform's webhook at this gateway.  Existing webhooks are
/// removed first so redeployments don't accumulate stale registrations.
pub async fn register_webhook(state: &AppState) {
    let Some(base_url) = state.config.server.base_url.as_deref() else {
        tracing::info!("server.base_url not set, skipping webhook self-registration");
        return;
    };
    let target_url = format!("{}/webhook", base_url.trim_end_matches('/'));
    let messaging = &state.controller.messaging;

    match messaging.list_webhooks().await {
        Ok(webhooks) => {
            for webhook in webhooks {
                if let Err(e) = messaging.delete_webhook(&webhook.id).await {
                    tracing::warn!(webhook = %webhook.name, error = %e, "deleting stale webhook failed");
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "listing webhooks failed");
        }
    }

    match messaging.create_webhook(WEBHOOK_NAME, &target_url).await {
        Ok(webhook) => {
            tracing::info!(webhook_id = %webhook.id, target_url = %target_url, "webhook registered");
        }
        Err(e) => {
            tracing::warn!(target_url = %target_url, error = %e, "webhook registration failed");
        }
    }
}
