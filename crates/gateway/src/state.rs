use std::sync::Arc;

use diana_domain::config::Config;
use diana_sessions::SessionStore;

use crate::dialogue::DialogueController;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SessionStore>,
    pub controller: Arc<DialogueController>,
}
