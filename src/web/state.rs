use crate::config::WebConfig;
use crate::transform::Transformer;
use crate::web::session::SessionStore;

pub struct AppState {
    pub transformer: Transformer,
    pub sessions: SessionStore,
    pub config: WebConfig,
}

impl AppState {
    pub fn new(transformer: Transformer, config: WebConfig) -> Self {
        Self {
            transformer,
            sessions: SessionStore::new(&config.session_secret),
            config,
        }
    }
}
