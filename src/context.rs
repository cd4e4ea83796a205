//! Service context shared by the conversation, archive and wellness surfaces
//!
//! Constructed once at application start; holds the remote client and the
//! persistence handle so no module reaches for globals.

use crate::client::{GeminiClient, ModelClient};
use crate::config::ServiceConfig;
use crate::store::StateStore;
use crate::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct ServiceContext {
    pub model: Arc<dyn ModelClient>,
    pub store: Arc<StateStore>,
    pub config: ServiceConfig,
}

impl ServiceContext {
    /// Build the production context: remote client plus on-disk store
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;

        let dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => StateStore::default_dir()?,
        };
        let store = Arc::new(StateStore::open(dir)?);
        let model: Arc<dyn ModelClient> = Arc::new(GeminiClient::new(&config));

        Ok(Self {
            model,
            store,
            config,
        })
    }

    /// Assemble a context from pre-built parts (tests, alternative backends)
    pub fn with_parts(
        model: Arc<dyn ModelClient>,
        store: Arc<StateStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            model,
            store,
            config,
        }
    }
}
