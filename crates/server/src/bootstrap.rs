use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use voltwiz_chat::{advisor_dispatcher, AdvisorError, AdvisorService, EventDispatcher};
use voltwiz_core::config::{AppConfig, ConfigError};
use voltwiz_core::{Catalog, CatalogError};

pub struct Application {
    pub config: AppConfig,
    pub advisor: Arc<AdvisorService>,
    pub dispatcher: Arc<EventDispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("plan catalog failed to load: {0}")]
    Catalog(#[source] CatalogError),
    #[error("advisor initialization failed: {0}")]
    Advisor(#[source] AdvisorError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog = Catalog::load_or_embedded(config.catalog.path.as_deref())
        .map_err(BootstrapError::Catalog)?;
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        plans = catalog.len(),
        source = config
            .catalog
            .path
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "embedded".to_owned()),
        "plan catalog loaded"
    );

    let advisor = Arc::new(
        AdvisorService::from_config(&config, Arc::new(catalog)).map_err(BootstrapError::Advisor)?,
    );
    let dispatcher = Arc::new(advisor_dispatcher(Arc::clone(&advisor)));
    info!(
        event_name = "system.bootstrap.advisor_ready",
        correlation_id = "bootstrap",
        locale = %config.messages.locale,
        handlers = dispatcher.handler_count(),
        "advisor ready"
    );

    Ok(Application { config, advisor, dispatcher })
}
