use std::sync::Arc;

use tracing::info;

use crate::application::{AnalysisDispatcher, DefaultProvider, InvestigationUseCase};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::providers::discover_provider;
use crate::infrastructure::tabular::TabularLoader;

/// Wire the investigation pipeline from configuration. Provider discovery
/// happens here, once per process.
pub fn build_investigation(config: &AppConfig) -> InvestigationUseCase {
    let default_provider = DefaultProvider::new(config.narrative.clone());
    let dispatcher = AnalysisDispatcher::new(default_provider)
        .with_optional_external(discover_provider(&config.provider));

    info!(
        template = %config.narrative.template,
        external_provider = dispatcher.external_name().unwrap_or("none"),
        "Investigation pipeline ready"
    );

    InvestigationUseCase::new(
        TabularLoader::default(),
        Arc::new(dispatcher),
        &config.investigation,
    )
}
