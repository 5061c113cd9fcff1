// ============================================================
// EXTERNAL ANALYSIS PROVIDERS
// ============================================================
// Discovery runs once at startup; a missing provider is not an error.

mod command;
mod result_shape;

pub use command::ExternalCommandProvider;
pub use result_shape::normalize_json;

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::provider::AnalysisProvider;
use crate::infrastructure::config::ProviderConfig;

/// Resolve the configured external provider, if any.
pub fn discover_provider(config: &ProviderConfig) -> Option<Arc<dyn AnalysisProvider>> {
    let Some(command) = config.command.as_deref().filter(|c| !c.trim().is_empty()) else {
        debug!("No external analysis provider configured");
        return None;
    };

    match ExternalCommandProvider::locate(command, &config.args) {
        Ok(provider) => {
            info!(
                provider = provider.name(),
                program = %provider.program().display(),
                "External analysis provider discovered"
            );
            Some(Arc::new(provider))
        }
        Err(e) => {
            debug!(command, error = %e, "External analysis provider unavailable");
            None
        }
    }
}
