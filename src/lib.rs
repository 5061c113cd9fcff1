pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

use std::sync::Arc;

use crate::infrastructure::bootstrap::build_investigation;
use crate::infrastructure::config::AppConfig;

pub use crate::application::{AnalysisDispatcher, DefaultProvider, InvestigationUseCase};
pub use crate::domain::analysis::{AnalysisResult, Flags};
pub use crate::domain::dataset::{Cell, Dataset};
pub use crate::domain::error::{AppError, Result};
pub use crate::domain::provider::{AnalysisProvider, ProviderError, ProviderOutput};

/// Run the HTTP API until it is shut down.
pub fn serve(config: &AppConfig) -> std::io::Result<()> {
    let investigations = Arc::new(build_investigation(config));
    let server = &config.server;

    actix_web::rt::System::new().block_on(async move {
        interfaces::http::start_server(
            investigations,
            &server.host,
            server.port,
            server.max_upload_bytes,
        )?
        .await
    })
}
