use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

use super::dispatcher::{AnalysisDispatcher, DispatchOutcome};
use crate::domain::error::Result;
use crate::infrastructure::export::{ExportArtifact, REPORT_FILE_NAME};
use crate::infrastructure::tabular::TabularLoader;

/// Upper bound for the simulated investigation delay.
pub const MAX_DELAY_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigationConfig {
    /// Seconds of "investigation in progress" before the report is built.
    /// Cosmetic only, capped at [`MAX_DELAY_SECS`].
    pub delay_secs: u64,
    pub report_file_name: String,
}

impl Default for InvestigationConfig {
    fn default() -> Self {
        Self {
            delay_secs: 3,
            report_file_name: REPORT_FILE_NAME.to_string(),
        }
    }
}

/// Everything produced for one upload.
#[derive(Debug, Clone)]
pub struct Investigation {
    pub outcome: DispatchOutcome,
    pub input_rows: usize,
    pub input_columns: usize,
    pub artifact: ExportArtifact,
}

/// Upload -> dataset -> analysis -> downloadable report.
pub struct InvestigationUseCase {
    loader: TabularLoader,
    dispatcher: Arc<AnalysisDispatcher>,
    delay: Duration,
    report_file_name: String,
}

impl InvestigationUseCase {
    pub fn new(
        loader: TabularLoader,
        dispatcher: Arc<AnalysisDispatcher>,
        config: &InvestigationConfig,
    ) -> Self {
        Self {
            loader,
            dispatcher,
            delay: Duration::from_secs(config.delay_secs.min(MAX_DELAY_SECS)),
            report_file_name: config.report_file_name.clone(),
        }
    }

    /// Drop the cosmetic delay (CLI `--no-delay`, tests).
    pub fn without_delay(mut self) -> Self {
        self.delay = Duration::ZERO;
        self
    }

    pub fn dispatcher(&self) -> &AnalysisDispatcher {
        &self.dispatcher
    }

    /// Run one investigation. Only an unreadable or unsupported upload fails.
    pub fn investigate(&self, file_name: &str, bytes: &[u8]) -> Result<Investigation> {
        let dataset = self.loader.load(file_name, bytes)?;

        info!(
            file_name,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "Investigation started"
        );

        self.wait();

        let outcome = self.dispatcher.dispatch(&dataset);
        let artifact = ExportArtifact::from_dataset(&outcome.result.report, &self.report_file_name)?;

        info!(
            file_name,
            source = ?outcome.source,
            warnings = outcome.warnings.len(),
            report_rows = outcome.result.report.row_count(),
            "Investigation complete"
        );

        Ok(Investigation {
            outcome,
            input_rows: dataset.row_count(),
            input_columns: dataset.column_count(),
            artifact,
        })
    }

    fn wait(&self) {
        let mut remaining = self.delay.as_secs();
        while remaining > 0 {
            info!(seconds_left = remaining, "Investigation started... generating report");
            thread::sleep(Duration::from_secs(1));
            remaining -= 1;
        }
    }
}
