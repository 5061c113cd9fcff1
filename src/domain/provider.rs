use serde::Serialize;
use thiserror::Error;

use super::analysis::AnalysisResult;
use super::dataset::Dataset;

/// Failures on the provider path. None of these abort a request: the
/// dispatcher logs them and falls back to the default provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not available: {0}")]
    Discovery(String),
    #[error("provider invocation failed: {0}")]
    Invocation(String),
    #[error("provider returned an unusable result: {0}")]
    ShapeMismatch(String),
}

/// What a provider handed back, already classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutput {
    /// Full narrative, flags and report.
    NarrativeFlagsReport(AnalysisResult),
    /// Only a table; narrative and flags are synthesized by the dispatcher.
    DatasetOnly(Dataset),
    /// Anything else. Carries a short description for logging.
    Unusable(String),
}

/// Transforms a dataset into an analysis.
pub trait AnalysisProvider: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, dataset: &Dataset) -> Result<ProviderOutput, ProviderError>;
}

/// Which provider produced the final result of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderSource {
    External { name: String },
    Default,
}

impl ProviderSource {
    pub fn is_default(&self) -> bool {
        matches!(self, ProviderSource::Default)
    }
}
