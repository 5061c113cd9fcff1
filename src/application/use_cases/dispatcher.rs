use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::default_provider::DefaultProvider;
use crate::domain::analysis::{AnalysisResult, Flags};
use crate::domain::dataset::Dataset;
use crate::domain::provider::{AnalysisProvider, ProviderError, ProviderOutput, ProviderSource};

/// Narrative used when a provider answers with a table only.
pub const DATASET_ONLY_NARRATIVE: &str =
    "Model returned a dataframe result. See downloadable report.";

/// The single result of a dispatch and how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub result: AnalysisResult,
    pub source: ProviderSource,
    /// Non-fatal problems worth showing to the user.
    pub warnings: Vec<String>,
}

/// Picks the provider for each dataset.
///
/// The external provider, when present, gets exactly one attempt; any
/// failure or unusable answer falls through to the default provider.
pub struct AnalysisDispatcher {
    external: Option<Arc<dyn AnalysisProvider>>,
    default_provider: DefaultProvider,
}

impl AnalysisDispatcher {
    pub fn new(default_provider: DefaultProvider) -> Self {
        Self {
            external: None,
            default_provider,
        }
    }

    pub fn with_external(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.external = Some(provider);
        self
    }

    pub fn with_optional_external(self, provider: Option<Arc<dyn AnalysisProvider>>) -> Self {
        match provider {
            Some(provider) => self.with_external(provider),
            None => self,
        }
    }

    pub fn external_name(&self) -> Option<&str> {
        self.external.as_deref().map(|p| p.name())
    }

    pub fn dispatch(&self, dataset: &Dataset) -> DispatchOutcome {
        let mut warnings = Vec::new();

        if let Some(provider) = self.external.as_deref() {
            match invoke(provider, dataset).and_then(into_result) {
                Ok(result) => {
                    info!(provider = provider.name(), "External provider produced the analysis");
                    return DispatchOutcome {
                        result,
                        source: ProviderSource::External {
                            name: provider.name().to_string(),
                        },
                        warnings,
                    };
                }
                Err(ProviderError::ShapeMismatch(reason)) => {
                    debug!(provider = provider.name(), %reason, "Unusable provider result, using default provider");
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "External provider failed, using default provider");
                    warnings.push(format!("Error running {}: {}", provider.name(), e));
                }
            }
        }

        DispatchOutcome {
            result: self.default_provider.analyze(dataset),
            source: ProviderSource::Default,
            warnings,
        }
    }
}

/// Call the provider, turning a panic into an invocation failure.
fn invoke(provider: &dyn AnalysisProvider, dataset: &Dataset) -> Result<ProviderOutput, ProviderError> {
    match panic::catch_unwind(AssertUnwindSafe(|| provider.process(dataset))) {
        Ok(Ok(output)) => Ok(output),
        // A provider reporting a bad shape itself still "raised" during the call
        Ok(Err(ProviderError::ShapeMismatch(reason))) => Err(ProviderError::Invocation(reason)),
        Ok(Err(e)) => Err(e),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "provider panicked".to_string());
            Err(ProviderError::Invocation(message))
        }
    }
}

/// Reports must have at least one column so they survive CSV export.
fn into_result(output: ProviderOutput) -> Result<AnalysisResult, ProviderError> {
    let result = match output {
        ProviderOutput::NarrativeFlagsReport(result) if result.has_narrative() => Ok(result),
        ProviderOutput::NarrativeFlagsReport(_) => {
            Err(ProviderError::ShapeMismatch("narrative is empty".to_string()))
        }
        ProviderOutput::DatasetOnly(report) => Ok(AnalysisResult::new(
            DATASET_ONLY_NARRATIVE,
            Flags::new(),
            report,
        )),
        ProviderOutput::Unusable(reason) => Err(ProviderError::ShapeMismatch(reason)),
    }?;

    if result.report.column_count() == 0 {
        return Err(ProviderError::ShapeMismatch(
            "report has no columns".to_string(),
        ));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::default_provider::DefaultProviderConfig;
    use crate::domain::dataset::Cell;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Answer(ProviderOutput),
        Fail,
        Panic,
    }

    struct FakeProvider {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AnalysisProvider for FakeProvider {
        fn name(&self) -> &str {
            "model"
        }

        fn process(&self, _dataset: &Dataset) -> Result<ProviderOutput, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Answer(output) => Ok(output.clone()),
                Behavior::Fail => Err(ProviderError::Invocation("division by zero".to_string())),
                Behavior::Panic => panic!("model blew up"),
            }
        }
    }

    fn default_provider() -> DefaultProvider {
        DefaultProvider::with_report_date(
            DefaultProviderConfig::default(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
    }

    fn dataset() -> Dataset {
        Dataset::from_rows(
            vec!["id".into(), "amount".into()],
            (1..=15).map(|i| vec![Cell::Int(i), Cell::Int(9000 + i)]).collect(),
        )
        .unwrap()
    }

    fn small_report() -> Dataset {
        Dataset::from_rows(vec!["score".into()], vec![vec![Cell::Float(0.97)]]).unwrap()
    }

    fn dispatcher_with(provider: Arc<FakeProvider>) -> AnalysisDispatcher {
        AnalysisDispatcher::new(default_provider()).with_external(provider)
    }

    #[test]
    fn test_no_external_uses_default() {
        let dispatcher = AnalysisDispatcher::new(default_provider());
        let data = dataset();
        let outcome = dispatcher.dispatch(&data);

        assert_eq!(outcome.result, default_provider().analyze(&data));
        assert_eq!(outcome.source, ProviderSource::Default);
        assert!(outcome.warnings.is_empty());
        assert_eq!(dispatcher.external_name(), None);
    }

    #[test]
    fn test_full_answer_is_used_unmodified() {
        let mut flags = Flags::new();
        flags.insert("Model flag", true);
        let answer = AnalysisResult::new("Model narrative", flags, small_report());
        let provider = FakeProvider::new(Behavior::Answer(ProviderOutput::NarrativeFlagsReport(
            answer.clone(),
        )));

        let outcome = dispatcher_with(provider.clone()).dispatch(&dataset());

        assert_eq!(outcome.result, answer);
        assert_eq!(
            outcome.source,
            ProviderSource::External {
                name: "model".to_string()
            }
        );
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_dataset_only_answer() {
        let provider =
            FakeProvider::new(Behavior::Answer(ProviderOutput::DatasetOnly(small_report())));

        let outcome = dispatcher_with(provider).dispatch(&dataset());

        assert_eq!(outcome.result.narrative, DATASET_ONLY_NARRATIVE);
        assert!(outcome.result.flags.is_empty());
        assert_eq!(outcome.result.report, small_report());
        assert!(!outcome.source.is_default());
    }

    #[test]
    fn test_failure_falls_back_with_warning() {
        let provider = FakeProvider::new(Behavior::Fail);
        let data = dataset();

        let outcome = dispatcher_with(provider.clone()).dispatch(&data);

        assert_eq!(outcome.result, default_provider().analyze(&data));
        assert!(outcome.source.is_default());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("division by zero"));
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_panic_falls_back_with_warning() {
        let provider = FakeProvider::new(Behavior::Panic);
        let data = dataset();

        let outcome = dispatcher_with(provider).dispatch(&data);

        assert_eq!(outcome.result, default_provider().analyze(&data));
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("model blew up"));
    }

    #[test]
    fn test_unusable_answer_falls_back_silently() {
        let provider = FakeProvider::new(Behavior::Answer(ProviderOutput::Unusable(
            "two elements".to_string(),
        )));
        let data = dataset();

        let outcome = dispatcher_with(provider).dispatch(&data);

        assert_eq!(outcome.result, default_provider().analyze(&data));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_blank_narrative_is_unusable() {
        let answer = AnalysisResult::new("   ", Flags::new(), small_report());
        let provider =
            FakeProvider::new(Behavior::Answer(ProviderOutput::NarrativeFlagsReport(answer)));

        let outcome = dispatcher_with(provider).dispatch(&dataset());

        assert!(outcome.source.is_default());
        assert!(outcome.result.has_narrative());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_report_without_columns_is_unusable() {
        let rows_only = Dataset::from_rows(vec![], vec![vec![], vec![]]).unwrap();
        let answer = AnalysisResult::new("Model narrative", Flags::new(), rows_only.clone());
        let data = dataset();

        for output in [
            ProviderOutput::NarrativeFlagsReport(answer),
            ProviderOutput::DatasetOnly(rows_only),
        ] {
            let outcome = dispatcher_with(FakeProvider::new(Behavior::Answer(output))).dispatch(&data);

            assert!(outcome.source.is_default());
            assert_eq!(outcome.result, default_provider().analyze(&data));
            assert!(outcome.warnings.is_empty());
        }
    }

    #[test]
    fn test_every_outcome_has_narrative_and_report() {
        let behaviors = vec![
            Behavior::Fail,
            Behavior::Panic,
            Behavior::Answer(ProviderOutput::Unusable("x".into())),
            Behavior::Answer(ProviderOutput::DatasetOnly(Dataset::empty())),
        ];

        for data in [Dataset::empty(), dataset()] {
            for behavior in &behaviors {
                let behavior = match behavior {
                    Behavior::Fail => Behavior::Fail,
                    Behavior::Panic => Behavior::Panic,
                    Behavior::Answer(output) => Behavior::Answer(output.clone()),
                };
                let outcome = dispatcher_with(FakeProvider::new(behavior)).dispatch(&data);
                assert!(outcome.result.has_narrative());
                assert!(outcome.result.report.column_count() >= 1);
                assert!(outcome.result.report.column_count() <= data.column_count() + 1);
            }
        }
    }
}
