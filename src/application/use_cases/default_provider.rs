use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::narrative_templates::{NarrativeContext, NarrativeTemplate};
use crate::domain::analysis::{AnalysisResult, Flags};
use crate::domain::dataset::{Cell, Dataset};
use crate::domain::provider::{AnalysisProvider, ProviderError, ProviderOutput};

pub const DEFAULT_ROW_LIMIT: usize = 10;
pub const DEFAULT_MARKER_COLUMN: &str = "_ai_flag_summary";
pub const DEFAULT_MARKER_VALUE: &str = "review_recommended";

/// One fixed red-flag assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSetting {
    pub label: String,
    pub raised: bool,
}

impl FlagSetting {
    fn new(label: &str, raised: bool) -> Self {
        Self {
            label: label.to_string(),
            raised,
        }
    }
}

/// Default provider settings (the `[narrative]` config table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultProviderConfig {
    pub template: NarrativeTemplate,
    pub flags: Vec<FlagSetting>,
    /// Rows copied from the upload into the report.
    pub row_limit: usize,
    /// Name of the disposition column appended to the report.
    pub marker_column: String,
    pub marker_value: String,
}

impl Default for DefaultProviderConfig {
    fn default() -> Self {
        Self {
            template: NarrativeTemplate::default(),
            flags: vec![
                FlagSetting::new("Large cash deposits below reporting thresholds", true),
                FlagSetting::new("Transactions with high-risk jurisdictions", false),
                FlagSetting::new("Use of multiple nominee accounts", false),
                FlagSetting::new("Rapid movement of funds between accounts", true),
                FlagSetting::new("Structuring or layering activity", true),
            ],
            row_limit: DEFAULT_ROW_LIMIT,
            marker_column: DEFAULT_MARKER_COLUMN.to_string(),
            marker_value: DEFAULT_MARKER_VALUE.to_string(),
        }
    }
}

/// Always-available fallback analysis. Output is a pure function of the
/// dataset, the configuration and the report date.
#[derive(Debug, Clone)]
pub struct DefaultProvider {
    config: DefaultProviderConfig,
    /// Pinned date; `None` means today (UTC) at analysis time.
    report_date: Option<NaiveDate>,
}

impl Default for DefaultProvider {
    fn default() -> Self {
        Self::new(DefaultProviderConfig::default())
    }
}

impl DefaultProvider {
    /// Dates each report with the UTC day it is produced on.
    pub fn new(config: DefaultProviderConfig) -> Self {
        Self {
            config,
            report_date: None,
        }
    }

    pub fn with_report_date(config: DefaultProviderConfig, report_date: NaiveDate) -> Self {
        Self {
            config,
            report_date: Some(report_date),
        }
    }

    pub fn analyze(&self, dataset: &Dataset) -> AnalysisResult {
        let report_date = self
            .report_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let context = NarrativeContext::from_dataset(dataset, report_date);
        let narrative = self.config.template.render(&context);

        let flags: Flags = self
            .config
            .flags
            .iter()
            .map(|flag| (flag.label.clone(), flag.raised))
            .collect();

        let report = dataset.head(self.config.row_limit).with_constant_column(
            &self.config.marker_column,
            Cell::Text(self.config.marker_value.clone()),
        );

        AnalysisResult::new(narrative, flags, report)
    }
}

impl AnalysisProvider for DefaultProvider {
    fn name(&self) -> &str {
        "default"
    }

    fn process(&self, dataset: &Dataset) -> Result<ProviderOutput, ProviderError> {
        Ok(ProviderOutput::NarrativeFlagsReport(self.analyze(dataset)))
    }
}
