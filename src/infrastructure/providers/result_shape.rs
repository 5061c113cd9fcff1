use serde_json::Value;

use crate::domain::analysis::{AnalysisResult, Flags};
use crate::domain::dataset::Dataset;
use crate::domain::provider::ProviderOutput;

/// Classify a provider's JSON answer.
///
/// - an array of three or more elements is `[narrative, flags, report]`
///   (extra elements ignored);
/// - an object in dataset form (`{"columns": [...], "data": [...]}`) is a
///   dataset-only answer;
/// - everything else is unusable.
pub fn normalize_json(value: Value) -> ProviderOutput {
    match value {
        Value::Array(items) if items.len() >= 3 => normalize_sequence(items),
        Value::Array(items) => ProviderOutput::Unusable(format!(
            "sequence of {} elements, expected at least 3",
            items.len()
        )),
        value @ Value::Object(_) => match serde_json::from_value::<Dataset>(value) {
            Ok(dataset) => ProviderOutput::DatasetOnly(dataset),
            Err(e) => ProviderOutput::Unusable(format!("object is not a dataset: {}", e)),
        },
        other => ProviderOutput::Unusable(format!("unexpected {} value", kind(&other))),
    }
}

fn normalize_sequence(mut items: Vec<Value>) -> ProviderOutput {
    let narrative = match std::mem::take(&mut items[0]) {
        Value::String(text) if !text.trim().is_empty() => text,
        Value::String(_) => return ProviderOutput::Unusable("narrative is empty".to_string()),
        other => {
            return ProviderOutput::Unusable(format!("narrative is {}, expected string", kind(&other)))
        }
    };

    let flags = match std::mem::take(&mut items[1]) {
        Value::Null => Flags::new(),
        value => match serde_json::from_value::<Flags>(value) {
            Ok(flags) => flags,
            Err(e) => return ProviderOutput::Unusable(format!("flags are invalid: {}", e)),
        },
    };

    let report = match serde_json::from_value::<Dataset>(std::mem::take(&mut items[2])) {
        Ok(report) => report,
        Err(e) => return ProviderOutput::Unusable(format!("report is not a dataset: {}", e)),
    };

    ProviderOutput::NarrativeFlagsReport(AnalysisResult::new(narrative, flags, report))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
