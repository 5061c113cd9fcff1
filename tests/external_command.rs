#![cfg(unix)]

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use sar_assistant_lib::application::{
    AnalysisDispatcher, DefaultProvider, DefaultProviderConfig, InvestigationConfig,
    InvestigationUseCase,
};
use sar_assistant_lib::domain::provider::ProviderSource;
use sar_assistant_lib::infrastructure::config::ProviderConfig;
use sar_assistant_lib::infrastructure::providers::discover_provider;
use sar_assistant_lib::infrastructure::tabular::TabularLoader;

const UPLOAD: &str = "id,amount\n1,9500\n2,9700\n3,9900\n";

fn investigation_with(script: &str) -> InvestigationUseCase {
    let provider = discover_provider(&ProviderConfig {
        command: Some("sh".to_string()),
        args: vec!["-c".to_string(), script.to_string()],
    });
    assert!(provider.is_some(), "sh should be discoverable on PATH");

    let default_provider = DefaultProvider::with_report_date(
        DefaultProviderConfig::default(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    );
    let dispatcher = AnalysisDispatcher::new(default_provider).with_optional_external(provider);

    InvestigationUseCase::new(
        TabularLoader::default(),
        Arc::new(dispatcher),
        &InvestigationConfig::default(),
    )
    .without_delay()
}

fn default_result_for_upload() -> sar_assistant_lib::AnalysisResult {
    let dataset = TabularLoader::default().load("tx.csv", UPLOAD.as_bytes()).unwrap();
    DefaultProvider::with_report_date(
        DefaultProviderConfig::default(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    )
    .analyze(&dataset)
}

#[test]
fn command_result_is_used_verbatim() {
    let use_case = investigation_with(
        r#"cat > /dev/null; printf '%s' '["Subject structured deposits.", {"Structuring": true, "Nominees": false}, {"columns": ["id", "verdict"], "data": [[1, "file"], [3, "file"]]}]'"#,
    );

    let investigation = use_case.investigate("tx.csv", UPLOAD.as_bytes()).unwrap();
    let outcome = investigation.outcome;

    assert_eq!(
        outcome.source,
        ProviderSource::External {
            name: "sh".to_string()
        }
    );
    assert_eq!(outcome.result.narrative, "Subject structured deposits.");
    assert_eq!(
        outcome.result.flags.iter().collect::<Vec<_>>(),
        vec![("Structuring", true), ("Nominees", false)]
    );
    assert_eq!(outcome.result.report.row_count(), 2);
    assert_eq!(
        String::from_utf8(investigation.artifact.bytes).unwrap(),
        "id,verdict\n1,file\n3,file\n"
    );
}

#[test]
fn crashing_command_falls_back_to_default() {
    let use_case = investigation_with("cat > /dev/null; echo 'Traceback: boom' >&2; exit 1");

    let outcome = use_case
        .investigate("tx.csv", UPLOAD.as_bytes())
        .unwrap()
        .outcome;

    assert_eq!(outcome.source, ProviderSource::Default);
    assert_eq!(outcome.result, default_result_for_upload());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("Traceback: boom"));
}

#[test]
fn wrong_shape_falls_back_silently() {
    let use_case = investigation_with(r#"cat > /dev/null; echo '["narrative", {}]'"#);

    let outcome = use_case
        .investigate("tx.csv", UPLOAD.as_bytes())
        .unwrap()
        .outcome;

    assert_eq!(outcome.source, ProviderSource::Default);
    assert_eq!(outcome.result, default_result_for_upload());
    assert!(outcome.warnings.is_empty());
}
