use actix_web::http::header::CONTENT_DISPOSITION;
use actix_web::{test, web, App};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;

use sar_assistant_lib::application::{
    AnalysisDispatcher, DefaultProvider, DefaultProviderConfig, InvestigationConfig,
    InvestigationUseCase,
};
use sar_assistant_lib::infrastructure::tabular::{CsvReader, TabularLoader};
use sar_assistant_lib::interfaces::http::{configure, HttpState};
use sar_assistant_lib::{AnalysisProvider, Cell, Dataset, ProviderError, ProviderOutput};

struct BrokenModel;

impl AnalysisProvider for BrokenModel {
    fn name(&self) -> &str {
        "broken_model"
    }

    fn process(&self, _dataset: &Dataset) -> Result<ProviderOutput, ProviderError> {
        Err(ProviderError::Invocation("KeyError: 'amount'".to_string()))
    }
}

struct TableModel;

impl AnalysisProvider for TableModel {
    fn name(&self) -> &str {
        "table_model"
    }

    fn process(&self, dataset: &Dataset) -> Result<ProviderOutput, ProviderError> {
        Ok(ProviderOutput::DatasetOnly(
            dataset.head(2).with_constant_column("risk", Cell::Float(0.5)),
        ))
    }
}

fn state(external: Option<Arc<dyn AnalysisProvider>>) -> web::Data<HttpState> {
    let default_provider = DefaultProvider::with_report_date(
        DefaultProviderConfig::default(),
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    );
    let dispatcher = AnalysisDispatcher::new(default_provider).with_optional_external(external);
    let use_case = InvestigationUseCase::new(
        TabularLoader::default(),
        Arc::new(dispatcher),
        &InvestigationConfig::default(),
    )
    .without_delay();

    web::Data::new(HttpState {
        investigations: Arc::new(use_case),
    })
}

fn transactions_csv(rows: usize) -> String {
    let mut csv = String::from("id,amount\n");
    for i in 1..=rows {
        csv.push_str(&format!("{},{}\n", i, 8500 + i * 25));
    }
    csv
}

#[actix_web::test]
async fn health_reports_ok() {
    let app = test::init_service(App::new().configure(configure(state(None), 1024))).await;
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[actix_web::test]
async fn investigate_with_default_provider() {
    let app =
        test::init_service(App::new().configure(configure(state(None), 1024 * 1024))).await;
    let req = test::TestRequest::post()
        .uri("/api/investigate?file_name=transactions.csv")
        .set_payload(transactions_csv(15))
        .to_request();

    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["source"], serde_json::json!({"kind": "default"}));
    assert_eq!(body["input"], serde_json::json!({"rows": 15, "columns": 2}));
    assert_eq!(body["report"]["rows"], 10);
    assert_eq!(body["report"]["columns"], 3);
    assert_eq!(body["report"]["file_name"], "investigation_report.csv");
    assert!(body["report"]["size_bytes"].as_u64().unwrap() > 0);
    assert!(body["report"]["data_uri"]
        .as_str()
        .unwrap()
        .starts_with("data:text/csv;base64,"));
    assert_eq!(
        body["flags"]["Large cash deposits below reporting thresholds"],
        true
    );
    assert!(body["flag_checklist"]
        .as_str()
        .unwrap()
        .starts_with("- ✅ Large cash deposits"));
    assert!(!body["narrative"].as_str().unwrap().is_empty());
    assert_eq!(body["warnings"], serde_json::json!([]));
}

#[actix_web::test]
async fn failing_provider_falls_back_with_warning() {
    let app = test::init_service(
        App::new().configure(configure(state(Some(Arc::new(BrokenModel))), 1024 * 1024)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/investigate?file_name=transactions.csv")
        .set_payload(transactions_csv(3))
        .to_request();

    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["source"]["kind"], "default");
    let warnings = body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap().contains("KeyError"));
}

#[actix_web::test]
async fn dataset_only_provider_result() {
    let app = test::init_service(
        App::new().configure(configure(state(Some(Arc::new(TableModel))), 1024 * 1024)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/investigate?file_name=transactions.csv")
        .set_payload(transactions_csv(5))
        .to_request();

    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        body["source"],
        serde_json::json!({"kind": "external", "name": "table_model"})
    );
    assert_eq!(
        body["narrative"],
        "Model returned a dataframe result. See downloadable report."
    );
    assert_eq!(body["flags"], serde_json::json!({}));
    assert_eq!(body["flag_checklist"], "No automated flags produced.");
    assert_eq!(body["report"]["rows"], 2);
    assert_eq!(body["report"]["columns"], 3);
}

#[actix_web::test]
async fn report_download_is_an_attachment() {
    let app =
        test::init_service(App::new().configure(configure(state(None), 1024 * 1024))).await;
    let req = test::TestRequest::post()
        .uri("/api/investigate/report?file_name=transactions.csv")
        .set_payload(transactions_csv(12))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get(CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap(),
        "attachment; filename=\"investigation_report.csv\""
    );

    let bytes = test::read_body(resp).await;
    let report = CsvReader::new().read(&bytes).unwrap();
    assert_eq!(report.row_count(), 10);
    assert_eq!(report.column_count(), 3);
}

#[actix_web::test]
async fn unreadable_upload_is_rejected() {
    let app =
        test::init_service(App::new().configure(configure(state(None), 1024 * 1024))).await;
    let req = test::TestRequest::post()
        .uri("/api/investigate?file_name=transactions.xlsx")
        .set_payload("definitely not a workbook")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Could not read file"));
}

#[actix_web::test]
async fn unsupported_extension_is_rejected() {
    let app =
        test::init_service(App::new().configure(configure(state(None), 1024 * 1024))).await;
    let req = test::TestRequest::post()
        .uri("/api/investigate?file_name=notes.pdf")
        .set_payload("%PDF-1.7")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);
}
