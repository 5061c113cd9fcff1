use crate::application::{Investigation, InvestigationUseCase};
use crate::domain::analysis::Flags;
use crate::domain::error::{AppError, Result};
use crate::domain::provider::ProviderSource;
use actix_cors::Cors;
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct HttpState {
    pub investigations: Arc<InvestigationUseCase>,
}

#[derive(Deserialize)]
pub struct UploadQuery {
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct DatasetShape {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub file_name: String,
    pub mime_type: String,
    pub rows: usize,
    pub columns: usize,
    pub size_bytes: usize,
    pub data_uri: String,
}

#[derive(Debug, Serialize)]
pub struct InvestigationResponse {
    pub narrative: String,
    pub flags: Flags,
    pub flag_checklist: String,
    pub source: ProviderSource,
    pub warnings: Vec<String>,
    pub input: DatasetShape,
    pub report: ReportSummary,
}

impl From<Investigation> for InvestigationResponse {
    fn from(investigation: Investigation) -> Self {
        let Investigation {
            outcome,
            input_rows,
            input_columns,
            artifact,
        } = investigation;

        let report = ReportSummary {
            rows: outcome.result.report.row_count(),
            columns: outcome.result.report.column_count(),
            size_bytes: artifact.size(),
            data_uri: artifact.data_uri(),
            file_name: artifact.file_name,
            mime_type: artifact.mime_type,
        };

        Self {
            flag_checklist: outcome.result.flags.render_checklist(),
            narrative: outcome.result.narrative,
            flags: outcome.result.flags,
            source: outcome.source,
            warnings: outcome.warnings,
            input: DatasetShape {
                rows: input_rows,
                columns: input_columns,
            },
            report,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        if self.is_input_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/investigate")]
async fn investigate(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let investigation = run_investigation(&data, query.into_inner().file_name, body).await?;
    Ok(HttpResponse::Ok().json(InvestigationResponse::from(investigation)))
}

#[post("/investigate/report")]
async fn investigate_report(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let investigation = run_investigation(&data, query.into_inner().file_name, body).await?;
    let artifact = investigation.artifact;

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, format!("{}; charset=utf-8", artifact.mime_type)))
        .insert_header((CONTENT_DISPOSITION, artifact.content_disposition()))
        .body(artifact.bytes))
}

/// The pipeline is synchronous (parsing, provider process, cosmetic delay),
/// so it runs on the blocking pool.
async fn run_investigation(
    data: &HttpState,
    file_name: String,
    body: web::Bytes,
) -> Result<Investigation> {
    info!(file_name = %file_name, bytes = body.len(), "Upload received");

    let use_case = data.investigations.clone();
    let result = web::block(move || use_case.investigate(&file_name, &body))
        .await
        .map_err(|e| AppError::Internal(format!("investigation task failed: {}", e)))?;

    match &result {
        Ok(investigation) => {
            for warning in &investigation.outcome.warnings {
                warn!(%warning, "Investigation warning");
            }
        }
        Err(e) if e.is_input_error() => warn!(error = %e, "Rejected upload"),
        Err(e) => error!(error = %e, "Investigation failed"),
    }

    result
}

/// Mount the API under `/api`.
pub fn configure(state: web::Data<HttpState>, max_upload_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(state)
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .service(
                web::scope("/api")
                    .service(health)
                    .service(investigate_report)
                    .service(investigate),
            );
    }
}

pub fn start_server(
    investigations: Arc<InvestigationUseCase>,
    host: &str,
    port: u16,
    max_upload_bytes: usize,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { investigations });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .configure(configure(state.clone(), max_upload_bytes))
    })
    .bind((host, port))?
    .run();

    info!(host, port, "HTTP API listening");

    Ok(server)
}
