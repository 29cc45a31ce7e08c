use axum::http::StatusCode;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{env, net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use url::Url;

mod assignment;
mod column_match;
mod model;
mod row_parser;
mod tabular;

#[cfg(test)]
mod assignment_tests;
#[cfg(test)]
mod model_tests;
#[cfg(test)]
mod tabular_tests;

use assignment::{AdapterError, AssignmentService};
use column_match::{check_mapping, suggest_mapping, ColumnMapping, ImportKind, MappingError};
use model::{DefaultLocation, RosterRequest, RosterResponse};
use row_parser::{parse_rows, ClientRowParser, JobRowParser, OperativeRowParser, ParsedBatch};
use tabular::{decode_upload, DecodeError, Upload};

// --- Error Handling ---

#[derive(Error, Debug)]
enum AppError {
    #[error("Invalid bind address: {0}")]
    InvalidBindAddr(String),
    #[error("URL parsing failed: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP client setup failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

// Map AppError to Axum's IntoResponse
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        error!("Error occurred: {}", self);

        let status_code = match &self {
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Mapping(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Adapter(AdapterError::EmptyJobBatch) => StatusCode::BAD_REQUEST,
            AppError::Adapter(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidBindAddr(_)
            | AppError::UrlParse(_)
            | AppError::Reqwest(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status_code, body).into_response()
    }
}

// --- General App Configuration ---

#[derive(Debug, Clone)]
struct AppConfig {
    bind_addr: SocketAddr,
    assignment_api_url: String,
}

impl AppConfig {
    fn from_env() -> Result<Self, AppError> {
        let raw_addr =
            env::var("QUICKROSTER_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| AppError::InvalidBindAddr(raw_addr.clone()))?;

        let assignment_api_url =
            env::var("ASSIGNMENT_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        // Fail at startup rather than on the first roster request.
        Url::parse(&assignment_api_url)?;

        Ok(Self {
            bind_addr,
            assignment_api_url,
        })
    }
}

// --- Shared Application State ---

#[derive(Clone)]
struct AppState {
    assignment: Arc<AssignmentService>,
}

// --- Request / Response Bodies ---

#[derive(Debug, Deserialize)]
struct InspectRequest {
    data_type: ImportKind,
    upload: Upload,
}

#[derive(Debug, Serialize)]
struct InspectResponse {
    headers: Vec<String>,
    suggested_mapping: ColumnMapping,
    fields: &'static [column_match::ExpectedField],
}

#[derive(Debug, Deserialize)]
struct ImportRequest {
    upload: Upload,
    mapping: ColumnMapping,
    /// Opaque tenant id, logged for traceability but otherwise untouched.
    organisation_id: Option<String>,
    default_location: Option<DefaultLocation>,
}

// --- Main Application Logic ---

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = AppConfig::from_env()?;
    info!(
        "Configuration loaded. Assignment service: {}",
        config.assignment_api_url
    );

    let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let assignment = Arc::new(AssignmentService::new(
        http_client,
        config.assignment_api_url.clone(),
    ));

    let state = AppState { assignment };

    let import_routes = Router::new()
        .route("/inspect", post(handle_inspect))
        .route("/operatives", post(handle_import_operatives))
        .route("/jobs", post(handle_import_jobs))
        .route("/clients", post(handle_import_clients));
    let api_routes = Router::new()
        .nest("/import", import_routes)
        .route("/roster/generate", post(handle_generate_roster));

    let app = Router::new()
        .nest("/api", api_routes)
        .route("/status", get(handle_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Web Handlers ---

async fn handle_status() -> Html<String> {
    Html(format!(
        "<h1>Server Status</h1><p>Current Time (Server): {}</p><p>Import pipeline ready.</p>",
        chrono::Local::now().to_rfc3339()
    ))
}

/// Decodes an upload and proposes a column mapping for it, without importing
/// anything. The caller can adjust the mapping before committing.
async fn handle_inspect(
    Json(request): Json<InspectRequest>,
) -> Result<Json<InspectResponse>, AppError> {
    let table = decode_upload(&request.upload)?;
    let suggested_mapping = suggest_mapping(&table.headers, request.data_type.matches());

    info!(
        "Inspected upload: {} columns, {} rows, {} auto-mapped",
        table.headers.len(),
        table.rows.len(),
        suggested_mapping.len()
    );

    Ok(Json(InspectResponse {
        headers: table.headers,
        suggested_mapping,
        fields: request.data_type.fields(),
    }))
}

/// Decodes and validates one import upload, shared by the three import
/// endpoints. Returns the table once the mapping checks out.
fn prepare_import(
    request: &ImportRequest,
    kind: ImportKind,
) -> Result<tabular::RawTable, AppError> {
    if let Some(org) = &request.organisation_id {
        info!("Import for organisation {}", org);
    }
    let table = decode_upload(&request.upload)?;
    check_mapping(&request.mapping, &table.headers, kind.fields())?;
    Ok(table)
}

async fn handle_import_operatives(
    Json(request): Json<ImportRequest>,
) -> Result<Json<ParsedBatch<model::Operative>>, AppError> {
    let table = prepare_import(&request, ImportKind::Operative)?;
    let parser = OperativeRowParser::new(request.mapping, request.default_location);
    let batch = parse_rows(&table, |row| parser.parse_row(row));

    info!(
        "Imported operatives: {} accepted, {} rejected",
        batch.records.len(),
        batch.errors.len()
    );
    Ok(Json(batch))
}

async fn handle_import_jobs(
    Json(request): Json<ImportRequest>,
) -> Result<Json<ParsedBatch<model::Job>>, AppError> {
    let table = prepare_import(&request, ImportKind::Job)?;
    let parser = JobRowParser::new(request.mapping);
    let batch = parse_rows(&table, |row| parser.parse_row(row));

    info!(
        "Imported jobs: {} accepted, {} rejected",
        batch.records.len(),
        batch.errors.len()
    );
    Ok(Json(batch))
}

async fn handle_import_clients(
    Json(request): Json<ImportRequest>,
) -> Result<Json<ParsedBatch<model::Client>>, AppError> {
    let table = prepare_import(&request, ImportKind::Client)?;
    let default_location = request.default_location.map(|l| l.name);
    let parser = ClientRowParser::new(request.mapping, default_location);
    let batch = parse_rows(&table, |row| parser.parse_row(row));

    info!(
        "Imported clients: {} accepted, {} rejected",
        batch.records.len(),
        batch.errors.len()
    );
    Ok(Json(batch))
}

async fn handle_generate_roster(
    State(state): State<AppState>,
    Json(request): Json<RosterRequest>,
) -> Result<Json<RosterResponse>, AppError> {
    info!(
        "Generating roster: {} operatives, {} jobs",
        request.operatives.len(),
        request.jobs.len()
    );
    let response = state.assignment.generate_roster(&request).await?;
    Ok(Json(response))
}
