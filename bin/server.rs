// Company Mentions - Upload Server
// POST a workbook, get the mention report back as JSON or as a CSV/xlsx download

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use company_mentions::{
    init_tracing, process_uploaded_file, Config, IngestError, ReportRow, RunStats,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Upload server for the company mention report
#[derive(Parser, Debug)]
#[command(name = "mentions-server", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "MENTIONS_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (overrides `[server] bind_addr`)
    #[arg(short, long)]
    bind: Option<String>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

/// Report response
#[derive(Serialize)]
struct ReportResponse {
    filename: String,
    generated_at: DateTime<Utc>,
    stats: RunStats,
    rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
struct ProcessParams {
    filename: String,
    #[serde(default)]
    format: ResponseFormat,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResponseFormat {
    #[default]
    Json,
    Csv,
    Xlsx,
}

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

/// Report file name derived from the upload name: `posts.xlsx` → `posts_report.csv`
///
/// Kept to ASCII so it fits a `Content-Disposition` header.
fn report_filename(upload: &str, extension: &str) -> String {
    let stem: String = Path::new(upload)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if stem.is_empty() {
        format!("mentions_report.{}", extension)
    } else {
        format!("{}_report.{}", stem, extension)
    }
}

/// File download response
fn attachment(content_type: &str, filename: String, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET / - Usage text
async fn welcome(State(state): State<AppState>) -> impl IntoResponse {
    let server = &state.config.server;
    format!(
        "👋 Company Mentions {}\n\n\
         Send a workbook with the \"{}\" and \"{}\" sheets:\n\
         POST /api/process?filename=<name>[&format=csv|xlsx]\n\n\
         Accepted: {} (up to {} MB)\n",
        company_mentions::VERSION,
        state.config.workbook.posts_sheet,
        state.config.workbook.roster_sheet,
        server.allowed_extensions.join(", "),
        server.max_upload_bytes / (1024 * 1024)
    )
}

/// POST /api/process - Build the mention report from an uploaded workbook
async fn process_upload(
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
    body: Bytes,
) -> Response {
    let server = &state.config.server;

    if !server.accepts_filename(&params.filename) {
        warn!("Rejected upload {}: unsupported extension", params.filename);
        return failure(
            StatusCode::BAD_REQUEST,
            format!(
                "Unsupported file type, expected one of: {}",
                server.allowed_extensions.join(", ")
            ),
        );
    }
    if body.len() > server.max_upload_bytes {
        warn!("Rejected upload {}: {} bytes", params.filename, body.len());
        return failure(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "File too large: {} bytes (limit {} bytes)",
                body.len(),
                server.max_upload_bytes
            ),
        );
    }
    if body.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Empty upload");
    }

    info!("📥 Upload {} ({} bytes)", params.filename, body.len());

    let config = Arc::clone(&state.config);
    let filename = params.filename.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let upload = store_upload(&config.server.data_dir, &filename, &body)?;
        let report = process_uploaded_file(upload.path(), &config)?;
        Ok::<_, anyhow::Error>(report)
    })
    .await;

    let report = match outcome {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            let bad_input = e
                .downcast_ref::<IngestError>()
                .is_some_and(IngestError::is_format_error);
            if bad_input {
                warn!("Rejected workbook {}: {:#}", params.filename, e);
            } else {
                error!("Processing {} failed: {:#}", params.filename, e);
            }
            return failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Failed to process file: {:#}", e),
            );
        }
        Err(e) => {
            error!("Worker for {} crashed: {}", params.filename, e);
            return failure(StatusCode::INTERNAL_SERVER_ERROR, "Processing worker failed");
        }
    };

    info!("✓ {}: {}", params.filename, report.stats.summary());

    match params.format {
        ResponseFormat::Json => (
            StatusCode::OK,
            Json(ApiResponse::ok(ReportResponse {
                filename: params.filename,
                generated_at: Utc::now(),
                stats: report.stats,
                rows: report.rows,
            })),
        )
            .into_response(),
        ResponseFormat::Csv => match report.to_csv_string(&state.config.report) {
            Ok(csv) => attachment(
                "text/csv; charset=utf-8",
                report_filename(&params.filename, "csv"),
                csv.into_bytes(),
            ),
            Err(e) => {
                error!("Writing CSV for {} failed: {}", params.filename, e);
                failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        },
        ResponseFormat::Xlsx => match report.to_xlsx_bytes(&state.config.report) {
            Ok(bytes) => attachment(
                XLSX_CONTENT_TYPE,
                report_filename(&params.filename, "xlsx"),
                bytes,
            ),
            Err(e) => {
                error!("Writing xlsx for {} failed: {}", params.filename, e);
                failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        },
    }
}

/// Write the upload under a unique name in `data_dir`, keeping its extension
///
/// The file is removed when the returned handle drops.
fn store_upload(data_dir: &str, filename: &str, body: &[u8]) -> anyhow::Result<tempfile::NamedTempFile> {
    use std::io::Write;

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir))?;

    let suffix = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    let mut upload = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile_in(data_dir)
        .context("Failed to create upload file")?;
    upload.write_all(body).context("Failed to store upload")?;
    upload.flush()?;

    Ok(upload)
}

fn app(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/process", post(process_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state.clone());

    // Build main router
    Router::new()
        .route("/", get(welcome))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    info!("🌐 Company Mentions - Upload Server");
    info!("   Posts sheet: {}", config.workbook.posts_sheet);
    info!("   Roster sheet: {}", config.workbook.roster_sheet);
    info!("   Data dir: {}", config.server.data_dir);

    let addr = config.server.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("🚀 Server running on http://{}", addr);
    info!("   API: POST http://{}/api/process?filename=<name>", addr);

    axum::serve(listener, app(state))
        .await
        .context("Server stopped with an error")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
