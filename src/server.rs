use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::app::AuditService;
use crate::config::ServerConfig;
use crate::constants::{SERVICE_NAME, UPLOAD_FIELD};
use crate::error::{AuditError, Result};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AuditService>,
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Audit(AuditError),
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError::Audit(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Audit(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Audit(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };
        warn!(status = status.as_u16(), "{}", detail);
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

/// Uploaded ledger file pulled out of a multipart body
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> std::result::Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::BadRequest(format!(
        "Missing '{}' field in upload",
        UPLOAD_FIELD
    )))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ledger upload endpoint
async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Response, ApiError> {
    let upload = read_upload(&mut multipart).await?;
    let report = state.service.audit(&upload.file_name, &upload.bytes).await?;
    Ok(Json(report.response).into_response())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/upload-csv", post(upload_csv))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

/// Start the HTTP server on the configured port
pub async fn start_server(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = create_router(state, config);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("HTTP server running on http://localhost:{}", config.port);
    info!("Health check: http://localhost:{}/health", config.port);
    info!("Upload:       POST http://localhost:{}/upload-csv", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
