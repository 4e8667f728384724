use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::LedgerError;
use crate::presentation::UploadResponse;
use crate::settings::Settings;
use crate::upload::process_upload;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Read-only for the life of the server; requests share nothing else.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/upload/", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: &str, settings: Settings) -> anyhow::Result<()> {
    let state = AppState {
        settings: Arc::new(settings),
    };
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!(error = %self.0, "rejected upload");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "upload processing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Spreadsheet processing API" }))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LedgerError::Upload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| LedgerError::Upload(e.to_string()))?;
        upload = Some((file_name, bytes));
        break;
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| LedgerError::Upload("missing multipart field 'file'".to_string()))?;
    info!(file = %file_name, size = bytes.len(), "processing upload");

    let settings = Arc::clone(&state.settings);
    let body = tokio::task::spawn_blocking(move || process_upload(&file_name, &bytes, &settings))
        .await
        .map_err(|e| LedgerError::Other(format!("processing task failed: {e}")))??;
    Ok(Json(body))
}
