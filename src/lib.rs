pub mod config;
pub mod processing;
pub mod templates;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use config::AppConfig;
use processing::{HeartRateZones, ProcessedTcx, TcxError, process_tcx_upload};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use templates::{render_landing_page, render_parse_failure, render_processed_tcx};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    zones: Arc<HeartRateZones>,
}

pub fn build_app(config: &AppConfig) -> Router {
    let state = AppState {
        zones: Arc::new(config.zones.clone()),
    };

    Router::new()
        .route("/", get(landing_page))
        .route("/upload", post(handle_upload))
        .route("/api/upload", post(handle_api_upload))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state)
}

async fn landing_page() -> Html<String> {
    Html(render_landing_page())
}

enum UploadError {
    Missing,
    Unreadable { status: StatusCode, message: String },
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::Missing => (StatusCode::BAD_REQUEST, "No file provided").into_response(),
            UploadError::Unreadable { status, message } => {
                (status, format!("Failed to read uploaded file: {message}")).into_response()
            }
        }
    }
}

async fn read_uploaded_file(multipart: &mut Multipart) -> Result<Vec<u8>, UploadError> {
    let mut uploaded: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        if field.name() == Some("file") {
            let bytes = field.bytes().await.map_err(unreadable)?;
            uploaded = Some(bytes.to_vec());
        }
    }

    uploaded.ok_or(UploadError::Missing)
}

/// Keeps the multipart error's own status, so an oversized body surfaces as
/// `413 Payload Too Large` rather than a generic bad request.
fn unreadable(err: MultipartError) -> UploadError {
    UploadError::Unreadable {
        status: err.status(),
        message: err.body_text(),
    }
}

async fn reduce_upload(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<Result<ProcessedTcx, TcxError>, UploadError> {
    let bytes = read_uploaded_file(multipart).await?;
    tracing::info!(size = bytes.len(), "received TCX upload");

    let result = process_tcx_upload(Cursor::new(bytes), &state.zones);
    match &result {
        Ok(processed) => tracing::info!(
            duration_sec = processed.metrics.duration_sec,
            distance_m = processed.metrics.distance_m,
            "TCX parsed"
        ),
        Err(err) => tracing::warn!(error = %err, "could not parse TCX"),
    }
    Ok(result)
}

async fn handle_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let span = tracing::info_span!("upload", upload_id = %Uuid::new_v4());

    async move {
        match reduce_upload(&state, &mut multipart).await {
            Ok(Ok(processed)) => Html(render_processed_tcx(&processed)).into_response(),
            Ok(Err(_)) => (StatusCode::BAD_REQUEST, Html(render_parse_failure())).into_response(),
            Err(err) => err.into_response(),
        }
    }
    .instrument(span)
    .await
}

async fn handle_api_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let span = tracing::info_span!("api_upload", upload_id = %Uuid::new_v4());

    async move {
        match reduce_upload(&state, &mut multipart).await {
            Ok(Ok(processed)) => Json(processed).into_response(),
            Ok(Err(err)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "Could not parse TCX", "detail": err.to_string() })),
            )
                .into_response(),
            Err(err) => err.into_response(),
        }
    }
    .instrument(span)
    .await
}
