//! REST API request handlers.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::classify::SplitClassifier;
use crate::config::ServerConfig;
use crate::error::{ClassifyError, OracleError, TrellisError};
use crate::metrics::get_metrics;
use crate::taxonomy::{Dimension, Relation, ResultSerializer, TaxonomySnapshot};

/// Application state shared across handlers.
pub struct ApiState {
    /// Immutable taxonomy snapshot.
    pub snapshot: Arc<TaxonomySnapshot>,
    /// Classification orchestrator.
    pub classifier: Arc<SplitClassifier>,
    /// Accepted MIME types for uploads; empty disables the check.
    pub allowed_mime_types: Vec<String>,
}

impl ApiState {
    /// Create new API state.
    pub fn new(
        snapshot: Arc<TaxonomySnapshot>,
        classifier: Arc<SplitClassifier>,
        server: &ServerConfig,
    ) -> Self {
        Self {
            snapshot,
            classifier,
            allowed_mime_types: server.allowed_mime_types.clone(),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// One parsed multipart upload.
struct Upload {
    /// Caller-supplied logical name (the `name` text part).
    name: Option<String>,
    /// Client file name from the `file` part.
    file_name: Option<String>,
    /// MIME type of the `file` part.
    mime_type: String,
    /// File content.
    content: Bytes,
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// POST /classify - Classify an uploaded learning-material file.
///
/// Multipart form: `file` (required, binary + MIME type) and `name`
/// (optional text). The effective cache name is `name` if present, else
/// the uploaded file's client name, else generated per request.
pub async fn classify_handler(
    State(state): State<Arc<ApiState>>,
    multipart: Multipart,
) -> impl IntoResponse {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err((status, reason)) => return reject_upload(status, reason),
    };

    if upload.content.is_empty() {
        return reject_upload(StatusCode::BAD_REQUEST, "file part is empty".to_string());
    }
    if !state.allowed_mime_types.is_empty()
        && !state.allowed_mime_types.contains(&upload.mime_type)
    {
        return reject_upload(
            StatusCode::BAD_REQUEST,
            format!("unsupported MIME type: {}", upload.mime_type),
        );
    }

    // Empty strings count as absent, so a blank name field still gets a
    // generated one.
    let name = upload
        .name
        .filter(|n| !n.is_empty())
        .or(upload.file_name.filter(|n| !n.is_empty()));

    match state
        .classifier
        .classify(name.as_deref(), &upload.mime_type, upload.content)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result.to_response(&state.snapshot))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /ontology - The full taxonomy as per-dimension trees.
pub async fn ontology_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let serializer = ResultSerializer::new(&state.snapshot);
    let body = json!({
        "taxonomy": {
            "areas": serializer
                .serialize_tree(state.classifier.roots(Dimension::Area), Relation::HasPart),
            "abilities": serializer
                .serialize_tree(state.classifier.roots(Dimension::Ability), Relation::HasPart),
            "scopes": serializer
                .serialize_tree(state.classifier.roots(Dimension::Scope), Relation::HasPart),
        }
    });
    Json(body)
}

/// GET /health - Service health.
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "trellis",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /metrics - Prometheus text exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    get_metrics().export_prometheus()
}

// ============================================================================
// Helpers
// ============================================================================

/// Drain the multipart stream into an [`Upload`].
///
/// Multipart read failures keep their own status code; a body over the
/// router's size limit surfaces mid-stream and must stay a 413, not a
/// generic 400.
async fn read_upload(
    mut multipart: Multipart,
) -> std::result::Result<Upload, (StatusCode, String)> {
    let mut name = None;
    let mut file_name = None;
    let mut mime_type = None;
    let mut content = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                mime_type = field.content_type().map(|s| s.to_string());
                content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| (e.status(), e.body_text()))?,
                );
            }
            "name" => {
                name = Some(field.text().await.map_err(|e| (e.status(), e.body_text()))?);
            }
            _ => {}
        }
    }

    let content =
        content.ok_or_else(|| (StatusCode::BAD_REQUEST, "missing file part".to_string()))?;
    Ok(Upload {
        name,
        file_name,
        mime_type: mime_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        content,
    })
}

fn reject_upload(status: StatusCode, reason: String) -> Response {
    get_metrics().uploads_rejected_total.inc();
    tracing::debug!(reason = %reason, "Rejected upload");
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return (
            status,
            Json(ErrorResponse {
                error: reason,
                code: "payload_too_large".to_string(),
            }),
        )
            .into_response();
    }
    error_response(&ClassifyError::InvalidUpload(reason).into())
}

fn error_response(err: &TrellisError) -> Response {
    let (status, code) = error_status(err);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

// Upload and validation failures are the caller's fault; everything the
// oracle breaks maps to 502.
fn error_status(err: &TrellisError) -> (StatusCode, &'static str) {
    match err {
        TrellisError::Classify(ClassifyError::InvalidUpload(_)) => {
            (StatusCode::BAD_REQUEST, "invalid_upload")
        }
        TrellisError::Classify(_) => (StatusCode::BAD_GATEWAY, "unmatched_term"),
        TrellisError::Oracle(OracleError::Timeout) => (StatusCode::BAD_GATEWAY, "oracle_timeout"),
        TrellisError::Oracle(_) => (StatusCode::BAD_GATEWAY, "oracle_unavailable"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}
