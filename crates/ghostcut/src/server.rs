//! HTTP API server.
//!
//! Exposes the compression and audit pipelines as a JSON HTTP API for the
//! dashboard frontend.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/compress` | Chunk, summarize, and verify a document |
//! | `POST` | `/audit` | Audit retrieval quality for a query |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! The last session is kept in memory: re-uploading a byte-identical
//! document returns the cached compression result, and a follow-up audit
//! for the same document reuses the chunks compression produced.
//!
//! # Error Contract
//!
//! All error responses use one envelope:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "audit query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `rate_limited` (429),
//! `producer_error` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support the
//! browser-based dashboard.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};

use ghostcut_core::audit::GroundedAuditReport;
use ghostcut_core::models::Chunk;
use ghostcut_core::producer::ClaimsProducer;

use crate::config::Config;
use crate::pipeline::{run_audit, run_compress, CompressResponse};
use crate::session::DocumentSession;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    producer: Arc<dyn ClaimsProducer>,
    /// The most recent document session, for re-upload detection and
    /// chunk reuse between `/compress` and `/audit`.
    last_session: Arc<Mutex<Option<DocumentSession>>>,
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until the process is terminated. Returns an error if binding fails.
pub async fn run_server(config: &Config, producer: Arc<dyn ClaimsProducer>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        config: Arc::new(config.clone()),
        producer,
        last_session: Arc::new(Mutex::new(None)),
    };

    let app = Router::new()
        .route("/compress", post(handle_compress))
        .route("/audit", post(handle_audit))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("GhostCut server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Map pipeline errors to the most appropriate HTTP status. Validation
/// failures from the core (malformed trees, out-of-bounds audit numbers,
/// empty input) are client errors; producer transport failures are 502;
/// rate limits surface as 429.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = err.to_string();

    if msg.contains("Rate limit") {
        AppError {
            status: StatusCode::TOO_MANY_REQUESTS,
            code: "rate_limited".to_string(),
            message: msg,
        }
    } else if msg.contains("must not be empty")
        || msg.contains("no text")
        || msg.contains("out of range")
        || msg.contains("document-level root")
        || msg.contains("expected")
        || msg.contains("disabled")
    {
        bad_request(msg)
    } else if msg.contains("Producer API error") || msg.contains("did not match schema") {
        AppError {
            status: StatusCode::BAD_GATEWAY,
            code: "producer_error".to_string(),
            message: msg,
        }
    } else {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: msg,
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /compress ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompressRequest {
    file_name: String,
    text: String,
}

async fn handle_compress(
    State(state): State<AppState>,
    Json(req): Json<CompressRequest>,
) -> Result<Json<CompressResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }

    let cached = cached_report(&state.last_session.lock().unwrap(), &req.file_name, &req.text);
    if let Some(report) = cached {
        return Ok(Json(report));
    }

    let mut session = DocumentSession::new(req.file_name, req.text);
    let response = run_compress(&state.config, state.producer.as_ref(), &mut session)
        .await
        .map_err(classify_error)?;

    *state.last_session.lock().unwrap() = Some(session);
    Ok(Json(response))
}

/// Cached response for a byte-identical re-upload of the same document.
fn cached_report(
    cache: &Option<DocumentSession>,
    file_name: &str,
    text: &str,
) -> Option<CompressResponse> {
    let prev = cache.as_ref()?;
    if prev.file_name == file_name && prev.same_document(text) {
        prev.report.clone()
    } else {
        None
    }
}

// ============ POST /audit ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditRequest {
    query: String,
    text: String,
    /// Chunks from a previous `/compress` response; recomputed from the
    /// text when omitted.
    #[serde(default)]
    chunks: Vec<Chunk>,
}

async fn handle_audit(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> Result<Json<GroundedAuditReport>, AppError> {
    let reused = take_matching_session(&mut state.last_session.lock().unwrap(), &req.text);
    let mut session = match reused {
        Some(prev) => prev,
        None => {
            let mut session = DocumentSession::new("audit", req.text);
            session.chunks = req.chunks;
            session
        }
    };

    let result = run_audit(&state.config, state.producer.as_ref(), &mut session, &req.query).await;
    *state.last_session.lock().unwrap() = Some(session);

    Ok(Json(result.map_err(classify_error)?))
}

/// Take the cached session when it holds the same document, so the audit
/// runs over the chunks compression already produced.
fn take_matching_session(
    cache: &mut Option<DocumentSession>,
    text: &str,
) -> Option<DocumentSession> {
    if cache.as_ref().is_some_and(|s| s.same_document(text)) {
        cache.take()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ReportStats;
    use ghostcut_core::chunk::chunk_text;
    use ghostcut_core::quality::analyze_quality;
    use ghostcut_core::stats::aggregate;

    fn session_with_report(file_name: &str, text: &str) -> DocumentSession {
        let mut session = DocumentSession::new(file_name, text);
        session.report = Some(CompressResponse {
            chunks: Vec::new(),
            summaries: Vec::new(),
            verification_stats: ReportStats {
                stats: aggregate(&[]),
                quality: analyze_quality(&[], ""),
            },
            executive_alerts: Vec::new(),
            ai_decisions: Vec::new(),
            raw_text_preview: String::new(),
        });
        session
    }

    #[test]
    fn test_cached_report_hit_on_byte_identical_reupload() {
        let cache = Some(session_with_report("report.txt", "body text"));
        assert!(cached_report(&cache, "report.txt", "body text").is_some());
    }

    #[test]
    fn test_cached_report_misses_on_changed_text_or_name() {
        let cache = Some(session_with_report("report.txt", "body text"));
        assert!(cached_report(&cache, "report.txt", "edited body").is_none());
        assert!(cached_report(&cache, "other.txt", "body text").is_none());
        assert!(cached_report(&None, "report.txt", "body text").is_none());
    }

    #[test]
    fn test_cached_report_misses_without_results() {
        let cache = Some(DocumentSession::new("report.txt", "body text"));
        assert!(cached_report(&cache, "report.txt", "body text").is_none());
    }

    #[test]
    fn test_take_matching_session_hands_over_chunks() {
        let mut session = DocumentSession::new("report.txt", "line one\nline two");
        session.chunks = chunk_text("line one\nline two");
        let mut cache = Some(session);

        let reused = take_matching_session(&mut cache, "line one\nline two").unwrap();
        assert_eq!(reused.chunks.len(), 1);
        assert!(cache.is_none());
    }

    #[test]
    fn test_take_matching_session_leaves_mismatch_cached() {
        let mut cache = Some(DocumentSession::new("report.txt", "original"));
        assert!(take_matching_session(&mut cache, "different text").is_none());
        assert!(cache.is_some());
    }
}
