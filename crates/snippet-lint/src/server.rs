//! HTTP server exposing `POST /analyze`.
//!
//! The server is a presentation layer over [`snippet_lint_core::analyze_code`].
//! Request body: `{"code": "..."}`. A missing, null, or unparseable body is
//! analyzed as empty code rather than rejected. Analysis runs on the
//! blocking pool because the external backend spawns a process.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use snippet_lint_core::{
    AnalysisError, AnalysisReport, AnalysisResult, AnalyzeOptions, Backend, Config, ConfigResult,
    ExternalAnalyzer, FailurePolicy, analyze_code, check_input_size,
};

const BODY_HEADROOM: usize = 64 * 1024;

/// Body of `POST /analyze`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    /// Code to analyze. Absent or `null` means empty.
    #[serde(default)]
    pub code: Option<String>,
}

impl AnalyzeRequest {
    /// Parse a request body leniently; anything unparseable is an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "unparseable request body; analyzing empty code");
            Self::default()
        })
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let status = match err {
            AnalysisError::InputTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AnalysisError::External(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::InvalidLineLength(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "analysis failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

struct ExternalBackend {
    analyzer: Box<dyn ExternalAnalyzer>,
    on_failure: FailurePolicy,
}

/// Immutable settings shared by all requests.
pub struct AppState {
    options: AnalyzeOptions,
    max_input_bytes: Option<usize>,
    external: Option<ExternalBackend>,
}

impl AppState {
    /// State using the built-in rules backend.
    pub const fn new(options: AnalyzeOptions, max_input_bytes: Option<usize>) -> Self {
        Self {
            options,
            max_input_bytes,
            external: None,
        }
    }

    /// Route diagnostics through an external analyzer instead of the rules.
    pub fn with_external<A>(mut self, analyzer: A, on_failure: FailurePolicy) -> Self
    where
        A: ExternalAnalyzer + 'static,
    {
        self.external = Some(ExternalBackend {
            analyzer: Box::new(analyzer),
            on_failure,
        });
        self
    }

    /// Build state from loaded configuration.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let options = AnalyzeOptions {
            max_line_length: config.line_length(),
        };
        let state = Self::new(options, config.max_input());
        Ok(match config.external_analyzer()? {
            Some(analyzer) => state.with_external(analyzer, config.external.on_failure),
            None => state,
        })
    }

    fn backend(&self) -> Backend<'_> {
        match self.external {
            Some(ref ext) => Backend::External {
                analyzer: ext.analyzer.as_ref(),
                on_failure: ext.on_failure,
            },
            None => Backend::Rules,
        }
    }

    /// Analyze one snippet with these settings.
    pub fn analyze(&self, code: &str) -> AnalysisResult<AnalysisReport> {
        check_input_size(code, self.max_input_bytes)?;
        analyze_code(code, &self.options, self.backend())
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    // Headroom over the code limit for JSON framing and escapes.
    let body_limit = match state.max_input_bytes {
        Some(limit) => DefaultBodyLimit::max(limit.saturating_mul(2).saturating_add(BODY_HEADROOM)),
        None => DefaultBodyLimit::disable(),
    };
    Router::new()
        .route("/analyze", post(analyze_handler))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

#[tracing::instrument(skip_all, fields(body_len = body.len()))]
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AnalysisReport>, ApiError> {
    let code = AnalyzeRequest::from_body(&body).code.unwrap_or_default();

    let report = tokio::task::spawn_blocking(move || state.analyze(&code))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("analysis task failed: {e}"),
        })??;

    tracing::debug!(comments = report.comments.len(), "request analyzed");
    Ok(Json(report))
}

/// Serve on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
