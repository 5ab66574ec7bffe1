//! The HTTP service in front of [`UploadOrchestrator`].
//!
//! Every response carries the same CORS headers, `OPTIONS` on any route is an
//! empty 200, and a method a route does not serve is a JSON 405.
use crate::error::{Error, ErrorKind, Result};
use crate::upload::UploadOrchestrator;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, header};
use axum::routing::{MethodRouter, delete, get, post};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;
mod response;
pub use response::{ApiError, ApiResponse};

/// Default limit on a request body, 64 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: UploadOrchestrator,
    allow_origin: HeaderValue,
    body_limit: usize,
}

impl AppState {
    pub fn new(orchestrator: UploadOrchestrator) -> Self {
        Self {
            orchestrator,
            allow_origin: HeaderValue::from_static("*"),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Set the `Access-Control-Allow-Origin` value.
    pub fn with_allow_origin(self, origin: &str) -> Result<Self> {
        let allow_origin = HeaderValue::from_str(origin)
            .map_err(|_| Error::from_kind(ErrorKind::Config, format!("invalid origin {origin:?}")))?;
        Ok(Self {
            allow_origin,
            ..self
        })
    }

    /// Set the largest request body accepted, in bytes.
    pub fn with_body_limit(self, body_limit: usize) -> Self {
        Self { body_limit, ..self }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    use self::handlers::*;

    let scores = with_preflight(post(add_score));
    let files = with_preflight(get(list_files).post(upload_file).delete(delete_file));

    Router::new()
        .route("/api/scores", scores.clone())
        .route("/add-library-score", scores)
        .route("/api/files", files)
        .route("/files", with_preflight(get(list_files)))
        .route("/upload", with_preflight(post(upload_file)))
        .route("/delete", with_preflight(delete(delete_file)))
        .route("/health", with_preflight(get(health)))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            state.allow_origin.clone(),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn with_preflight(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}
