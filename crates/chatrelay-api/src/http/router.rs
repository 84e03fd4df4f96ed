//! Axum router configuration with middleware.
//!
//! Routes: `POST /chat`, `GET /health`, and, when the web directory exists,
//! `GET /` (its `index.html`) plus `/static/*` assets.
//! Middleware: panic capture, CORS for any origin, request tracing.

use std::any::Any;
use std::path::Path;

use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::error::AppError;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState, web_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let mut router = Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/health", get(handlers::health::health));

    if web_dir.is_dir() {
        let assets = ServeDir::new(web_dir).not_found_service(not_found.into_service());
        router = router
            .route_service("/", ServeFile::new(web_dir.join("index.html")))
            .nest_service("/static", assets);
        tracing::info!(path = %web_dir.display(), "Static file serving enabled");
    } else {
        tracing::warn!(path = %web_dir.display(), "Web directory missing, landing page disabled");
    }

    router
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Internal(detail).into_response()
}
