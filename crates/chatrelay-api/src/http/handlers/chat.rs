//! Chat endpoint.
//!
//! POST /chat - one user turn in, one model reply out.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, header};
use tracing::Instrument;

use chatrelay_types::chat::{ChatReply, ChatRequest};

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /chat - Generate (or replay) a reply for `user_input`.
///
/// Only `application/json` itself is accepted (415 otherwise); `+json`
/// subtypes are not. Any unparsable body answers 400.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    if !declares_json(&headers) {
        tracing::warn!("Rejected request without a JSON content type");
        return Err(AppError::UnsupportedMediaType);
    }
    let Json(request) = payload?;

    let request_id = uuid::Uuid::now_v7();
    let span = tracing::info_span!("chat_request", %request_id);

    async move {
        tracing::debug!(?request, "Received chat request");
        let reply = state.chat_service.chat(&request).await?;
        Ok::<_, AppError>(Json(reply))
    }
    .instrument(span)
    .await
}

/// Media type essence is `application/json`. Parameters are ignored and,
/// as for any media type, so is ASCII case.
fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}
