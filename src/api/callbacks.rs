use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::services::CallbackProcessor;

#[derive(Clone)]
pub struct CallbackState {
    pub processor: Arc<CallbackProcessor>,
}

/// POST /callbacks/onepay
///
/// Always answers HTTP 200 with a bare `SUCCESS` or `ERROR` token; the
/// platform's retry logic keys on the body, not the status code.
pub async fn handle_onepay_callback(
    State(state): State<CallbackState>,
    body: String,
) -> impl IntoResponse {
    info!(bytes = body.len(), "received OnePay callback");
    let ack = state.processor.process(&body).await;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        ack.as_str(),
    )
}
