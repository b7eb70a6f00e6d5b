use crate::handler::{RelayState, method_not_allowed, submit};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use shared::submission::SUBMIT_PATH;

/// Builds the relay's HTTP surface. Only POST reaches the submission handler;
/// every other method is answered by `method_not_allowed` before the body is
/// read, so it never stages files or calls the collector.
pub fn build_router(state: RelayState, max_request_bytes: usize) -> Router {
    Router::new()
        .route(SUBMIT_PATH, post(submit).fallback(method_not_allowed))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .with_state(state)
}
