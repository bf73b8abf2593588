//! # Purge routes
//!
//! `POST /purge/github` only. Every other path or method is a plain 404.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use domains::DomainError;
use services::PurgeCoordinator;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

pub const PURGE_PATH: &str = "/purge/github";

#[derive(Clone)]
pub struct PurgeState {
    pub coordinator: Arc<PurgeCoordinator>,
}

pub fn router(state: PurgeState) -> Router {
    Router::new()
        .route(PURGE_PATH, post(purge_github).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn purge_github(
    State(state): State<PurgeState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    state.coordinator.purge(authorization, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn not_found() -> Response {
    ApiError::from(DomainError::NotFound).into_response()
}
