//! # ApiError
//!
//! Outermost error boundary. Every variant maps to one status and one short
//! plain-text body; the detailed cause goes to the log only.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use domains::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Domain(e) => match e {
                DomainError::NotFound => StatusCode::NOT_FOUND,
                DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
                DomainError::BadRequest(_) | DomainError::MalformedUrl(_) => {
                    StatusCode::BAD_REQUEST
                }
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::UpstreamStatus(_) | DomainError::Upstream(_) => {
                    StatusCode::BAD_GATEWAY
                }
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Public response body.
    pub fn body(&self) -> String {
        match self {
            ApiError::MethodNotAllowed => "Method not allowed".to_string(),
            ApiError::Domain(e) => match e {
                DomainError::NotFound => "Not found".to_string(),
                DomainError::Unauthorized => "Unauthorized".to_string(),
                DomainError::BadRequest(_) => "Bad request".to_string(),
                DomainError::MalformedUrl(_) => "Malformed URL".to_string(),
                DomainError::Forbidden(_) => "Forbidden".to_string(),
                DomainError::UpstreamStatus(code) => format!("Upstream returned {code}"),
                DomainError::Upstream(_) => "Bad gateway".to_string(),
                DomainError::Internal(_) => "Internal Server Error".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_status_body_pairs() {
        let cases = [
            (ApiError::MethodNotAllowed, 405, "Method not allowed"),
            (DomainError::NotFound.into(), 404, "Not found"),
            (DomainError::Unauthorized.into(), 401, "Unauthorized"),
            (DomainError::BadRequest("x".into()).into(), 400, "Bad request"),
            (DomainError::MalformedUrl("x".into()).into(), 400, "Malformed URL"),
            (DomainError::Forbidden("h".into()).into(), 403, "Forbidden"),
            (DomainError::UpstreamStatus(404).into(), 502, "Upstream returned 404"),
            (DomainError::Upstream("dns".into()).into(), 502, "Bad gateway"),
            (DomainError::Internal("boom".into()).into(), 500, "Internal Server Error"),
        ];
        for (err, status, body) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.body(), body);
        }
    }

    #[test]
    fn details_stay_out_of_the_body() {
        let err = ApiError::from(DomainError::Internal("secret path /etc".into()));
        assert!(!err.body().contains("/etc"));
    }
}
