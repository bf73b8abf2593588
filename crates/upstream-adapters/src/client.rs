//! Shared `reqwest` client construction and error mapping.

use std::time::Duration;

use domains::DomainError;
use reqwest::{Client, Response};

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    /// Sent as `User-Agent` on every request.
    pub user_agent: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

pub fn build_client(settings: &UpstreamSettings) -> Result<Client, DomainError> {
    Client::builder()
        .user_agent(settings.user_agent.clone())
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(settings.timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| DomainError::Internal(format!("http client: {e}")))
}

/// Transport failures (DNS, connect, timeout) all count as a bad upstream.
pub(crate) fn transport_error(target: &str, err: reqwest::Error) -> DomainError {
    tracing::warn!(target_url = %target, error = %err, "upstream request failed");
    DomainError::Upstream(err.to_string())
}

/// Passes 2xx responses through and turns anything else into
/// [`DomainError::UpstreamStatus`].
pub(crate) fn require_success(target: &str, resp: Response) -> Result<Response, DomainError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        tracing::warn!(target_url = %target, status = status.as_u16(), "upstream returned error status");
        Err(DomainError::UpstreamStatus(status.as_u16()))
    }
}
