//! # Edge routes
//!
//! `GET|HEAD /<selector>.svg[?link=repository]`. A single fallback handler
//! serves every path so unknown selectors and wrong methods get the same
//! treatment regardless of shape.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use domains::{RenderMode, TimezoneHints};
use services::{EdgeService, ImageRequest};
use tower_http::trace::TraceLayer;
use url::Url;

use crate::error::ApiError;

pub const CACHE_CONTROL_LIVE: &str = "private, no-cache, no-store, must-revalidate, max-age=0";
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; style-src 'unsafe-inline'";
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

const CF_TIMEZONE: HeaderName = HeaderName::from_static("cf-timezone");
const CF_IPCOUNTRY: HeaderName = HeaderName::from_static("cf-ipcountry");
const X_COUNTRY_CODE: HeaderName = HeaderName::from_static("x-country-code");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// HTTP-level knobs that the service itself does not care about.
#[derive(Debug, Clone)]
pub struct EdgeHttpOptions {
    /// Overrides the scheme and authority of the normalized request URL.
    pub public_origin: Option<String>,
    pub static_max_age_secs: u64,
}

impl Default for EdgeHttpOptions {
    fn default() -> Self {
        Self {
            public_origin: None,
            static_max_age_secs: 31_536_000,
        }
    }
}

#[derive(Clone)]
pub struct EdgeState {
    pub service: Arc<EdgeService>,
    pub http: EdgeHttpOptions,
}

pub fn router(state: EdgeState) -> Router {
    Router::new()
        .fallback(serve_image)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn serve_image(
    State(state): State<EdgeState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return ApiError::MethodNotAllowed.into_response();
    }

    let request = image_request(&state.http, &uri, &headers);
    let rendered = match state.service.render(&request) {
        Ok(rendered) => rendered,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let cache_control = match rendered.request.mode {
        RenderMode::Live => CACHE_CONTROL_LIVE.to_string(),
        RenderMode::Static => format!("public, max-age={}", state.http.static_max_age_secs),
    };
    let content_length = rendered.svg.len().to_string();
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(rendered.svg)
    };

    (
        [
            (header::CACHE_CONTROL, cache_control),
            (header::CONTENT_LENGTH, content_length),
            (
                header::CONTENT_SECURITY_POLICY,
                CONTENT_SECURITY_POLICY.to_string(),
            ),
            (header::CONTENT_TYPE, SVG_CONTENT_TYPE.to_string()),
        ],
        body,
    )
        .into_response()
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(&name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Collects what the service needs from the raw request.
pub fn image_request(http: &EdgeHttpOptions, uri: &Uri, headers: &HeaderMap) -> ImageRequest {
    let link = uri.query().and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == "link")
            .map(|(_, value)| value.into_owned())
    });

    ImageRequest {
        path: uri.path().to_string(),
        link,
        user_agent: header_str(headers, header::USER_AGENT),
        via: header_str(headers, header::VIA),
        hints: TimezoneHints {
            edge_timezone: header_str(headers, CF_TIMEZONE),
            edge_country: header_str(headers, CF_IPCOUNTRY),
            client_country: header_str(headers, X_COUNTRY_CODE),
            accept_language: header_str(headers, header::ACCEPT_LANGUAGE),
        },
        normalized_url: normalized_url(http, uri, headers),
    }
}

/// Absolute request URL in canonical form; this is the key the image proxy
/// caches under, so it is what gets purged.
pub fn normalized_url(http: &EdgeHttpOptions, uri: &Uri, headers: &HeaderMap) -> String {
    let origin = match &http.public_origin {
        Some(origin) => origin.clone(),
        None => {
            let proto = header_str(headers, X_FORWARDED_PROTO)
                .and_then(|p| p.split(',').next().map(|s| s.trim().to_string()))
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "http".to_string());
            let host = header_str(headers, header::HOST)
                .or_else(|| uri.authority().map(|a| a.to_string()))
                .unwrap_or_else(|| "localhost".to_string());
            format!("{proto}://{host}")
        }
    };
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let raw = format!("{origin}{path_and_query}");

    match Url::parse(&raw) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::warn!(url = %raw, error = %e, "request URL does not parse; using it verbatim");
            raw
        }
    }
}
