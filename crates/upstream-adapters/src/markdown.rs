//! # Markdown-render resolver
//!
//! Finds out under which URL the image proxy caches an image by asking the
//! markdown API to render `![image](<url>)` and reading back the rewritten
//! `src` attribute.

use async_trait::async_trait;
use domains::{CacheEntryResolver, DomainError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::Client;

use crate::client::{require_success, transport_error};

const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

static SRC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"src="([^"]+)""#).expect("static regex"));

/// First `src="..."` attribute value in `html`.
pub fn extract_first_src(html: &str) -> Option<&str> {
    SRC_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub struct GithubMarkdownResolver {
    client: Client,
    endpoint: String,
}

impl GithubMarkdownResolver {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CacheEntryResolver for GithubMarkdownResolver {
    async fn resolve_cache_entry_url(&self, image_url: &str) -> Result<String> {
        let body = serde_json::json!({ "text": format!("![image]({image_url})") });

        let resp = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "text/html")
            .header(API_VERSION_HEADER, API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&self.endpoint, e))?;
        let html = require_success(&self.endpoint, resp)?
            .text()
            .await
            .map_err(|e| transport_error(&self.endpoint, e))?;

        match extract_first_src(&html) {
            Some(src) => {
                tracing::debug!(url = %image_url, entry = %src, "resolved cache entry");
                Ok(src.to_string())
            }
            None => Err(DomainError::Upstream(
                "rendered markdown has no image source".to_string(),
            )),
        }
    }
}
