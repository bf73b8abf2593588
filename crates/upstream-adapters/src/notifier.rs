//! Edge -> coordinator call: `POST {endpoint}` with `{"url": ...}`.

use async_trait::async_trait;
use domains::{PurgeNotifier, PurgePayload, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::client::{require_success, transport_error};

pub struct HttpPurgeNotifier {
    client: Client,
    endpoint: String,
    token: SecretString,
}

impl HttpPurgeNotifier {
    pub fn new(client: Client, endpoint: impl Into<String>, token: SecretString) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl PurgeNotifier for HttpPurgeNotifier {
    async fn request_purge(&self, image_url: &str) -> Result<()> {
        let payload = PurgePayload {
            url: image_url.to_string(),
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(&self.endpoint, e))?;
        require_success(&self.endpoint, resp)?;
        Ok(())
    }
}
