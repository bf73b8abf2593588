//! Evicts a cache entry by sending `PURGE` to it.

use async_trait::async_trait;
use domains::{DomainError, ProxyEvictor, Result};
use reqwest::{Client, Method};

use crate::client::{require_success, transport_error};

pub struct HttpProxyEvictor {
    client: Client,
    method: Method,
}

impl HttpProxyEvictor {
    pub fn new(client: Client) -> Result<Self> {
        let method = Method::from_bytes(b"PURGE")
            .map_err(|e| DomainError::Internal(format!("PURGE method: {e}")))?;
        Ok(Self { client, method })
    }
}

#[async_trait]
impl ProxyEvictor for HttpProxyEvictor {
    async fn evict(&self, cache_entry_url: &str) -> Result<()> {
        let resp = self
            .client
            .request(self.method.clone(), cache_entry_url)
            .send()
            .await
            .map_err(|e| transport_error(cache_entry_url, e))?;
        require_success(cache_entry_url, resp)?;
        Ok(())
    }
}
