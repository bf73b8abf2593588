//! Shared fixtures for the integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use domains::{Clock, PurgeNotifier, Result};
use tokio::net::TcpListener;

/// 2023-11-14T22:13:20Z
pub const NOW_MS: i64 = 1_700_000_000_000;

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Notifier that remembers every URL it was asked to purge.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    urls: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PurgeNotifier for RecordingNotifier {
    async fn request_purge(&self, image_url: &str) -> Result<()> {
        self.urls.lock().unwrap().push(image_url.to_string());
        Ok(())
    }
}

/// Serves `app` on an ephemeral localhost port until the test ends.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Shared, cloneable log for fake upstream servers.
pub type RequestLog = Arc<Mutex<Vec<String>>>;
