//! Composition roots for the two services.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use api_adapters::edge::{EdgeHttpOptions, EdgeState};
use api_adapters::purge::PurgeState;
use auth_adapters::Sha256TokenVerifier;
use configs::{EdgeSettings, PurgeSettings};
use domains::PurgeNotifier;
use services::clock::build_clock_geometry;
use services::{BackgroundTasks, EdgeOptions, EdgeService, PurgeCoordinator, PurgeOptions, SystemClock};
use storage_adapters::InMemoryPurgeRecordStore;
use tokio::net::TcpListener;
use upstream_adapters::{
    build_client, GithubMarkdownResolver, HttpProxyEvictor, HttpPurgeNotifier, UpstreamSettings,
};

/// How long in-flight deferred purges may keep the process alive after the
/// listener has stopped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn run_edge(settings: EdgeSettings) -> anyhow::Result<()> {
    let EdgeSettings {
        bind_address,
        public_origin,
        purge_endpoint,
        purge_token,
        purge_delay,
        proxy_marker,
        proxy_timestamp_offset_ms,
        static_max_age_secs,
        repository_url,
        user_agent,
        request_timeout,
    } = settings;

    let notifier: Option<Arc<dyn PurgeNotifier>> = match purge_token {
        Some(token) => {
            let client = build_client(&UpstreamSettings {
                user_agent,
                timeout: request_timeout,
            })?;
            tracing::info!(endpoint = %purge_endpoint, "deferred purges enabled");
            Some(Arc::new(HttpPurgeNotifier::new(client, purge_endpoint, token)))
        }
        None => {
            tracing::warn!("no purge token configured; proxied live images will go stale");
            None
        }
    };

    let tasks = BackgroundTasks::new();
    let service = EdgeService::new(
        Arc::new(SystemClock),
        build_clock_geometry(),
        notifier,
        tasks.clone(),
        EdgeOptions {
            proxy_marker,
            proxy_timestamp_offset_ms,
            purge_delay,
            repository_url,
        },
    );
    let app = api_adapters::edge::router(EdgeState {
        service: Arc::new(service),
        http: EdgeHttpOptions {
            public_origin,
            static_max_age_secs,
        },
    });

    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;
    tracing::info!(addr = %listener.local_addr()?, "edge listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("edge server")?;

    tracing::info!(pending = tasks.len(), "waiting for deferred purges");
    tasks.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}

pub async fn run_purge(settings: PurgeSettings) -> anyhow::Result<()> {
    let verifier = Sha256TokenVerifier::from_hex(&settings.auth_token_sha256)?;
    let store = InMemoryPurgeRecordStore::new();
    let client = build_client(&UpstreamSettings {
        user_agent: settings.user_agent.clone(),
        timeout: settings.request_timeout,
    })?;
    let resolver = GithubMarkdownResolver::new(client.clone(), settings.markdown_api_url.clone());
    let evictor = HttpProxyEvictor::new(client)?;

    let coordinator = PurgeCoordinator::new(
        Arc::new(verifier),
        Arc::new(store.clone()),
        Arc::new(resolver),
        Arc::new(evictor),
        PurgeOptions {
            allowed_hosts: settings.allowed_hosts.clone(),
            record_ttl: settings.record_ttl,
        },
    );
    let app = api_adapters::purge::router(PurgeState {
        coordinator: Arc::new(coordinator),
    });

    let sweeper = tokio::spawn(sweep_records(store, settings.sweep_interval));

    let listener = TcpListener::bind(settings.bind_address)
        .await
        .with_context(|| format!("binding {}", settings.bind_address))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        hosts = ?settings.allowed_hosts,
        "purge coordinator listening"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("purge server");
    sweeper.abort();
    served
}

async fn sweep_records(store: InMemoryPurgeRecordStore, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // First tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let removed = store.sweep_expired();
        tracing::debug!(removed, remaining = store.len(), "purge record sweep");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
