//! Flashka kiosk binary entrypoint wiring the game API, SSE, static files and device storage.

use std::{env, net::SocketAddr, path::Path, sync::Arc};

use anyhow::Context;
use axum::{Router, body::Body, http::Request, middleware::{self, Next}, response::Response};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flashka_kiosk::{
    config::AppConfig,
    dao::device_store::{DeviceStore, file::FileDeviceStore, memory::MemoryDeviceStore},
    routes,
    services::notifier::HttpNotifier,
    state::{AppState, SharedState},
};

/// Device store path that keeps the counters in memory only.
const IN_MEMORY_STORE: &str = ":memory:";
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    let device_store = open_device_store(&config.device_store_path);
    let notifier = HttpNotifier::new(config.notifications.clone())
        .context("building tracking client")?;
    info!(
        public_dir = %config.public_dir.display(),
        preset = ?config.variant.preset,
        "configuration ready"
    );

    let app_state = AppState::new(config, device_store, Arc::new(notifier));
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

fn open_device_store(path: &Path) -> Arc<dyn DeviceStore> {
    if path.as_os_str() == IN_MEMORY_STORE {
        warn!("device store kept in memory; plays and lock reset on restart");
        Arc::new(MemoryDeviceStore::default())
    } else {
        info!(path = %path.display(), "using file device store");
        Arc::new(FileDeviceStore::new(path))
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    info!(method = %request.method(), uri = %request.uri(), "incoming request");
    next.run(request).await
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}
