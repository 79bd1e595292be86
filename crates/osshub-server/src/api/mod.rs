//! HTTP surface of the gateway

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal, sync::oneshot};
use tracing::{info, warn};

use crate::audit::{AuditRecorder, AuditStore};
use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::hub::{HubClient, TokenProvider};
use crate::inbound::InboundReceiver;
use crate::middleware;
use crate::relay::{OutboundRelay, Payloads};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<OutboundRelay>,
    pub inbound: Arc<InboundReceiver>,
    pub tokens: Arc<TokenProvider>,
    pub payloads: Arc<Payloads>,
    /// Public base URL of this gateway
    pub app_url: Arc<str>,
}

impl AppState {
    /// Wire the components from configuration and an audit store
    pub fn new(
        config: &Config,
        store: Arc<dyn AuditStore>,
        payloads: Payloads,
    ) -> ServerResult<Self> {
        let hub = HubClient::new(&config.hub).map_err(|e| ServerError::Config(e.to_string()))?;
        let tokens = TokenProvider::new(hub.clone(), &config.hub);
        let recorder = AuditRecorder::new(store, config.audit.failure_policy);

        let relay = OutboundRelay::new(
            hub,
            tokens.clone(),
            recorder.clone(),
            config.hub.auth_failure,
        );

        Ok(Self {
            relay: Arc::new(relay),
            inbound: Arc::new(InboundReceiver::new(recorder)),
            tokens: Arc::new(tokens),
            payloads: Arc::new(payloads),
            app_url: Arc::from(config.app.url.as_str()),
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    Router::new()
        // Outbound, relayed to the hub
        .route("/health", get(handlers::health))
        .route("/login", get(handlers::login))
        .route("/set-remote-credential", get(handlers::set_remote_credential))
        .route("/license-final", get(handlers::license_final))
        .route("/license-update", get(handlers::license_update))
        // Inbound, called by the hub
        .route("/receive-nib", post(handlers::receive_nib))
        .route("/receive-file-izin", post(handlers::receive_file_izin))
        .route("/receive-status", post(handlers::receive_status))
        .route("/status", get(handlers::status))
        .with_state(state)
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Bind the listener and serve until a shutdown signal arrives
pub async fn serve(state: AppState, config: &Config) -> anyhow::Result<()> {
    let app = create_router(state, config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    serve_until(
        listener,
        app,
        shutdown_signal(),
        Duration::from_secs(config.server.shutdown_timeout_secs),
    )
    .await
}

/// Serve `app` until `signal` resolves, then drain in-flight requests
///
/// The listener stops accepting as soon as `signal` resolves. Connections
/// still open after `drain_timeout` are dropped.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    drain_timeout: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    let deadline = async move {
        if signalled_rx.await.is_err() {
            return std::future::pending::<()>().await;
        }
        info!(
            "Stopped accepting connections, draining for up to {} seconds",
            drain_timeout.as_secs()
        );
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = &mut server => {
            result?;
            info!("Server shut down gracefully");
        },
        _ = deadline => {
            warn!("Shutdown timeout elapsed, dropping remaining connections");
        },
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
