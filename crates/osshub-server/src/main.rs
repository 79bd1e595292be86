//! OSSHUB Gateway Server - Main entry point

use anyhow::Result;
use osshub_common::logging::{init_logging, LogConfig};
use tracing::info;

use osshub_server::{api, config::Config, db, relay::Payloads};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("osshub-server")
        .filter_directives("osshub_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting OSSHUB gateway");

    let config = Config::load()?;
    info!(
        hub = %config.hub.endpoint,
        store = ?config.audit.store,
        policy = ?config.audit.failure_policy,
        "Configuration loaded - server will bind to {}:{}",
        config.server.host,
        config.server.port
    );

    let store = db::open_audit_store(&config).await?;

    let payloads = Payloads::load(config.hub.payload_file.as_deref(), &config.app.url)?;
    info!(
        payload_file = ?config.hub.payload_file,
        callback = %payloads.credential.remote_url,
        "Outbound payloads loaded"
    );

    let state = api::AppState::new(&config, store, payloads)?;
    api::serve(state, &config).await
}
