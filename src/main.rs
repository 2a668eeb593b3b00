// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use relational_proxy_wallet::{
    api::router,
    blockchain::RpcGateway,
    config::{AppConfig, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    session::{BrokerConfig, LocalKeyBroker},
    state::AppState,
    transfer::TransferController,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = AppConfig::from_env()?;
    info!(
        network = %config.network.name,
        chain_id = config.network.chain_id,
        factory = %config.factory,
        token = %config.token,
        "Starting proxy wallet service"
    );

    let gateway = Arc::new(RpcGateway::new(
        config.network.clone(),
        config.receipt_polling,
    )?);

    let broker = LocalKeyBroker::from_pem_file(
        BrokerConfig {
            network: config.network.clone(),
            provider_key: config.identity_provider_key.clone(),
        },
        &config.signer_key_path,
    )?;
    info!(owner = %broker.owner_address(), "Local session broker ready");

    let controller = Arc::new(TransferController::new(
        config.controller_settings(),
        gateway.clone(),
        Arc::new(broker),
    ));
    if let Some(snapshot) = controller.restore().await? {
        info!(proxy = %snapshot.proxy_address, "Restored existing session");
    }

    let app = router(AppState::new(controller, gateway));

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn watch_signals(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
