// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{ProxyWallet, TokenBalance, TokenMetadata},
    state::AppState,
    transfer::{
        TransferFailure, TransferPhase, TransferRecord, TransferRequest, TransferResult,
        WalletSnapshot,
    },
};

pub mod health;
pub mod session;
pub mod transfers;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/session/login", post(session::login))
        .route("/session/logout", post(session::logout))
        .route("/wallet", get(wallet::get_wallet))
        .route("/transfers", post(transfers::create_transfer))
        .route("/transfers/current", get(transfers::current_transfer))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        session::login,
        session::logout,
        wallet::get_wallet,
        transfers::create_transfer,
        transfers::current_transfer,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            session::LoginRequest,
            WalletSnapshot,
            ProxyWallet,
            TokenMetadata,
            TokenBalance,
            TransferRequest,
            TransferRecord,
            TransferResult,
            TransferFailure,
            TransferPhase,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Session", description = "Login and logout"),
        (name = "Wallet", description = "Proxy wallet state"),
        (name = "Transfers", description = "Relayed token transfers"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
