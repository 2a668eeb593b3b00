// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and logout.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState, transfer::WalletSnapshot};

/// Passwordless login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address the identity provider confirms
    pub email: String,
}

/// Log in and load the proxy wallet.
///
/// Completes once the identity provider confirms the login. The response
/// contains the derived proxy wallet and its freshly read balance.
#[utoipa::path(
    post,
    path = "/v1/session/login",
    request_body = LoginRequest,
    tag = "Session",
    responses(
        (status = 200, description = "Session started", body = WalletSnapshot),
        (status = 400, description = "Invalid email address"),
        (status = 502, description = "Identity provider unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<WalletSnapshot>, ApiError> {
    let snapshot = state.controller.login(&request.email).await?;
    Ok(Json(snapshot))
}

/// End the session.
///
/// A transfer still awaiting its receipt is not cancelled on-chain, but its
/// result is no longer reported.
#[utoipa::path(
    post,
    path = "/v1/session/logout",
    tag = "Session",
    responses(
        (status = 204, description = "Session ended")
    )
)]
pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.controller.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}
