// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{error::ApiError, state::AppState, transfer::WalletSnapshot};

/// Current wallet state: owner, proxy address, balance and transfer status.
///
/// Served from the cached session state; does not query the chain.
#[utoipa::path(
    get,
    path = "/v1/wallet",
    tag = "Wallet",
    responses(
        (status = 200, description = "Wallet state", body = WalletSnapshot),
        (status = 401, description = "Login required")
    )
)]
pub async fn get_wallet(State(state): State<AppState>) -> Result<Json<WalletSnapshot>, ApiError> {
    state
        .controller
        .snapshot()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::unauthorized("Login required"))
}
