// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer submission and status.

use axum::{extract::State, http::StatusCode, Json};
use tracing::debug;

use crate::{
    error::ApiError,
    state::AppState,
    transfer::{TransferRecord, TransferRequest},
};

/// Submit a token transfer from the proxy wallet.
///
/// Input is validated and encoded before responding. Submission and the wait
/// for the receipt continue in the background; poll
/// `GET /v1/transfers/current` for the result.
#[utoipa::path(
    post,
    path = "/v1/transfers",
    request_body = TransferRequest,
    tag = "Transfers",
    responses(
        (status = 202, description = "Transfer accepted", body = TransferRecord),
        (status = 401, description = "Login required"),
        (status = 409, description = "Another transfer is in flight"),
        (status = 422, description = "Invalid destination or amount"),
        (status = 502, description = "Token contract returned unusable metadata"),
        (status = 503, description = "Token metadata unavailable")
    )
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferRecord>), ApiError> {
    let prepared = state.controller.begin_transfer(&request).await?;
    let record = prepared.record().clone();

    let controller = state.controller.clone();
    tokio::spawn(async move {
        // Outcome is recorded by the controller.
        if let Err(e) = controller.execute(prepared).await {
            debug!(error_code = e.error_code(), "Background transfer ended with error");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(record)))
}

/// Most recent transfer of the session.
#[utoipa::path(
    get,
    path = "/v1/transfers/current",
    tag = "Transfers",
    responses(
        (status = 200, description = "Current transfer", body = TransferRecord),
        (status = 401, description = "Login required"),
        (status = 404, description = "No transfer yet")
    )
)]
pub async fn current_transfer(
    State(state): State<AppState>,
) -> Result<Json<TransferRecord>, ApiError> {
    let snapshot = state
        .controller
        .snapshot()
        .await
        .ok_or_else(|| ApiError::unauthorized("Login required"))?;

    snapshot
        .transfer
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No transfer in this session"))
}
