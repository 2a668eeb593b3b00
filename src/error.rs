// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::session::SessionError;
use crate::transfer::TransferError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "not_authenticated", message)
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        let status = match &error {
            SessionError::NotAuthenticated
            | SessionError::SessionEnded
            | SessionError::OwnerMismatch => StatusCode::UNAUTHORIZED,
            SessionError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            SessionError::Provider(_) => StatusCode::BAD_GATEWAY,
            SessionError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.error_code(), error.to_string())
    }
}

impl From<TransferError> for ApiError {
    fn from(error: TransferError) -> Self {
        let status = match &error {
            TransferError::Session(e) => return e.clone().into(),
            TransferError::Input(_) | TransferError::ChainRejection { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            TransferError::InFlight => StatusCode::CONFLICT,
            TransferError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            TransferError::UnsupportedToken(_) => StatusCode::BAD_GATEWAY,
            TransferError::Encoding(e) => {
                error!(error = %e, "Encoding invariant violated while handling a request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, error.error_code(), error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code.to_string(),
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::EncodingError;
    use crate::transfer::InputError;
    use axum::body::to_bytes;

    #[test]
    fn transfer_errors_map_to_status() {
        let cases = [
            (TransferError::from(InputError::ZeroAmount), StatusCode::UNPROCESSABLE_ENTITY),
            (TransferError::from(SessionError::NotAuthenticated), StatusCode::UNAUTHORIZED),
            (TransferError::InFlight, StatusCode::CONFLICT),
            (TransferError::Network("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (TransferError::UnsupportedToken("decimals".into()), StatusCode::BAD_GATEWAY),
            (
                TransferError::from(EncodingError::EmptyEnvelope),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            let code = error.error_code();
            let api = ApiError::from(error);
            assert_eq!(api.status, status);
            assert_eq!(api.error_code, code);
        }
    }

    #[test]
    fn invalid_email_is_bad_request() {
        let api = ApiError::from(SessionError::InvalidEmail("x".into()));
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error_code, "invalid_email");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::not_found("No active transfer").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"No active transfer","error_code":"not_found"}"#);
    }
}
