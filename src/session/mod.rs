// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Module
//!
//! Boundary to the identity provider that authenticates end users and holds
//! their signing capability.
//!
//! ## Flow
//!
//! 1. The user asks to log in with an email address
//! 2. The provider confirms out of band and reports the owner address
//! 3. The transfer pipeline asks the broker for an opaque [`RelaySigner`]
//!    bound to that session; key material never leaves the broker
//! 4. Logout destroys the session; results of transfers still in flight are
//!    no longer published
//!
//! Brokers are constructed explicitly with a [`BrokerConfig`] and passed to
//! the controller. There is no process-wide identity client.

pub mod local;

use std::sync::Arc;

use alloy::{
    primitives::{Address, Bytes},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::NetworkConfig;

pub use local::{LocalKeyBroker, LocalKeySigner};

/// An authenticated end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Session {
    /// Externally owned account controlled by the identity provider
    #[schema(value_type = String)]
    pub owner_address: Address,
    /// Whether the provider still considers the user logged in
    pub authenticated: bool,
    /// Email the user logged in with, when the provider reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Construction-time configuration for a broker.
#[derive(Clone)]
pub struct BrokerConfig {
    /// Chain the broker signs for
    pub network: NetworkConfig,
    /// Publishable key identifying this application to the provider
    pub provider_key: Option<String>,
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("network", &self.network.name)
            .field("provider_key", &self.provider_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Opaque signing capability handed out for one session.
#[async_trait]
pub trait RelaySigner: Send + Sync {
    /// Address transactions are signed from.
    fn address(&self) -> Address;

    /// Sign a fully populated transaction request, returning the raw
    /// EIP-2718 encoded transaction.
    async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes, SessionError>;
}

/// Identity provider boundary.
#[async_trait]
pub trait SessionBroker: Send + Sync {
    /// Start a session for `email`. Completes once the provider confirms.
    async fn login(&self, email: &str) -> Result<Session, SessionError>;

    /// End the current session.
    async fn logout(&self) -> Result<(), SessionError>;

    /// Session the provider currently holds, if any.
    async fn current_session(&self) -> Option<Session>;

    /// Signing capability for `session`.
    async fn signer(&self, session: &Session) -> Result<Arc<dyn RelaySigner>, SessionError>;
}

/// Session and signing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No authenticated session
    NotAuthenticated,
    /// Email address rejected before contacting the provider
    InvalidEmail(String),
    /// Session belongs to a different owner than the broker's signer
    OwnerMismatch,
    /// Session ended while an operation was running
    SessionEnded,
    /// Signing failed
    Signing(String),
    /// Provider unavailable or misconfigured
    Provider(String),
}

impl SessionError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotAuthenticated => "not_authenticated",
            SessionError::InvalidEmail(_) => "invalid_email",
            SessionError::OwnerMismatch => "owner_mismatch",
            SessionError::SessionEnded => "session_ended",
            SessionError::Signing(_) => "signing_failed",
            SessionError::Provider(_) => "provider_error",
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NotAuthenticated => write!(f, "Login required"),
            SessionError::InvalidEmail(email) => write!(f, "Invalid email address: {email}"),
            SessionError::OwnerMismatch => {
                write!(f, "Session owner does not match the signing account")
            }
            SessionError::SessionEnded => write!(f, "Session ended"),
            SessionError::Signing(msg) => write!(f, "Signing failed: {msg}"),
            SessionError::Provider(msg) => write!(f, "Identity provider error: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Minimal syntactic check; the provider does the real verification.
pub fn validate_email(email: &str) -> Result<&str, SessionError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(SessionError::InvalidEmail(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert_eq!(validate_email(" user@example.com ").unwrap(), "user@example.com");
        assert!(validate_email("user@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@@example.com").is_err());
        assert!(validate_email("us er@example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(SessionError::NotAuthenticated.error_code(), "not_authenticated");
        assert_eq!(SessionError::SessionEnded.to_string(), "Session ended");
    }

    #[test]
    fn broker_config_debug_redacts_key() {
        let config = BrokerConfig {
            network: NetworkConfig::polygon(None),
            provider_key: Some("pk_live_secret".to_string()),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("pk_live_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
