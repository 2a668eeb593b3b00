// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Development broker backed by a locally held secp256k1 key.
//!
//! Stands in for the hosted identity provider in development and tests: login
//! succeeds immediately for any well-formed email and every session is owned
//! by the configured key. Keys are read from PEM (SEC1 or PKCS#8) or hex.

use std::path::Path;
use std::sync::Arc;

use alloy::{
    eips::eip2718::Encodable2718,
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use k256::SecretKey;
use tokio::sync::RwLock;
use tracing::info;

use super::{validate_email, BrokerConfig, RelaySigner, Session, SessionBroker, SessionError};

/// Signs relay transactions with a local key.
pub struct LocalKeySigner {
    wallet: EthereumWallet,
    address: Address,
    chain_id: u64,
}

impl LocalKeySigner {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        let address = signer.address();
        Self {
            wallet: EthereumWallet::from(signer),
            address,
            chain_id,
        }
    }
}

#[async_trait]
impl RelaySigner for LocalKeySigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_transaction(&self, mut tx: TransactionRequest) -> Result<Bytes, SessionError> {
        match tx.from {
            Some(from) if from != self.address => return Err(SessionError::OwnerMismatch),
            _ => tx.from = Some(self.address),
        }
        if tx.chain_id.is_none() {
            tx.chain_id = Some(self.chain_id);
        }

        let envelope = TransactionBuilder::<Ethereum>::build(tx, &self.wallet)
            .await
            .map_err(|e| SessionError::Signing(e.to_string()))?;

        Ok(Bytes::from(envelope.encoded_2718()))
    }
}

/// Broker whose sessions are all owned by one local key.
pub struct LocalKeyBroker {
    config: BrokerConfig,
    signer: Arc<LocalKeySigner>,
    session: RwLock<Option<Session>>,
}

impl LocalKeyBroker {
    pub fn new(config: BrokerConfig, signer: PrivateKeySigner) -> Self {
        let signer = Arc::new(LocalKeySigner::new(signer, config.network.chain_id));
        Self {
            config,
            signer,
            session: RwLock::new(None),
        }
    }

    /// Create a broker from PEM-encoded private key bytes.
    pub fn from_pem(config: BrokerConfig, pem_bytes: &[u8]) -> Result<Self, SessionError> {
        Ok(Self::new(config, signer_from_pem(pem_bytes)?))
    }

    /// Create a broker from a PEM key file.
    pub fn from_pem_file(config: BrokerConfig, path: &Path) -> Result<Self, SessionError> {
        let pem_bytes = std::fs::read(path).map_err(|e| {
            SessionError::Provider(format!("Failed to read key file {}: {e}", path.display()))
        })?;
        Self::from_pem(config, &pem_bytes)
    }

    /// Owner address of every session this broker creates.
    pub fn owner_address(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait]
impl SessionBroker for LocalKeyBroker {
    async fn login(&self, email: &str) -> Result<Session, SessionError> {
        let email = validate_email(email)?;

        let session = Session {
            owner_address: self.signer.address(),
            authenticated: true,
            email: Some(email.to_string()),
        };
        *self.session.write().await = Some(session.clone());

        info!(
            owner = %session.owner_address,
            network = %self.config.network.name,
            "Local broker session started"
        );
        Ok(session)
    }

    async fn logout(&self) -> Result<(), SessionError> {
        if self.session.write().await.take().is_some() {
            info!("Local broker session ended");
        }
        Ok(())
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn signer(&self, session: &Session) -> Result<Arc<dyn RelaySigner>, SessionError> {
        let current = self.session.read().await;
        match current.as_ref() {
            Some(active) if active.authenticated && active == session => {}
            _ => return Err(SessionError::NotAuthenticated),
        }
        if session.owner_address != self.signer.address() {
            return Err(SessionError::OwnerMismatch);
        }
        Ok(self.signer.clone())
    }
}

/// Parse a private key from PEM format to hex string.
///
/// Accepts SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(SessionError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, SessionError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SessionError::Provider(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| SessionError::Provider(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| SessionError::Provider(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex private key (with or without 0x prefix).
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, SessionError> {
    let key_bytes = alloy::hex::decode(private_key_hex.trim())
        .map_err(|e| SessionError::Provider(format!("Invalid private key: {e}")))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| SessionError::Provider(format!("Invalid private key: {e}")))
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, SessionError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    signer_from_hex(&hex_key)
}
