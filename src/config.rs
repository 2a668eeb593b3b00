// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into an
//! [`AppConfig`] and passed explicitly to the components that need it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RPC_URL` | Polygon JSON-RPC endpoint | `https://polygon-rpc.com/` |
//! | `PROXY_FACTORY_ADDRESS` | Proxy wallet factory contract | `0xaB45c5A4B0c941a2F231C04C3f49182e1A254052` |
//! | `TOKEN_ADDRESS` | ERC-20 token to transfer | USDC.e |
//! | `SIGNER_KEY_PATH` | PEM key used by the local session broker | Required |
//! | `IDENTITY_PROVIDER_KEY` | Publishable identity provider key | Optional |
//! | `RECEIPT_TIMEOUT_SECS` | Bound on waiting for a receipt | `120` |
//! | `RECEIPT_POLL_INTERVAL_MS` | Receipt poll period | `2000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::{
    gateway::{DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT},
    parse_address, NetworkConfig, ReceiptPolling, PROXY_WALLET_FACTORY, USDC_E_TOKEN,
};
use crate::transfer::ControllerSettings;

pub const RPC_URL_ENV: &str = "RPC_URL";
pub const PROXY_FACTORY_ADDRESS_ENV: &str = "PROXY_FACTORY_ADDRESS";
pub const TOKEN_ADDRESS_ENV: &str = "TOKEN_ADDRESS";

/// Path to the PEM private key of the local development broker.
///
/// The key never leaves the broker; it is not logged and not exposed
/// through the API.
pub const SIGNER_KEY_PATH_ENV: &str = "SIGNER_KEY_PATH";

pub const IDENTITY_PROVIDER_KEY_ENV: &str = "IDENTITY_PROVIDER_KEY";
pub const RECEIPT_TIMEOUT_SECS_ENV: &str = "RECEIPT_TIMEOUT_SECS";
pub const RECEIPT_POLL_INTERVAL_MS_ENV: &str = "RECEIPT_POLL_INTERVAL_MS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable selecting the log output format.
///
/// `json` emits one JSON object per line; anything else uses the
/// human-readable format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Everything the service needs to start.
#[derive(Clone)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub factory: Address,
    pub token: Address,
    pub signer_key_path: PathBuf,
    pub identity_provider_key: Option<String>,
    pub receipt_polling: ReceiptPolling,
    pub bind_addr: SocketAddr,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("rpc_url", &self.network.rpc_url)
            .field("factory", &self.factory)
            .field("token", &self.token)
            .field("signer_key_path", &self.signer_key_path)
            .field(
                "identity_provider_key",
                &self.identity_provider_key.as_ref().map(|_| "<redacted>"),
            )
            .field("receipt_polling", &self.receipt_polling)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let network = NetworkConfig::polygon(get(RPC_URL_ENV).as_deref());
        if url::Url::parse(&network.rpc_url).is_err() {
            return Err(ConfigError::Invalid {
                name: RPC_URL_ENV,
                value: network.rpc_url,
                reason: "not a valid URL".to_string(),
            });
        }

        let factory = address_or(
            get(PROXY_FACTORY_ADDRESS_ENV),
            PROXY_FACTORY_ADDRESS_ENV,
            PROXY_WALLET_FACTORY,
        )?;
        let token = address_or(get(TOKEN_ADDRESS_ENV), TOKEN_ADDRESS_ENV, USDC_E_TOKEN)?;

        let signer_key_path = get(SIGNER_KEY_PATH_ENV)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(SIGNER_KEY_PATH_ENV))?;

        let timeout = match get(RECEIPT_TIMEOUT_SECS_ENV) {
            Some(raw) => Duration::from_secs(positive(RECEIPT_TIMEOUT_SECS_ENV, &raw)?),
            None => DEFAULT_RECEIPT_TIMEOUT,
        };
        let interval = match get(RECEIPT_POLL_INTERVAL_MS_ENV) {
            Some(raw) => Duration::from_millis(positive(RECEIPT_POLL_INTERVAL_MS_ENV, &raw)?),
            None => DEFAULT_RECEIPT_POLL_INTERVAL,
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}").parse().map_err(
            |e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV,
                value: host.clone(),
                reason: e.to_string(),
            },
        )?;

        Ok(Self {
            network,
            factory,
            token,
            signer_key_path,
            identity_provider_key: get(IDENTITY_PROVIDER_KEY_ENV),
            receipt_polling: ReceiptPolling { timeout, interval },
            bind_addr,
        })
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            factory: self.factory,
            token: self.token,
        }
    }
}

fn address_or(
    raw: Option<String>,
    name: &'static str,
    default: Address,
) -> Result<Address, ConfigError> {
    match raw {
        Some(raw) => parse_address(raw.trim()).map_err(|e| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Startup configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid {name}={value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
