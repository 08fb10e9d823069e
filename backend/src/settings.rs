//! Server configuration loaded via OrthoConfig.
//!
//! Values layer as defaults, then configuration file, then `MARKETPLACE_*`
//! environment variables, then command-line flags.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{VerificationPolicy, VerificationPolicyError};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_CODE_LENGTH: usize = 6;
const DEFAULT_CODE_TTL_SECS: u64 = 600;

/// Errors raised while resolving settings into runtime values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// No database URL was configured.
    #[error("database URL missing: set MARKETPLACE_DATABASE_URL or --database-url")]
    MissingDatabaseUrl,
    /// The bind address did not parse.
    #[error("invalid bind address {value}")]
    InvalidBindAddr {
        /// Rejected input.
        value: String,
    },
    /// The verification settings were out of range.
    #[error(transparent)]
    Verification(#[from] VerificationPolicyError),
}

/// Configuration for the marketplace server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKETPLACE")]
pub struct MarketplaceSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// Upper bound on pooled connections.
    pub pool_max_size: Option<u32>,
    /// Characters in each verification code.
    pub verification_code_length: Option<usize>,
    /// Lifetime of a verification code in seconds.
    pub verification_code_ttl_secs: Option<u64>,
}

impl MarketplaceSettings {
    /// Configured database URL; blank values count as missing.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
        })
    }

    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        Ok(PoolConfig::new(self.database_url()?)
            .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)))
    }

    /// Verification policy assembled from the code length and lifetime.
    pub fn verification_policy(&self) -> Result<VerificationPolicy, SettingsError> {
        let ttl = Duration::from_secs(
            self.verification_code_ttl_secs
                .unwrap_or(DEFAULT_CODE_TTL_SECS),
        );
        Ok(VerificationPolicy::default()
            .with_code_length(
                self.verification_code_length
                    .unwrap_or(DEFAULT_CODE_LENGTH),
            )?
            .with_ttl(ttl)?)
    }
}
