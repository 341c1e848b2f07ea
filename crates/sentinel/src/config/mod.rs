// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Matter Labs

//! Configuration handling

use crate::{
    attestation::ValidatorGate, error::RosterError, identity::Identity, quorum::AdminRegistry,
};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::trace;

/// Prefix of environment variables overriding configuration values, e.g.
/// `SENTINEL_LOGGING__LEVEL=debug` or `SENTINEL_ADMINISTRATORS=0x..,0x..`.
pub const ENV_PREFIX: &str = "SENTINEL";

/// Verifier deployment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Identity of the admin registry
    pub registry: Identity,
    /// The five founding administrators
    pub administrators: Vec<Identity>,
    /// Identity of the validator gate
    pub validator_gate: Identity,
    /// Registered validator
    pub validator: Identity,
    /// Logging-specific configuration
    pub logging: LoggingConfig,
}

/// Configuration for logging behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// The logging level (e.g., "debug", "info", "warn", "error")
    pub level: String,
    /// Whether to output logs in JSON format
    pub json: bool,
    /// Whether to output logs to console
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            json: false,
            console: true,
        }
    }
}

impl SentinelConfig {
    /// Fresh admin registry view at `sequence`
    pub fn admin_registry(&self, sequence: u64) -> Result<AdminRegistry, RosterError> {
        AdminRegistry::restore(self.registry, self.administrators.iter().copied(), sequence)
    }

    /// Validator gate with no consumed attestations
    pub fn validator_gate(&self) -> ValidatorGate {
        ValidatorGate::new(self.validator_gate, self.validator)
    }
}

/// Load the configuration from defaults, `config/default.*` or `path`, and the environment.
pub fn load_config(path: Option<&Path>) -> Result<SentinelConfig> {
    trace!(?path, "Loading config");

    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("config/default").required(false),
    };

    let config = Config::builder()
        .add_source(Config::try_from(&SentinelConfig::default()).context("default config")?)
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("administrators")
                .try_parsing(false),
        )
        .build()
        .context("reading configuration")?
        .try_deserialize::<SentinelConfig>()
        .context("parsing configuration")?;

    Ok(config)
}
