// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2024-2025 Matter Labs

//! Logging related stuff

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// A log level parser for clap, with "off", "error", "warn", "info", "debug", "trace" as valid values
#[derive(Clone)]
pub struct LogLevelParser;

impl clap::builder::TypedValueParser for LogLevelParser {
    type Value = LevelFilter;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        clap::builder::TypedValueParser::parse(self, cmd, arg, value.to_owned())
    }

    fn parse(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: std::ffi::OsString,
    ) -> Result<Self::Value, clap::Error> {
        let p = clap::builder::PossibleValuesParser::new([
            "off", "error", "warn", "info", "debug", "trace",
        ]);
        let v = p.parse(cmd, arg, value)?;

        LevelFilter::from_str(&v).map_err(|_| clap::Error::new(clap::error::ErrorKind::InvalidValue))
    }
}

/// Default filter: `warn` for dependencies, `level` for `crate_name` and `sentinel`.
fn default_filter(crate_name: &str, level: &str) -> EnvFilter {
    match level {
        "off" => EnvFilter::new("off"),
        _ => EnvFilter::new(format!("warn,{crate_name}={level},sentinel={level}")),
    }
}

/// Setup logging for `crate_name` and the `sentinel` crate. `RUST_LOG` takes precedence.
///
/// Logs go to stderr, pretty or as JSON lines depending on `config.json`.
pub fn setup_logging(crate_name: &str, config: &LoggingConfig) -> Result<()> {
    LogTracer::init().context("Failed to set logger")?;

    let level = LevelFilter::from_str(&config.level)
        .with_context(|| format!("invalid log level `{}`", config.level))?;
    let filter = EnvFilter::builder()
        .try_from_env()
        .unwrap_or_else(|_| default_filter(crate_name, &level.to_string().to_lowercase()));

    let subscriber = Registry::default().with(filter);

    if !config.console {
        tracing::subscriber::set_global_default(subscriber)?;
    } else if config.json {
        tracing::subscriber::set_global_default(
            subscriber.with(fmt::layer().json().with_writer(std::io::stderr)),
        )?;
    } else {
        tracing::subscriber::set_global_default(
            subscriber.with(fmt::layer().with_writer(std::io::stderr)),
        )?;
    }

    Ok(())
}
