//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events. Applications embedding the
//! graph call [`init`] once with the `logger` section of their [`Config`].
//!
//! [`Config`]: crate::config::Config

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::Result;

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Installs the subscriber when true.
    pub enable: bool,

    /// Minimum level to emit when no override filter is set.
    pub level: LogLevel,

    /// Output layout of each event.
    pub format: Format,

    /// Raw `EnvFilter` directives, e.g. `orkg_graph=trace,warn`. Takes
    /// precedence over `level`.
    pub override_filter: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enable: true,
            level: LogLevel::Info,
            format: Format::Compact,
            override_filter: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Builds the filter directives the subscriber is installed with.
#[must_use]
pub fn directives(config: &LoggerConfig) -> String {
    config
        .override_filter
        .clone()
        .unwrap_or_else(|| config.level.to_string())
}

/// Installs a global `tracing` subscriber according to `config`.
///
/// Installing twice is not an error: the second call keeps the subscriber
/// that is already active.
///
/// # Errors
///
/// Returns an error when the filter directives do not parse.
pub fn init(config: &LoggerConfig) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let filter = EnvFilter::try_new(directives(config))?;
    let fmt_layer = match config.format {
        Format::Compact => subscriber_fmt::layer().compact().boxed(),
        Format::Pretty => subscriber_fmt::layer().pretty().boxed(),
        Format::Json => subscriber_fmt::layer().json().boxed(),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
    {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
    Ok(())
}
