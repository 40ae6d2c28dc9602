//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;

pub use cli::{CliArgs, Command, RuntimeOverrides, ShellArgs, WeaveArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "weaver";
const ENV_PREFIX: &str = "WEAVER";
const DEFAULT_LATENCY_MIN_MS: u64 = 600;
const DEFAULT_LATENCY_MAX_MS: u64 = 1_399;
const MAX_LATENCY_MS: u64 = 60_000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub source: SourceSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Zero disables staleness.
    pub stale_after_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub latency_min: Duration,
    pub latency_max: Duration,
    /// `None` selects the built-in catalog.
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    source: RawSourceSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &RuntimeOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(seconds) = overrides.stale_after_seconds {
            self.cache.stale_after_seconds = Some(seconds);
        }
        if let Some(min) = overrides.latency_min_ms {
            self.source.latency_min_ms = Some(min);
        }
        if let Some(max) = overrides.latency_max_ms {
            self.source.latency_max_ms = Some(max);
        }
        if let Some(path) = overrides.catalog.as_ref() {
            self.source.catalog_path = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            source,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache);
        let source = build_source_settings(source)?;

        Ok(Self {
            logging,
            cache,
            source,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> CacheSettings {
    CacheSettings {
        stale_after_seconds: cache
            .stale_after_seconds
            .unwrap_or_else(|| CacheConfig::default().stale_after_seconds),
    }
}

fn build_source_settings(source: RawSourceSettings) -> Result<SourceSettings, LoadError> {
    let min_ms = source.latency_min_ms.unwrap_or(DEFAULT_LATENCY_MIN_MS);
    let max_ms = source.latency_max_ms.unwrap_or(DEFAULT_LATENCY_MAX_MS);

    if max_ms > MAX_LATENCY_MS {
        return Err(LoadError::invalid(
            "source.latency_max_ms",
            format!("must not exceed {MAX_LATENCY_MS}"),
        ));
    }
    if min_ms > max_ms {
        return Err(LoadError::invalid(
            "source.latency_min_ms",
            format!("must not exceed source.latency_max_ms ({max_ms})"),
        ));
    }

    let catalog_path = match source.catalog_path {
        Some(path) if path.as_os_str().is_empty() => {
            return Err(LoadError::invalid(
                "source.catalog_path",
                "path must not be empty",
            ));
        }
        other => other,
    };

    Ok(SourceSettings {
        latency_min: Duration::from_millis(min_ms),
        latency_max: Duration::from_millis(max_ms),
        catalog_path,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    stale_after_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSourceSettings {
    latency_min_ms: Option<u64>,
    latency_max_ms: Option<u64>,
    catalog_path: Option<PathBuf>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
