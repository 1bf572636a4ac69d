//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroU64, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::criteria::FormField;

pub mod cli;

pub use cli::{CliArgs, ConsoleOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "rights-debugger";
const ENV_PREFIX: &str = "RIGHTS_DEBUGGER";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TERM_FIELD: &str = "q";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub search: SearchSettings,
    pub revoke: RevokeSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub endpoint: Url,
    pub method: SearchMethod,
    pub timeout: Duration,
    pub term_field: String,
    /// Form inputs in document order.
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone)]
pub struct RevokeSettings {
    pub timeout: Duration,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    Get,
    Post,
}

impl FromStr for SearchMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            other => Err(format!("unsupported method `{other}`")),
        }
    }
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

/// Parse CLI arguments and load settings.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
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
    search: RawSearchSettings,
    revoke: RawRevokeSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSearchSettings {
    endpoint: Option<String>,
    method: Option<String>,
    timeout_seconds: Option<u64>,
    term_field: Option<String>,
    fields: Option<Vec<FormField>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevokeSettings {
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &ConsoleOverrides) {
        if let Some(endpoint) = overrides.endpoint.as_ref() {
            self.search.endpoint = Some(endpoint.clone());
        }
        if let Some(method) = overrides.method.as_ref() {
            self.search.method = Some(method.clone());
        }
        if let Some(seconds) = overrides.search_timeout_seconds {
            self.search.timeout_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.revoke_timeout_seconds {
            self.revoke.timeout_seconds = Some(seconds);
        }
        if let Some(field) = overrides.term_field.as_ref() {
            self.search.term_field = Some(field.clone());
        }
        if !overrides.fields.is_empty() || !overrides.fixed_fields.is_empty() {
            let search = overrides
                .fields
                .iter()
                .map(|(name, value)| FormField::search(name, value));
            let fixed = overrides
                .fixed_fields
                .iter()
                .map(|(name, value)| FormField::fixed(name, value));
            self.search.fields = Some(search.chain(fixed).collect());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            search,
            revoke,
            logging,
        } = raw;

        Ok(Self {
            search: build_search_settings(search)?,
            revoke: build_revoke_settings(revoke)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_search_settings(search: RawSearchSettings) -> Result<SearchSettings, LoadError> {
    let endpoint = search
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoadError::invalid("search.endpoint", "endpoint URL is required"))?;
    let endpoint = Url::parse(endpoint)
        .map_err(|err| LoadError::invalid("search.endpoint", format!("failed to parse: {err}")))?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "search.endpoint",
            "scheme must be http or https",
        ));
    }

    let method = match search.method {
        Some(method) => SearchMethod::from_str(&method)
            .map_err(|reason| LoadError::invalid("search.method", reason))?,
        None => SearchMethod::Get,
    };

    let timeout = seconds(search.timeout_seconds, "search.timeout_seconds")?;

    let term_field = search
        .term_field
        .map(|field| field.trim().to_string())
        .unwrap_or_else(|| DEFAULT_TERM_FIELD.to_string());
    if term_field.is_empty() {
        return Err(LoadError::invalid(
            "search.term_field",
            "field name must not be empty",
        ));
    }

    let fields = search
        .fields
        .filter(|fields| !fields.is_empty())
        .unwrap_or_else(|| vec![FormField::search(term_field.clone(), "")]);
    if fields.iter().any(|field| field.name.trim().is_empty()) {
        return Err(LoadError::invalid(
            "search.fields",
            "field names must not be empty",
        ));
    }

    Ok(SearchSettings {
        endpoint,
        method,
        timeout,
        term_field,
        fields,
    })
}

fn build_revoke_settings(revoke: RawRevokeSettings) -> Result<RevokeSettings, LoadError> {
    Ok(RevokeSettings {
        timeout: seconds(revoke.timeout_seconds, "revoke.timeout_seconds")?,
    })
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

fn seconds(value: Option<u64>, key: &'static str) -> Result<Duration, LoadError> {
    let value = NonZeroU64::new(value.unwrap_or(DEFAULT_TIMEOUT_SECS))
        .ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))?;
    Ok(Duration::from_secs(value.get()))
}

#[cfg(test)]
mod tests;
