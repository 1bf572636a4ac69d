use std::path::PathBuf;

use clap::{Args, Parser, builder::BoolishValueParser};

/// Command-line arguments for the rights debugger console.
#[derive(Debug, Parser)]
#[command(
    name = "rights-debugger",
    version,
    about = "Live search console for the rights debugger"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "RIGHTS_DEBUGGER_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConsoleOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ConsoleOverrides {
    /// Override the search endpoint URL (the form's action).
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the search request method (get|post).
    #[arg(long = "method", value_name = "METHOD")]
    pub method: Option<String>,

    /// Override the search request timeout.
    #[arg(long = "search-timeout-seconds", value_name = "SECONDS")]
    pub search_timeout_seconds: Option<u64>,

    /// Override the revoke request timeout.
    #[arg(long = "revoke-timeout-seconds", value_name = "SECONDS")]
    pub revoke_timeout_seconds: Option<u64>,

    /// Override the field whose value is highlighted in results.
    #[arg(long = "term-field", value_name = "NAME")]
    pub term_field: Option<String>,

    /// Search input as NAME=VALUE; repeatable. Replaces configured fields.
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field_pair)]
    pub fields: Vec<(String, String)>,

    /// Non-search input as NAME=VALUE; repeatable. Sent with every search.
    #[arg(long = "fixed-field", value_name = "NAME=VALUE", value_parser = parse_field_pair)]
    pub fixed_fields: Vec<(String, String)>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

pub(crate) fn parse_field_pair(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("field name must not be empty in `{raw}`"));
    }
    Ok((name.to_string(), value.to_string()))
}
