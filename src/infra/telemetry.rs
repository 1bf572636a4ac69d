use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so they do not interleave with the console output.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "rights_debugger_search_requests_total",
            Unit::Count,
            "Total number of search requests issued."
        );
        describe_counter!(
            "rights_debugger_search_superseded_total",
            Unit::Count,
            "Search requests cancelled because a newer search replaced them."
        );
        describe_counter!(
            "rights_debugger_search_failures_total",
            Unit::Count,
            "Search requests that ended in a timeout, transport or server error."
        );
        describe_counter!(
            "rights_debugger_revoke_requests_total",
            Unit::Count,
            "Total number of revoke requests issued."
        );
        describe_counter!(
            "rights_debugger_revoke_failures_total",
            Unit::Count,
            "Revoke requests that failed or were rejected."
        );
    });
}
