use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
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
/// Log lines go to stderr so rendered pages on stdout stay clean.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
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

/// Register descriptions for every metric the crate emits. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "weaver_cache_hit_total",
            Unit::Count,
            "Total number of page cache lookups served from a fresh entry."
        );
        describe_counter!(
            "weaver_cache_miss_total",
            Unit::Count,
            "Total number of page cache lookups that found no entry."
        );
        describe_counter!(
            "weaver_cache_stale_total",
            Unit::Count,
            "Total number of page cache lookups that found an expired entry."
        );
        describe_counter!(
            "weaver_request_failed_total",
            Unit::Count,
            "Total number of requests that ended in the failed state."
        );
        describe_counter!(
            "weaver_inflight_joined_total",
            Unit::Count,
            "Total number of requests that joined in-flight work for the same topic."
        );
        describe_histogram!(
            "weaver_render_ms",
            Unit::Milliseconds,
            "Page rendering latency in milliseconds."
        );
    });
}
