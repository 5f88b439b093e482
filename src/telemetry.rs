//! Telemetry wiring.
//!
//! Metric names for the cache, their descriptions, and a tracing subscriber
//! installer for binaries and tests that embed the cache.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use serde::Deserialize;
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    filter::LevelFilter,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

pub(crate) const METRIC_CACHE_HIT_TOTAL: &str = "specchio_query_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS_TOTAL: &str = "specchio_query_cache_miss_total";
pub(crate) const METRIC_FETCH_DEDUP_TOTAL: &str = "specchio_fetch_dedup_total";
pub(crate) const METRIC_FETCH_DISCARDED_TOTAL: &str = "specchio_fetch_discarded_total";
pub(crate) const METRIC_FETCH_MS: &str = "specchio_fetch_ms";
pub(crate) const METRIC_INVALIDATED_TOTAL: &str = "specchio_invalidated_entries_total";
pub(crate) const METRIC_REFETCH_TOTAL: &str = "specchio_refetch_total";
pub(crate) const METRIC_EVICTED_TOTAL: &str = "specchio_entries_evicted_total";
pub(crate) const METRIC_ACTIVE_ENTRIES: &str = "specchio_active_entries";

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        }
    }
}

/// Install a global tracing subscriber using the provided settings.
pub fn init(settings: &LogSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(settings.level.into())
        .from_env_lossy();

    let fmt_layer = match settings.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Subscriber(err.to_string()))
}

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT_TOTAL,
            Unit::Count,
            "Total number of subscribes served from a settled cache entry."
        );
        describe_counter!(
            METRIC_CACHE_MISS_TOTAL,
            Unit::Count,
            "Total number of subscribes that created a new cache entry."
        );
        describe_counter!(
            METRIC_FETCH_DEDUP_TOTAL,
            Unit::Count,
            "Total number of subscribes that joined an in-flight request."
        );
        describe_counter!(
            METRIC_FETCH_DISCARDED_TOTAL,
            Unit::Count,
            "Total number of superseded responses discarded on arrival."
        );
        describe_histogram!(
            METRIC_FETCH_MS,
            Unit::Milliseconds,
            "Request latency in milliseconds, labeled by endpoint kind."
        );
        describe_counter!(
            METRIC_INVALIDATED_TOTAL,
            Unit::Count,
            "Total number of cache entries marked stale by invalidation."
        );
        describe_counter!(
            METRIC_REFETCH_TOTAL,
            Unit::Count,
            "Total number of refetches triggered by invalidation or policy."
        );
        describe_counter!(
            METRIC_EVICTED_TOTAL,
            Unit::Count,
            "Total number of cache entries evicted after the grace period."
        );
        describe_gauge!(
            METRIC_ACTIVE_ENTRIES,
            Unit::Count,
            "Current number of live cache entries."
        );
    });
}
