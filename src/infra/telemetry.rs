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
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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

pub(crate) fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "stipple_build_documents_total",
            Unit::Count,
            "Documents written by the build, labelled by kind."
        );
        describe_counter!(
            "stipple_build_failures_total",
            Unit::Count,
            "Documents or assets skipped because a build stage failed."
        );
        describe_histogram!(
            "stipple_build_ms",
            Unit::Milliseconds,
            "Wall time of a full or partial build in milliseconds."
        );
        describe_counter!(
            "stipple_http_requests_total",
            Unit::Count,
            "Requests answered by the dev server, labelled by status."
        );
        describe_histogram!(
            "stipple_http_request_ms",
            Unit::Milliseconds,
            "Dev server response latency in milliseconds."
        );
        describe_counter!(
            "stipple_scene_frames_total",
            Unit::Count,
            "Frames produced by the scene renderer."
        );
    });
}
