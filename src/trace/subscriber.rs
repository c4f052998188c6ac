use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogFormat, TelemetryConfig};
use crate::error::TelemetryError;
use crate::pipeline::TelemetryProviders;

/// Crates whose own events must not be fed back into the OTLP log pipeline.
const LOG_BRIDGE_EXCLUSIONS: &str = "hyper=off,h2=off,tonic=off,tower=off,reqwest=off,opentelemetry=off";

/// Build the OpenTelemetry tracing layer
pub fn build_otel_layer<S>(
    provider: &SdkTracerProvider,
    tracer_name: &str,
) -> OpenTelemetryLayer<S, SdkTracer>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let tracer = provider.tracer(tracer_name.to_string());
    tracing_opentelemetry::layer().with_tracer(tracer)
}

/// Build the layer that forwards `tracing` events to the OTLP log pipeline
pub fn build_log_bridge_layer<S>(provider: &SdkLoggerProvider, config: &TelemetryConfig) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let filter = EnvFilter::new(format!("{},{}", config.log_level, LOG_BRIDGE_EXCLUSIONS));
    OpenTelemetryTracingBridge::new(provider).with_filter(filter)
}

/// Build the JSON fmt layer for structured logging.
/// With `include_scopes` each event carries its current span and span list.
pub fn build_json_layer<S>(include_scopes: bool) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(include_scopes)
        .with_span_list(include_scopes)
        .with_ansi(false)
}

/// Build the pretty fmt layer for human-readable output (local dev)
pub fn build_pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
}

/// Build the env filter from config
pub fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the providers globally and initialize the `tracing` subscriber
pub fn init_subscriber(
    providers: &TelemetryProviders,
    config: &TelemetryConfig,
    tracer_name: &str,
) -> Result<(), TelemetryError> {
    let otel_layer = build_otel_layer(providers.tracer_provider(), tracer_name);
    let log_layer = build_log_bridge_layer(providers.logger_provider(), config);
    let filter = build_filter(config);

    let result = match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(otel_layer)
            .with(log_layer)
            .with(build_pretty_layer())
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(otel_layer)
            .with(log_layer)
            .with(build_json_layer(providers.logs_include_scopes()))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    // Globals are only replaced once the subscriber is in place.
    opentelemetry::global::set_tracer_provider(providers.tracer_provider().clone());
    opentelemetry::global::set_meter_provider(providers.meter_provider().clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EnvGuard;

    #[test]
    fn build_filter_uses_config_log_level() {
        let _guard = EnvGuard::new(&[]);
        let config = TelemetryConfig::new("test", "1.0").with_log_level("debug");

        let filter = build_filter(&config);

        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn build_filter_defaults_to_info() {
        let _guard = EnvGuard::new(&[]);
        let config = TelemetryConfig::new("test", "1.0");

        let filter = build_filter(&config);

        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn build_filter_prefers_rust_log() {
        let _guard = EnvGuard::new(&[("RUST_LOG", "warn")]);
        let config = TelemetryConfig::new("test", "1.0").with_log_level("debug");

        let filter = build_filter(&config);

        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn build_otel_layer_creates_layer() {
        use tracing_subscriber::Registry;

        let provider = SdkTracerProvider::builder().build();

        let _layer = build_otel_layer::<Registry>(&provider, "test-service");
    }

    #[test]
    fn build_log_bridge_layer_creates_layer() {
        use tracing_subscriber::Registry;

        let provider = SdkLoggerProvider::builder().build();
        let config = TelemetryConfig::new("test", "1.0");

        let _layer = build_log_bridge_layer::<Registry>(&provider, &config);
    }
}
