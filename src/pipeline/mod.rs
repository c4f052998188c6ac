//! SDK-backed signal pipelines.
//!
//! [`TelemetryPipelineBuilder`] collects OTLP exporters and span processors
//! for the three signals, then [`TelemetryPipelineBuilder::build`] turns them
//! into SDK providers sharing one [`Resource`].

pub mod exporter;

use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing::debug;
use url::Url;

use crate::error::TelemetryError;
use crate::otlp::{
    LogPipeline, MetricPipeline, OtlpExporterSettings, OtlpProtocol, SignalKind,
    TelemetryPipelines, TracePipeline,
};
use crate::trace::DefaultTagsProcessor;

pub use exporter::{build_log_exporter, build_metric_exporter, build_span_exporter};

/// Record of one exporter attached to a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterRegistration {
    pub signal: SignalKind,
    pub name: Option<String>,
    pub protocol: OtlpProtocol,
    pub endpoint: Option<Url>,
}

impl ExporterRegistration {
    fn new(signal: SignalKind, name: Option<&str>, settings: &OtlpExporterSettings) -> Self {
        Self {
            signal,
            name: name.map(str::to_string),
            protocol: settings.protocol,
            endpoint: settings.endpoint.clone(),
        }
    }
}

#[derive(Default)]
pub struct TracerPipeline {
    exporters: Vec<opentelemetry_otlp::SpanExporter>,
    processors: Vec<DefaultTagsProcessor>,
    registrations: Vec<ExporterRegistration>,
}

impl TracePipeline for TracerPipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError> {
        self.exporters.push(build_span_exporter(&settings)?);
        self.registrations
            .push(ExporterRegistration::new(SignalKind::TRACES, name, &settings));
        Ok(())
    }

    fn add_default_tags_processor(&mut self, processor: DefaultTagsProcessor) {
        self.processors.push(processor);
    }
}

impl TracerPipeline {
    fn build(self, resource: Resource) -> SdkTracerProvider {
        let mut builder = SdkTracerProvider::builder().with_resource(resource);
        // Tag processors go first so exporters see the attributes they add.
        for processor in self.processors {
            builder = builder.with_span_processor(processor);
        }
        for exporter in self.exporters {
            builder = builder.with_batch_exporter(exporter);
        }
        builder.build()
    }
}

#[derive(Default)]
pub struct MeterPipeline {
    exporters: Vec<opentelemetry_otlp::MetricExporter>,
    registrations: Vec<ExporterRegistration>,
}

impl MetricPipeline for MeterPipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError> {
        self.exporters.push(build_metric_exporter(&settings)?);
        self.registrations
            .push(ExporterRegistration::new(SignalKind::METRICS, name, &settings));
        Ok(())
    }
}

impl MeterPipeline {
    fn build(self, resource: Resource) -> SdkMeterProvider {
        let mut builder = SdkMeterProvider::builder().with_resource(resource);
        for exporter in self.exporters {
            builder = builder.with_periodic_exporter(exporter);
        }
        builder.build()
    }
}

#[derive(Default)]
pub struct LoggerPipeline {
    exporters: Vec<opentelemetry_otlp::LogExporter>,
    registrations: Vec<ExporterRegistration>,
    include_scopes: bool,
}

impl LogPipeline for LoggerPipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError> {
        self.exporters.push(build_log_exporter(&settings)?);
        self.registrations
            .push(ExporterRegistration::new(SignalKind::LOGS, name, &settings));
        Ok(())
    }

    fn set_include_scopes(&mut self, include: bool) {
        self.include_scopes = include;
    }
}

impl LoggerPipeline {
    fn build(self, resource: Resource) -> SdkLoggerProvider {
        let mut builder = SdkLoggerProvider::builder().with_resource(resource);
        for exporter in self.exporters {
            builder = builder.with_batch_exporter(exporter);
        }
        builder.build()
    }
}

/// Trace, metric and log pipelines under construction.
#[derive(Default)]
pub struct TelemetryPipelineBuilder {
    traces: TracerPipeline,
    metrics: MeterPipeline,
    logs: LoggerPipeline,
}

impl TelemetryPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exporters attached so far: traces, then metrics, then logs.
    pub fn registrations(&self) -> impl Iterator<Item = &ExporterRegistration> {
        self.traces
            .registrations
            .iter()
            .chain(&self.metrics.registrations)
            .chain(&self.logs.registrations)
    }

    pub fn build(self, resource: Resource) -> TelemetryProviders {
        let registrations: Vec<ExporterRegistration> = self.registrations().cloned().collect();
        let logs_include_scopes = self.logs.include_scopes;

        debug!(
            trace_exporters = self.traces.exporters.len(),
            span_processors = self.traces.processors.len(),
            metric_exporters = self.metrics.exporters.len(),
            log_exporters = self.logs.exporters.len(),
            logs_include_scopes,
            "Building telemetry providers"
        );

        TelemetryProviders {
            tracer_provider: self.traces.build(resource.clone()),
            meter_provider: self.metrics.build(resource.clone()),
            logger_provider: self.logs.build(resource),
            logs_include_scopes,
            registrations,
        }
    }
}

impl TelemetryPipelines for TelemetryPipelineBuilder {
    fn traces(&mut self) -> &mut dyn TracePipeline {
        &mut self.traces
    }

    fn metrics(&mut self) -> &mut dyn MetricPipeline {
        &mut self.metrics
    }

    fn logs(&mut self) -> &mut dyn LogPipeline {
        &mut self.logs
    }
}

/// The SDK providers produced by [`TelemetryPipelineBuilder::build`].
#[derive(Debug, Clone)]
pub struct TelemetryProviders {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
    logs_include_scopes: bool,
    registrations: Vec<ExporterRegistration>,
}

impl TelemetryProviders {
    pub fn tracer_provider(&self) -> &SdkTracerProvider {
        &self.tracer_provider
    }

    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.meter_provider
    }

    pub fn logger_provider(&self) -> &SdkLoggerProvider {
        &self.logger_provider
    }

    /// Whether log output should carry the spans an event was emitted in.
    pub fn logs_include_scopes(&self) -> bool {
        self.logs_include_scopes
    }

    pub fn registrations(&self) -> &[ExporterRegistration] {
        &self.registrations
    }

    /// Flush and shut down all three providers. Every provider is shut down
    /// even if an earlier one fails.
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        let errors: Vec<String> = [
            self.tracer_provider
                .shutdown()
                .map_err(|e| format!("traces: {e}")),
            self.meter_provider
                .shutdown()
                .map_err(|e| format!("metrics: {e}")),
            self.logger_provider
                .shutdown()
                .map_err(|e| format!("logs: {e}")),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TelemetryError::Shutdown(errors.join("; ")))
        }
    }
}
