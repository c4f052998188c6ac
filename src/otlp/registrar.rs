use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::config::ConfigSection;
use crate::error::TelemetryError;
use crate::otlp::binder::bind_from_section;
use crate::otlp::endpoint::resolve_endpoint;
use crate::otlp::options::{OtlpExporterOptions, OtlpProtocol};
use crate::otlp::signal::SignalKind;
use crate::trace::DefaultTagsProcessor;

/// Exporter settings in the form the OTLP exporters consume them, resolved
/// for one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtlpExporterSettings {
    pub protocol: OtlpProtocol,
    /// `None` leaves the exporter on its default endpoint.
    pub endpoint: Option<Url>,
    /// Headers joined as `key1=value1,key2=value2`.
    pub headers: Option<String>,
    /// The same headers as ordered pairs. Values may contain `,` or `=`.
    pub header_pairs: Vec<(String, String)>,
    /// `None` leaves the exporter on its default timeout.
    pub timeout_millis: Option<u64>,
}

impl OtlpExporterSettings {
    pub fn from_options(options: &OtlpExporterOptions, signal: SignalKind) -> Self {
        let endpoint = options.endpoint.as_ref().map(|endpoint| {
            resolve_endpoint(
                endpoint,
                options.protocol,
                signal,
                options.append_signal_path_to_endpoint,
            )
        });

        let header_pairs = options.headers.clone().unwrap_or_default();
        let headers = (!header_pairs.is_empty()).then(|| {
            header_pairs
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(",")
        });

        let timeout_millis = (!options.timeout.is_zero())
            .then(|| u64::try_from(options.timeout.as_millis()).unwrap_or(u64::MAX));

        Self {
            protocol: options.protocol,
            endpoint,
            headers,
            header_pairs,
            timeout_millis,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_millis.map(Duration::from_millis)
    }
}

/// Trace pipeline under construction.
pub trait TracePipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError>;

    fn add_default_tags_processor(&mut self, processor: DefaultTagsProcessor);
}

/// Metric pipeline under construction.
pub trait MetricPipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError>;
}

/// Log pipeline under construction.
pub trait LogPipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError>;

    /// Whether log records carry the scopes (enclosing spans) they were
    /// emitted in.
    fn set_include_scopes(&mut self, include: bool);
}

/// The three signal pipelines an exporter can be attached to.
pub trait TelemetryPipelines {
    fn traces(&mut self) -> &mut dyn TracePipeline;
    fn metrics(&mut self) -> &mut dyn MetricPipeline;
    fn logs(&mut self) -> &mut dyn LogPipeline;
}

fn exporter_label(name: Option<&str>) -> &str {
    name.unwrap_or("<default>")
}

fn log_registration(name: Option<&str>, signal: SignalKind, settings: &OtlpExporterSettings) {
    info!(
        exporter = exporter_label(name),
        signal = %signal,
        protocol = %settings.protocol,
        endpoint = settings.endpoint.as_ref().map_or("<default>", Url::as_str),
        timeout_ms = settings.timeout_millis,
        has_headers = settings.headers.is_some(),
        "Registering OTLP exporter"
    );
}

/// Attach one exporter per signal selected in `options`.
///
/// Disabled options attach nothing. Registering a log exporter also turns on
/// scope inclusion for the log pipeline. Exporters attached before a failure
/// stay attached.
pub fn register_otlp_exporter<P>(
    pipelines: &mut P,
    name: Option<&str>,
    options: &OtlpExporterOptions,
) -> Result<(), TelemetryError>
where
    P: TelemetryPipelines + ?Sized,
{
    if !options.enabled {
        debug!(exporter = exporter_label(name), "OTLP exporter is disabled");
        return Ok(());
    }

    for signal in options.signals.iter() {
        let settings = OtlpExporterSettings::from_options(options, signal);
        log_registration(name, signal, &settings);

        match signal {
            SignalKind::TRACES => pipelines.traces().add_otlp_exporter(name, settings)?,
            SignalKind::METRICS => pipelines.metrics().add_otlp_exporter(name, settings)?,
            SignalKind::LOGS => {
                let logs = pipelines.logs();
                logs.set_include_scopes(true);
                logs.add_otlp_exporter(name, settings)?;
            }
            _ => {}
        }
    }

    Ok(())
}

/// Start from default options, let `configure` adjust them, then register.
pub fn register_otlp_exporter_with<P, F>(
    pipelines: &mut P,
    name: Option<&str>,
    configure: F,
) -> Result<(), TelemetryError>
where
    P: TelemetryPipelines + ?Sized,
    F: FnOnce(&mut OtlpExporterOptions),
{
    let mut options = OtlpExporterOptions::default();
    configure(&mut options);
    register_otlp_exporter(pipelines, name, &options)
}

/// Bind options from `section_name` under `config` (the root when `None` or
/// blank), let `configure` adjust them, then register.
pub fn register_otlp_exporter_from_config<P, F>(
    pipelines: &mut P,
    name: Option<&str>,
    config: &ConfigSection,
    section_name: Option<&str>,
    configure: F,
) -> Result<(), TelemetryError>
where
    P: TelemetryPipelines + ?Sized,
    F: FnOnce(&mut OtlpExporterOptions),
{
    let mut options = OtlpExporterOptions::default();
    bind_from_section(&mut options, config, section_name)?;
    configure(&mut options);
    register_otlp_exporter(pipelines, name, &options)
}

/// Attach a trace exporter if `options` is enabled and selects traces.
pub fn add_trace_exporter(
    pipeline: &mut dyn TracePipeline,
    name: Option<&str>,
    options: &OtlpExporterOptions,
) -> Result<(), TelemetryError> {
    if options.enabled && options.signals.contains(SignalKind::TRACES) {
        let settings = OtlpExporterSettings::from_options(options, SignalKind::TRACES);
        log_registration(name, SignalKind::TRACES, &settings);
        pipeline.add_otlp_exporter(name, settings)?;
    }
    Ok(())
}

/// Attach a metric exporter if `options` is enabled and selects metrics.
pub fn add_metric_exporter(
    pipeline: &mut dyn MetricPipeline,
    name: Option<&str>,
    options: &OtlpExporterOptions,
) -> Result<(), TelemetryError> {
    if options.enabled && options.signals.contains(SignalKind::METRICS) {
        let settings = OtlpExporterSettings::from_options(options, SignalKind::METRICS);
        log_registration(name, SignalKind::METRICS, &settings);
        pipeline.add_otlp_exporter(name, settings)?;
    }
    Ok(())
}

/// Attach a log exporter if `options` is enabled and selects logs. Unlike
/// [`register_otlp_exporter`], scope inclusion is left as it is.
pub fn add_log_exporter(
    pipeline: &mut dyn LogPipeline,
    name: Option<&str>,
    options: &OtlpExporterOptions,
) -> Result<(), TelemetryError> {
    if options.enabled && options.signals.contains(SignalKind::LOGS) {
        let settings = OtlpExporterSettings::from_options(options, SignalKind::LOGS);
        log_registration(name, SignalKind::LOGS, &settings);
        pipeline.add_otlp_exporter(name, settings)?;
    }
    Ok(())
}
