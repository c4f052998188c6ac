use std::env;
use std::sync::{Mutex, MutexGuard};

use crate::error::TelemetryError;
use crate::otlp::registrar::{
    LogPipeline, MetricPipeline, OtlpExporterSettings, TelemetryPipelines, TracePipeline,
};
use crate::trace::DefaultTagsProcessor;

/// Pipeline that records what was attached to it.
#[derive(Debug, Default)]
pub(crate) struct RecordingPipeline {
    pub exporters: Vec<(Option<String>, OtlpExporterSettings)>,
    pub processors: Vec<DefaultTagsProcessor>,
    pub include_scopes: bool,
    pub fail: bool,
}

impl RecordingPipeline {
    pub fn names(&self) -> Vec<Option<String>> {
        self.exporters.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.exporters
            .iter()
            .filter_map(|(_, settings)| settings.endpoint.as_ref().map(ToString::to_string))
            .collect()
    }

    fn record(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError> {
        if self.fail {
            return Err(TelemetryError::Exporter("rejected by test pipeline".to_string()));
        }
        self.exporters.push((name.map(str::to_string), settings));
        Ok(())
    }
}

impl TracePipeline for RecordingPipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError> {
        self.record(name, settings)
    }

    fn add_default_tags_processor(&mut self, processor: DefaultTagsProcessor) {
        self.processors.push(processor);
    }
}

impl MetricPipeline for RecordingPipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError> {
        self.record(name, settings)
    }
}

impl LogPipeline for RecordingPipeline {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        settings: OtlpExporterSettings,
    ) -> Result<(), TelemetryError> {
        self.record(name, settings)
    }

    fn set_include_scopes(&mut self, include: bool) {
        self.include_scopes = include;
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingPipelines {
    pub traces: RecordingPipeline,
    pub metrics: RecordingPipeline,
    pub logs: RecordingPipeline,
}

impl RecordingPipelines {
    pub fn is_empty(&self) -> bool {
        self.traces.exporters.is_empty()
            && self.metrics.exporters.is_empty()
            && self.logs.exporters.is_empty()
    }
}

impl TelemetryPipelines for RecordingPipelines {
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

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Variables read by the crate from the process environment.
const TELEMETRY_VARS: [&str; 6] = [
    "OTEL_SERVICE_NAME",
    "OTEL_SERVICE_NAMESPACE",
    "OTEL_SERVICE_INSTANCE_ID",
    "RUST_LOG",
    "LOG_FORMAT",
    "OTEL_EXPORTER_LAYOUT",
];

/// Serializes environment access between tests. Clears the telemetry
/// variables, sets `vars`, and clears them again on drop.
pub(crate) struct EnvGuard {
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    pub fn new(vars: &[(&str, &str)]) -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for var in TELEMETRY_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
        Self { _lock: lock }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for var in TELEMETRY_VARS {
            env::remove_var(var);
        }
    }
}
