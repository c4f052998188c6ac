use tracing::{info, warn};

use crate::config::{ConfigSection, ExporterLayout, TelemetryConfig};
use crate::error::TelemetryError;
use crate::otlp::{
    register_named_otlp_exporters, register_otlp_exporter_from_config, TelemetryPipelines,
};
use crate::pipeline::{TelemetryPipelineBuilder, TelemetryProviders};
use crate::trace::{add_default_tags_from_config, init_subscriber};

/// Attach the exporters `config.exporters` describes, bound from `settings`.
pub fn register_exporters<P>(
    pipelines: &mut P,
    config: &TelemetryConfig,
    settings: &ConfigSection,
) -> Result<(), TelemetryError>
where
    P: TelemetryPipelines + ?Sized,
{
    let section = Some(config.exporters.section());
    match &config.exporters {
        ExporterLayout::Single { .. } => {
            register_otlp_exporter_from_config(pipelines, None, settings, section, |_| {})
        }
        ExporterLayout::Named { .. } => {
            register_named_otlp_exporters(pipelines, settings, section, |_, _| {})
        }
    }
}

/// Build the providers without touching any global state
pub fn build_providers(
    config: &TelemetryConfig,
    settings: &ConfigSection,
) -> Result<TelemetryProviders, TelemetryError> {
    let resource = config.service.resolve()?;

    let mut pipelines = TelemetryPipelineBuilder::new();
    register_exporters(&mut pipelines, config, settings)?;

    if let Some(section) = &config.default_tags_section {
        let section = Some(section.as_str());
        add_default_tags_from_config(pipelines.traces(), settings, section, None);
    }

    Ok(pipelines.build(resource))
}

/// Initialize telemetry with config and install the global subscriber.
///
/// gRPC exporters need to be built inside a Tokio runtime.
pub fn init_with_config(
    config: &TelemetryConfig,
    settings: &ConfigSection,
) -> Result<TelemetryProviders, TelemetryError> {
    let service_name = config.service.service_name()?.to_string();
    let providers = build_providers(config, settings)?;

    install(providers, config, &service_name)
}

/// Install the subscriber for `providers`, shutting them down if that fails.
fn install(
    providers: TelemetryProviders,
    config: &TelemetryConfig,
    service_name: &str,
) -> Result<TelemetryProviders, TelemetryError> {
    if let Err(e) = init_subscriber(&providers, config, service_name) {
        if let Err(shutdown) = providers.shutdown() {
            warn!(error = %shutdown, "Failed to shut down providers after init error");
        }
        return Err(e);
    }

    info!(
        service = %service_name,
        exporters = providers.registrations().len(),
        "Telemetry initialized"
    );

    Ok(providers)
}

/// Initialize telemetry from environment
pub fn init() -> Result<TelemetryProviders, TelemetryError> {
    let config = TelemetryConfig::from_env();
    init_with_config(&config, &ConfigSection::from_environment())
}
