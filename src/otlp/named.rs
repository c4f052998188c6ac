use tracing::debug;

use crate::config::ConfigSection;
use crate::error::TelemetryError;
use crate::otlp::binder::bind;
use crate::otlp::options::OtlpExporterOptions;
use crate::otlp::registrar::{register_otlp_exporter, TelemetryPipelines};

/// Register one exporter per child of `section_name` under `config`.
///
/// Each child's key is the exporter name and its subtree is bound into fresh
/// options, so children never see each other's settings. `configure` runs
/// after binding and before registration. Children are processed in the
/// order the configuration source yields them.
pub fn register_named_otlp_exporters<P, F>(
    pipelines: &mut P,
    config: &ConfigSection,
    section_name: Option<&str>,
    configure: F,
) -> Result<(), TelemetryError>
where
    P: TelemetryPipelines + ?Sized,
    F: Fn(&str, &mut OtlpExporterOptions),
{
    let section = config.section_or_root(section_name);

    for child in section.children() {
        let name = child.key();
        debug!(exporter = name, "Binding named OTLP exporter");

        let mut options = OtlpExporterOptions::default();
        bind(&mut options, child)?;
        configure(name, &mut options);

        register_otlp_exporter(pipelines, Some(name), &options)?;
    }

    Ok(())
}
