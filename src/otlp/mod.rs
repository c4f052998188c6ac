//! OTLP exporter configuration.
//!
//! Turns declarative exporter settings into exporters attached to the trace,
//! metric and log pipelines.
//!
//! # Configuration
//!
//! ```json
//! {
//!   "OpenTelemetry": {
//!     "Exporters": {
//!       "OTLP": {
//!         "Enabled": true,
//!         "Protocol": "HttpProtobuf",
//!         "Endpoint": "http://localhost:4318",
//!         "Signals": "TracesAndLogs",
//!         "Headers": { "X-Api-Key": "abc" },
//!         "Timeout": "00:00:10",
//!         "AppendSignalPathToEndpoint": true
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! With [`register_named_otlp_exporters`] every child of the section is an
//! exporter of its own, named after its key.
//!
//! # Module Structure
//!
//! - [`signal`]: Signal selection flags
//! - [`options`]: Exporter options
//! - [`binder`]: Binding options from configuration
//! - [`endpoint`]: Per-signal endpoint resolution
//! - [`registrar`]: Pipeline traits and exporter registration
//! - [`named`]: Named exporter fan-out

pub mod binder;
pub mod endpoint;
pub mod named;
pub mod options;
pub mod registrar;
pub mod signal;

use crate::config::ConfigSection;
use crate::error::TelemetryError;

pub use binder::{bind, bind_from_section, DEFAULT_OTLP_EXPORTER_SECTION};
pub use endpoint::{resolve_endpoint, signal_path};
pub use named::register_named_otlp_exporters;
pub use options::{OtlpExporterOptions, OtlpProtocol, DEFAULT_TIMEOUT};
pub use registrar::{
    add_log_exporter, add_metric_exporter, add_trace_exporter, register_otlp_exporter,
    register_otlp_exporter_from_config, register_otlp_exporter_with, LogPipeline, MetricPipeline,
    OtlpExporterSettings, TelemetryPipelines, TracePipeline,
};
pub use signal::SignalKind;

/// Exporter registration as methods on any set of pipelines.
pub trait OtlpExporterExt: TelemetryPipelines {
    fn add_otlp_exporter(
        &mut self,
        name: Option<&str>,
        options: &OtlpExporterOptions,
    ) -> Result<&mut Self, TelemetryError> {
        register_otlp_exporter(self, name, options)?;
        Ok(self)
    }

    fn configure_otlp_exporter<F>(
        &mut self,
        name: Option<&str>,
        configure: F,
    ) -> Result<&mut Self, TelemetryError>
    where
        F: FnOnce(&mut OtlpExporterOptions),
    {
        register_otlp_exporter_with(self, name, configure)?;
        Ok(self)
    }

    /// Bind from `section_name` (defaults to [`DEFAULT_OTLP_EXPORTER_SECTION`]
    /// when `None`; `Some("")` means the root of `config`).
    fn add_otlp_exporter_from_config(
        &mut self,
        name: Option<&str>,
        config: &ConfigSection,
        section_name: Option<&str>,
    ) -> Result<&mut Self, TelemetryError> {
        let section = section_name.unwrap_or(DEFAULT_OTLP_EXPORTER_SECTION);
        register_otlp_exporter_from_config(self, name, config, Some(section), |_| {})?;
        Ok(self)
    }

    fn add_named_otlp_exporters(
        &mut self,
        config: &ConfigSection,
        section_name: Option<&str>,
    ) -> Result<&mut Self, TelemetryError> {
        let section = section_name.unwrap_or(DEFAULT_OTLP_EXPORTER_SECTION);
        register_named_otlp_exporters(self, config, Some(section), |_, _| {})?;
        Ok(self)
    }
}

impl<P: TelemetryPipelines + ?Sized> OtlpExporterExt for P {}
