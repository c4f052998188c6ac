//! Configuration-driven OTLP exporters for OpenTelemetry.
//!
//! Binds exporter options from hierarchical configuration, resolves a
//! per-signal endpoint and attaches exporters to the trace, metric and log
//! pipelines. Several exporters can be declared side by side under one
//! section, each named after its key.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! // Initialize from environment (`OpenTelemetry__Exporters__OTLP__Enabled=true` etc.)
//! let providers = otlp_exporter_config::init()?;
//! // ...
//! providers.shutdown()?;
//! ```
//!
//! # Configuration
//!
//! ## Using the Builder
//!
//! ```rust,ignore
//! use otlp_exporter_config::{ConfigSection, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("my-service")
//!     .service_version("1.0.0")
//!     .log_level("debug")
//!     .named_exporters("OpenTelemetry:Exporters:OTLP")
//!     .json()
//!     .build();
//!
//! let settings = ConfigSection::from_json_file("appsettings.json")?;
//! let providers = otlp_exporter_config::init_with_config(&config, &settings)?;
//! ```
//!
//! ## Attaching exporters to your own pipelines
//!
//! ```rust,ignore
//! use otlp_exporter_config::otlp::{OtlpExporterExt, SignalKind};
//! use otlp_exporter_config::pipeline::TelemetryPipelineBuilder;
//!
//! let mut pipelines = TelemetryPipelineBuilder::new();
//! pipelines
//!     .add_otlp_exporter_from_config(None, &settings, None)?
//!     .configure_otlp_exporter(Some("local"), |options| {
//!         options.enabled = true;
//!         options.signals = SignalKind::METRICS;
//!     })?;
//! let providers = pipelines.build(resource);
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OTEL_SERVICE_NAME` | Service name annotation | `CARGO_PKG_NAME` |
//! | `OTEL_SERVICE_NAMESPACE` | Service namespace | - |
//! | `OTEL_SERVICE_INSTANCE_ID` | Service instance id | random v4 UUID |
//! | `OTEL_EXPORTER_LAYOUT` | `single` or `named` | `single` |
//! | `RUST_LOG` | Log level filter | `info` |
//! | `LOG_FORMAT` | `pretty` or `json` | `pretty` |
//!
//! Exporter settings themselves come from configuration keys; with
//! [`ConfigSection::from_environment`] a `__` in a variable name separates
//! path segments.
//!
//! # Module Structure
//!
//! - [`api`]: Initialization functions
//! - [`config`]: Configuration sources and host settings
//! - [`error`]: Error types
//! - [`otlp`]: Exporter options, binding, endpoints and registration
//! - [`pipeline`]: SDK-backed pipelines and providers
//! - [`resource`]: Service identity
//! - [`trace`]: Default span tags and subscriber wiring

pub mod api;
pub mod config;
pub mod error;
pub mod otlp;
pub mod pipeline;
pub mod resource;
pub mod trace;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use api::{build_providers, init, init_with_config, register_exporters};
pub use config::{ConfigSection, ExporterLayout, LogFormat, TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use otlp::{OtlpExporterExt, OtlpExporterOptions, OtlpProtocol, SignalKind};
pub use pipeline::{ExporterRegistration, TelemetryPipelineBuilder, TelemetryProviders};
pub use resource::{DeployableUnit, ServiceAnnotation, ServiceIdentity};
pub use trace::{DefaultTagsProcessor, SpanStart};
