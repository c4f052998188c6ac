//! Configuration sources and host-level telemetry settings.
//!
//! - [`section`]: Hierarchical key/value tree exporter options are bound from
//! - [`telemetry`]: Service identity, log output and exporter layout

pub mod section;
pub mod telemetry;

pub use section::{ConfigSection, ENV_KEY_DELIMITER, KEY_DELIMITER};
pub use telemetry::{ExporterLayout, LogFormat, TelemetryConfig, TelemetryConfigBuilder};
