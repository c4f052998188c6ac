use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid value {value:?} for configuration key '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exporter error: {0}")]
    Exporter(String),

    #[error(
        "Unable to infer service name: no service annotation was supplied and the deployable unit does not declare a name"
    )]
    UnresolvedServiceName,

    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

impl TelemetryError {
    pub(crate) fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<opentelemetry_otlp::ExporterBuildError> for TelemetryError {
    fn from(err: opentelemetry_otlp::ExporterBuildError) -> Self {
        Self::Exporter(err.to_string())
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
