use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::TelemetryError;
use crate::otlp::signal::SignalKind;

/// Default export timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire protocol used by an OTLP exporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OtlpProtocol {
    /// Protobuf over HTTP. Endpoints get a per-signal path appended.
    #[default]
    HttpProtobuf,
    /// Protobuf over gRPC. Endpoints are used as given.
    Grpc,
}

impl OtlpProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpProtobuf => "HttpProtobuf",
            Self::Grpc => "Grpc",
        }
    }
}

impl fmt::Display for OtlpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtlpProtocol {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("HttpProtobuf") {
            Ok(Self::HttpProtobuf)
        } else if trimmed.eq_ignore_ascii_case("Grpc") {
            Ok(Self::Grpc)
        } else {
            Err(TelemetryError::invalid_value(
                "Protocol",
                s,
                "expected 'HttpProtobuf' or 'Grpc'",
            ))
        }
    }
}

/// Settings for a single OTLP exporter.
///
/// Exporters are off until `enabled` is set. An `endpoint` of `None` leaves
/// the destination to the exporter's own default, and a zero `timeout` does
/// the same for the export timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtlpExporterOptions {
    pub enabled: bool,
    pub protocol: OtlpProtocol,
    pub endpoint: Option<Url>,
    pub signals: SignalKind,
    /// Request headers in the order they were configured.
    pub headers: Option<Vec<(String, String)>>,
    pub timeout: Duration,
    /// Append `v1/traces`, `v1/logs` or `v1/metrics` to HTTP endpoints that
    /// do not already end with it.
    pub append_signal_path_to_endpoint: bool,
}

impl Default for OtlpExporterOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            protocol: OtlpProtocol::default(),
            endpoint: None,
            signals: SignalKind::default(),
            headers: None,
            timeout: DEFAULT_TIMEOUT,
            append_signal_path_to_endpoint: true,
        }
    }
}

impl OtlpExporterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_protocol(mut self, protocol: OtlpProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the endpoint. Values that are not absolute URLs are ignored.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        if let Ok(url) = Url::parse(endpoint) {
            self.endpoint = Some(url);
        }
        self
    }

    pub fn with_signals(mut self, signals: SignalKind) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_append_signal_path(mut self, append: bool) -> Self {
        self.append_signal_path_to_endpoint = append;
        self
    }
}
