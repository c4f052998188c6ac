use std::collections::HashMap;

use opentelemetry_otlp::{
    LogExporter, MetricExporter, Protocol, SpanExporter, WithExportConfig, WithHttpConfig,
    WithTonicConfig,
};
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap};

use crate::error::TelemetryError;
use crate::otlp::{OtlpExporterSettings, OtlpProtocol};

fn with_export_config<B: WithExportConfig>(mut builder: B, settings: &OtlpExporterSettings) -> B {
    if let Some(endpoint) = &settings.endpoint {
        builder = builder.with_endpoint(endpoint.as_str());
    }
    if let Some(timeout) = settings.timeout() {
        builder = builder.with_timeout(timeout);
    }
    builder
}

fn with_http_config<B>(builder: B, settings: &OtlpExporterSettings) -> B
where
    B: WithExportConfig + WithHttpConfig,
{
    let builder = with_export_config(builder, settings).with_protocol(Protocol::HttpBinary);

    let headers: HashMap<String, String> = settings.header_pairs.iter().cloned().collect();
    if headers.is_empty() {
        builder
    } else {
        builder.with_headers(headers)
    }
}

fn with_tonic_config<B>(builder: B, settings: &OtlpExporterSettings) -> Result<B, TelemetryError>
where
    B: WithExportConfig + WithTonicConfig,
{
    let builder = with_export_config(builder, settings).with_protocol(Protocol::Grpc);

    if settings.header_pairs.is_empty() {
        return Ok(builder);
    }
    Ok(builder.with_metadata(metadata_from_pairs(&settings.header_pairs)?))
}

/// gRPC metadata from header pairs. Keys are lower-cased.
pub fn metadata_from_pairs(pairs: &[(String, String)]) -> Result<MetadataMap, TelemetryError> {
    let mut metadata = MetadataMap::new();
    for (key, value) in pairs {
        let name = AsciiMetadataKey::from_bytes(key.to_ascii_lowercase().as_bytes())
            .map_err(|e| TelemetryError::Exporter(format!("invalid gRPC header {key:?}: {e}")))?;
        let value = AsciiMetadataValue::try_from(value.as_str()).map_err(|e| {
            TelemetryError::Exporter(format!("invalid value for gRPC header {key:?}: {e}"))
        })?;
        metadata.insert(name, value);
    }
    Ok(metadata)
}

/// Build an OTLP span exporter. gRPC exporters must be built inside a Tokio runtime.
pub fn build_span_exporter(settings: &OtlpExporterSettings) -> Result<SpanExporter, TelemetryError> {
    let exporter = match settings.protocol {
        OtlpProtocol::HttpProtobuf => {
            with_http_config(SpanExporter::builder().with_http(), settings).build()?
        }
        OtlpProtocol::Grpc => {
            with_tonic_config(SpanExporter::builder().with_tonic(), settings)?.build()?
        }
    };
    Ok(exporter)
}

pub fn build_metric_exporter(
    settings: &OtlpExporterSettings,
) -> Result<MetricExporter, TelemetryError> {
    let exporter = match settings.protocol {
        OtlpProtocol::HttpProtobuf => {
            with_http_config(MetricExporter::builder().with_http(), settings).build()?
        }
        OtlpProtocol::Grpc => {
            with_tonic_config(MetricExporter::builder().with_tonic(), settings)?.build()?
        }
    };
    Ok(exporter)
}

pub fn build_log_exporter(settings: &OtlpExporterSettings) -> Result<LogExporter, TelemetryError> {
    let exporter = match settings.protocol {
        OtlpProtocol::HttpProtobuf => {
            with_http_config(LogExporter::builder().with_http(), settings).build()?
        }
        OtlpProtocol::Grpc => {
            with_tonic_config(LogExporter::builder().with_tonic(), settings)?.build()?
        }
    };
    Ok(exporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otlp::{OtlpExporterOptions, SignalKind};

    fn settings(protocol: OtlpProtocol) -> OtlpExporterSettings {
        let options = OtlpExporterOptions::new()
            .with_enabled(true)
            .with_protocol(protocol)
            .with_endpoint("http://localhost:4318")
            .with_header("X-Api-Key", "abc");
        OtlpExporterSettings::from_options(&options, SignalKind::TRACES)
    }

    #[test]
    fn http_exporters_build() {
        let settings = settings(OtlpProtocol::HttpProtobuf);

        assert!(build_span_exporter(&settings).is_ok());
        assert!(build_metric_exporter(&settings).is_ok());
        assert!(build_log_exporter(&settings).is_ok());
    }

    #[test]
    fn http_exporter_builds_without_endpoint() {
        let options = OtlpExporterOptions::new().with_enabled(true);
        let settings = OtlpExporterSettings::from_options(&options, SignalKind::TRACES);

        assert!(build_span_exporter(&settings).is_ok());
    }

    #[tokio::test]
    async fn grpc_exporters_build() {
        let settings = settings(OtlpProtocol::Grpc);

        assert!(build_span_exporter(&settings).is_ok());
        assert!(build_metric_exporter(&settings).is_ok());
        assert!(build_log_exporter(&settings).is_ok());
    }

    #[test]
    fn metadata_lowercases_keys() {
        let metadata =
            metadata_from_pairs(&[("X-Api-Key".to_string(), "abc".to_string())]).unwrap();

        assert_eq!(metadata.get("x-api-key").and_then(|v| v.to_str().ok()), Some("abc"));
    }

    #[test]
    fn metadata_keeps_commas_in_values() {
        let options = OtlpExporterOptions::new()
            .with_enabled(true)
            .with_header("Authorization", "Basic a,b")
            .with_header("X-Env", "prod");
        let settings = OtlpExporterSettings::from_options(&options, SignalKind::TRACES);

        let metadata = metadata_from_pairs(&settings.header_pairs).unwrap();

        assert_eq!(
            metadata.get("authorization").and_then(|v| v.to_str().ok()),
            Some("Basic a,b")
        );
        assert_eq!(metadata.get("x-env").and_then(|v| v.to_str().ok()), Some("prod"));
    }

    #[test]
    fn metadata_rejects_invalid_key() {
        let result = metadata_from_pairs(&[("bad key".to_string(), "abc".to_string())]);

        assert!(matches!(result, Err(TelemetryError::Exporter(_))));
    }
}
