use url::Url;

use crate::otlp::options::OtlpProtocol;
use crate::otlp::signal::SignalKind;

/// Standard OTLP/HTTP path for a signal, relative to the collector root.
///
/// Anything other than a single signal falls back to the trace path.
pub fn signal_path(signal: SignalKind) -> &'static str {
    match signal {
        SignalKind::TRACES => "v1/traces",
        SignalKind::LOGS => "v1/logs",
        SignalKind::METRICS => "v1/metrics",
        _ => "v1/traces",
    }
}

/// Compute the URL an exporter for `signal` should send to.
///
/// gRPC endpoints, and HTTP endpoints with `append_signal_path` turned off,
/// are returned unchanged. Otherwise the signal path is appended unless the
/// endpoint already ends with it (compared case-insensitively).
pub fn resolve_endpoint(
    endpoint: &Url,
    protocol: OtlpProtocol,
    signal: SignalKind,
    append_signal_path: bool,
) -> Url {
    if protocol != OtlpProtocol::HttpProtobuf || !append_signal_path {
        return endpoint.clone();
    }

    append_path_if_not_present(endpoint, signal_path(signal))
}

fn append_path_if_not_present(endpoint: &Url, path: &str) -> Url {
    let current = endpoint.as_str();

    let candidate = if current.ends_with('/') {
        if ends_with_ignore_case(current, &format!("/{path}/")) {
            return endpoint.clone();
        }
        format!("{current}{path}")
    } else {
        if ends_with_ignore_case(current, &format!("/{path}")) {
            return endpoint.clone();
        }
        format!("{current}/{path}")
    };

    Url::parse(&candidate).unwrap_or_else(|_| endpoint.clone())
}

fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    value.len() >= suffix.len()
        && value
            .get(value.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}
