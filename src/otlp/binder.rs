use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::config::ConfigSection;
use crate::error::TelemetryError;
use crate::otlp::options::OtlpExporterOptions;

/// Default configuration section for OTLP exporter options.
pub const DEFAULT_OTLP_EXPORTER_SECTION: &str = "OpenTelemetry:Exporters:OTLP";

const ENABLED: &str = "Enabled";
const PROTOCOL: &str = "Protocol";
const ENDPOINT: &str = "Endpoint";
const SIGNALS: &str = "Signals";
const HEADERS: &str = "Headers";
const TIMEOUT: &str = "Timeout";
const APPEND_SIGNAL_PATH: &str = "AppendSignalPathToEndpoint";

/// Bind the values found in `section` onto `options`.
///
/// Keys that are absent (or blank) leave the current value in place. A
/// non-empty `Headers` child section replaces any headers already set.
pub fn bind(options: &mut OtlpExporterOptions, section: &ConfigSection) -> Result<(), TelemetryError> {
    if let Some(value) = scalar(section, ENABLED) {
        options.enabled = parse_bool(ENABLED, value)?;
    }

    if let Some(value) = scalar(section, PROTOCOL) {
        options.protocol = value.parse()?;
    }

    if let Some(value) = scalar(section, ENDPOINT) {
        match Url::parse(value.trim()) {
            Ok(url) => options.endpoint = Some(url),
            Err(e) => debug!(
                endpoint = value,
                error = %e,
                "Ignoring OTLP endpoint that is not an absolute URL"
            ),
        }
    }

    if let Some(value) = scalar(section, SIGNALS) {
        options.signals = value.parse()?;
    }

    if let Some(value) = scalar(section, TIMEOUT) {
        options.timeout = parse_timeout(value)?;
    }

    if let Some(value) = scalar(section, APPEND_SIGNAL_PATH) {
        options.append_signal_path_to_endpoint = parse_bool(APPEND_SIGNAL_PATH, value)?;
    }

    let headers: Vec<(String, String)> = section
        .section(HEADERS)
        .children()
        .map(|header| {
            (
                header.key().to_string(),
                header.value().unwrap_or_default().to_string(),
            )
        })
        .collect();

    if !headers.is_empty() {
        options.headers = Some(headers);
    }

    Ok(())
}

/// Bind from the section called `section_name` under `config`.
///
/// `None` or a blank name binds from `config` itself.
pub fn bind_from_section(
    options: &mut OtlpExporterOptions,
    config: &ConfigSection,
    section_name: Option<&str>,
) -> Result<(), TelemetryError> {
    bind(options, config.section_or_root(section_name))
}

impl OtlpExporterOptions {
    /// Default options with `section` bound over them.
    pub fn from_config(section: &ConfigSection) -> Result<Self, TelemetryError> {
        let mut options = Self::default();
        bind(&mut options, section)?;
        Ok(options)
    }
}

fn scalar<'a>(section: &'a ConfigSection, key: &str) -> Option<&'a str> {
    section.get(key).filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, TelemetryError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(TelemetryError::invalid_value(key, value, "expected 'true' or 'false'"))
    }
}

/// Parse a timeout given either as a clock value (`00:00:30`, `1.00:00:00`,
/// `00:00:02.5`) or as a humantime string (`30s`, `1500ms`).
///
/// Negative clock values yield zero.
pub(crate) fn parse_timeout(value: &str) -> Result<Duration, TelemetryError> {
    let trimmed = value.trim();
    if trimmed.contains(':') {
        parse_clock(trimmed)
            .ok_or_else(|| TelemetryError::invalid_value(TIMEOUT, value, "expected [d.]hh:mm:ss[.fff]"))
    } else {
        humantime::parse_duration(trimmed)
            .map_err(|e| TelemetryError::invalid_value(TIMEOUT, value, e))
    }
}

fn parse_clock(value: &str) -> Option<Duration> {
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let mut parts = body.split(':');
    let (head, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match head.split_once('.') {
        Some((days, hours)) => (
            days.parse::<u64>().ok()?,
            hours.parse::<u64>().ok().filter(|h| *h < 24)?,
        ),
        None => (0, head.parse::<u64>().ok()?),
    };
    let minutes = minutes.parse::<u64>().ok().filter(|m| *m < 60)?;
    let seconds = seconds
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0 && *s < 60.0)?;

    if negative {
        return Some(Duration::ZERO);
    }

    let whole = days
        .checked_mul(86_400)?
        .checked_add(hours.checked_mul(3_600)?)?
        .checked_add(minutes * 60)?;
    Duration::from_secs(whole).checked_add(Duration::from_secs_f64(seconds))
}
