use std::env;

use crate::otlp::DEFAULT_OTLP_EXPORTER_SECTION;
use crate::resource::{DeployableUnit, ServiceAnnotation, ServiceIdentity};
use crate::trace::DEFAULT_TAGS_SECTION;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty human-readable format with colors (for local dev)
    #[default]
    Pretty,
    /// JSON structured format (for log collectors)
    Json,
}

/// How exporter settings are laid out in configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExporterLayout {
    /// One exporter bound from `section`.
    Single { section: String },
    /// Every child of `section` is an exporter named after its key.
    Named { section: String },
}

impl Default for ExporterLayout {
    fn default() -> Self {
        Self::Single {
            section: DEFAULT_OTLP_EXPORTER_SECTION.to_string(),
        }
    }
}

impl ExporterLayout {
    pub fn section(&self) -> &str {
        match self {
            Self::Single { section } | Self::Named { section } => section,
        }
    }
}

/// Main telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service: ServiceIdentity,
    pub log_level: String,
    pub log_format: LogFormat,
    pub exporters: ExporterLayout,
    /// `None` attaches no default tags processor.
    pub default_tags_section: Option<String>,
}

impl TelemetryConfig {
    /// Create config from environment variables, describing this crate's own
    /// package unless `OTEL_SERVICE_NAME` overrides it.
    pub fn from_env() -> Self {
        Self::from_env_for(crate::deployable_unit!())
    }

    /// Create config from environment variables for the given unit
    /// - `OTEL_SERVICE_NAME` / `OTEL_SERVICE_NAMESPACE` annotate the unit
    /// - `OTEL_SERVICE_INSTANCE_ID` sets the instance id
    /// - `OTEL_EXPORTER_LAYOUT=named` switches to named exporters
    pub fn from_env_for(unit: DeployableUnit) -> Self {
        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Pretty,
        };

        let exporters = match env::var("OTEL_EXPORTER_LAYOUT").as_deref() {
            Ok(layout) if layout.eq_ignore_ascii_case("named") => ExporterLayout::Named {
                section: DEFAULT_OTLP_EXPORTER_SECTION.to_string(),
            },
            _ => ExporterLayout::default(),
        };

        let mut service = ServiceIdentity::new(unit);
        if let Some(annotation) = env::var("OTEL_SERVICE_NAME")
            .ok()
            .and_then(|name| ServiceAnnotation::new(name).ok())
        {
            let annotation = match env::var("OTEL_SERVICE_NAMESPACE") {
                Ok(namespace) if !namespace.trim().is_empty() => annotation.with_namespace(namespace),
                _ => annotation,
            };
            service = service.with_annotation(annotation);
        }
        if let Ok(instance_id) = env::var("OTEL_SERVICE_INSTANCE_ID") {
            service = service.with_instance_id(instance_id);
        }

        Self {
            service,
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format,
            exporters,
            default_tags_section: Some(DEFAULT_TAGS_SECTION.to_string()),
        }
    }

    /// Create a new config with explicit values
    pub fn new(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self {
            service: ServiceIdentity::new(DeployableUnit::new(service_name, service_version)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            exporters: ExporterLayout::default(),
            default_tags_section: Some(DEFAULT_TAGS_SECTION.to_string()),
        }
    }

    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_service(mut self, service: ServiceIdentity) -> Self {
        self.service = service;
        self
    }

    pub fn with_exporters(mut self, layout: ExporterLayout) -> Self {
        self.exporters = layout;
        self
    }

    pub fn with_default_tags_section(mut self, section: Option<String>) -> Self {
        self.default_tags_section = section;
        self
    }
}

#[derive(Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    service_version: Option<String>,
    service_namespace: Option<String>,
    instance_id: Option<String>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
    exporters: Option<ExporterLayout>,
    default_tags_section: Option<Option<String>>,
}

impl TelemetryConfigBuilder {
    /// Package name of the deployable unit
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    /// Only applied when the service name is set
    pub fn service_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.service_namespace = Some(namespace.into());
        self
    }

    pub fn instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    pub fn json(self) -> Self {
        self.log_format(LogFormat::Json)
    }

    pub fn pretty(self) -> Self {
        self.log_format(LogFormat::Pretty)
    }

    pub fn exporters(mut self, layout: ExporterLayout) -> Self {
        self.exporters = Some(layout);
        self
    }

    pub fn named_exporters(self, section: impl Into<String>) -> Self {
        self.exporters(ExporterLayout::Named {
            section: section.into(),
        })
    }

    pub fn default_tags_section(mut self, section: impl Into<String>) -> Self {
        self.default_tags_section = Some(Some(section.into()));
        self
    }

    pub fn without_default_tags(mut self) -> Self {
        self.default_tags_section = Some(None);
        self
    }

    pub fn build(self) -> TelemetryConfig {
        let unit = DeployableUnit {
            name: self.service_name,
            version: self.service_version,
        };

        let mut service = ServiceIdentity::new(unit.clone());
        if let (Some(name), Some(namespace)) = (unit.name, self.service_namespace) {
            if let Ok(annotation) = ServiceAnnotation::new(name) {
                service = service.with_annotation(annotation.with_namespace(namespace));
            }
        }
        if let Some(instance_id) = self.instance_id {
            service = service.with_instance_id(instance_id);
        }

        TelemetryConfig {
            service,
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            log_format: self.log_format.unwrap_or_default(),
            exporters: self.exporters.unwrap_or_default(),
            default_tags_section: self
                .default_tags_section
                .unwrap_or_else(|| Some(DEFAULT_TAGS_SECTION.to_string())),
        }
    }
}
