use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use uuid::Uuid;
use opentelemetry_semantic_conventions::resource::{
    SERVICE_INSTANCE_ID, SERVICE_NAME, SERVICE_NAMESPACE, SERVICE_VERSION,
};

use crate::error::TelemetryError;

/// Capture the calling crate's package name and version as a [`DeployableUnit`].
#[macro_export]
macro_rules! deployable_unit {
    () => {
        $crate::resource::DeployableUnit::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    };
}

/// The unit of deployment telemetry is emitted from, as it describes itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployableUnit {
    pub name: Option<String>,
    pub version: Option<String>,
}

impl DeployableUnit {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
        }
    }

    fn declared_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }
}

/// Explicit service identity supplied alongside a deployable unit. Takes
/// precedence over the unit's own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAnnotation {
    name: String,
    namespace: Option<String>,
}

impl ServiceAnnotation {
    pub fn new(name: impl Into<String>) -> Result<Self, TelemetryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TelemetryError::InvalidArgument(
                "The service name cannot be empty or whitespace".to_string(),
            ));
        }

        Ok(Self {
            name,
            namespace: None,
        })
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

/// Everything needed to describe the emitting service as a [`Resource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    unit: DeployableUnit,
    annotation: Option<ServiceAnnotation>,
    instance_id: String,
}

impl ServiceIdentity {
    /// Starts with a random v4 instance id.
    pub fn new(unit: DeployableUnit) -> Self {
        Self {
            unit,
            annotation: None,
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_annotation(mut self, annotation: ServiceAnnotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    /// Blank instance ids are ignored.
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        if !instance_id.trim().is_empty() {
            self.instance_id = instance_id;
        }
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn unit(&self) -> &DeployableUnit {
        &self.unit
    }

    pub fn annotation(&self) -> Option<&ServiceAnnotation> {
        self.annotation.as_ref()
    }

    /// Annotation name, then the unit's declared name. Fails when neither is
    /// available.
    pub fn service_name(&self) -> Result<&str, TelemetryError> {
        self.annotation
            .as_ref()
            .map(ServiceAnnotation::name)
            .or_else(|| self.unit.declared_name())
            .ok_or(TelemetryError::UnresolvedServiceName)
    }

    /// Service attributes for this identity
    pub fn attributes(&self) -> Result<Vec<KeyValue>, TelemetryError> {
        let mut attrs = vec![KeyValue::new(SERVICE_NAME, self.service_name()?.to_string())];

        if let Some(namespace) = self.annotation.as_ref().and_then(ServiceAnnotation::namespace) {
            attrs.push(KeyValue::new(SERVICE_NAMESPACE, namespace.to_string()));
        }

        if let Some(version) = &self.unit.version {
            attrs.push(KeyValue::new(SERVICE_VERSION, version.clone()));
        }

        attrs.push(KeyValue::new(SERVICE_INSTANCE_ID, self.instance_id.clone()));

        Ok(attrs)
    }

    /// Build the default resource with the service attributes layered on top
    pub fn resolve(&self) -> Result<Resource, TelemetryError> {
        self.resolve_with(Vec::new())
    }

    /// Build resource with service + additional attributes
    pub fn resolve_with(&self, additional: Vec<KeyValue>) -> Result<Resource, TelemetryError> {
        let mut attrs = self.attributes()?;
        attrs.extend(additional);
        Ok(Resource::builder().with_attributes(attrs).build())
    }
}
