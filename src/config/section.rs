use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::TelemetryError;

/// Separator between the segments of a configuration path.
pub const KEY_DELIMITER: char = ':';

/// Separator used in environment variable names in place of [`KEY_DELIMITER`].
pub const ENV_KEY_DELIMITER: &str = "__";

static EMPTY_SECTION: ConfigSection = ConfigSection::empty();

/// A node in a hierarchical key/value configuration tree.
///
/// Keys are matched case-insensitively and children keep the order in which
/// the source first produced them. A node may carry a value, children, or
/// both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSection {
    key: String,
    value: Option<String>,
    children: Vec<ConfigSection>,
}

impl ConfigSection {
    pub const fn empty() -> Self {
        Self {
            key: String::new(),
            value: None,
            children: Vec::new(),
        }
    }

    fn named(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::empty()
        }
    }

    /// Build a tree from flat `path = value` pairs such as
    /// `("OpenTelemetry:Exporters:OTLP:Enabled", "true")`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut root = Self::empty();
        for (path, value) in pairs {
            root.set(path.as_ref(), Some(value.as_ref().to_string()));
        }
        root
    }

    /// Build a tree from a JSON document. The root must be an object.
    pub fn from_json_value(value: &Value) -> Result<Self, TelemetryError> {
        if !value.is_object() {
            return Err(TelemetryError::Config(
                "JSON configuration root must be an object".to_string(),
            ));
        }

        let mut root = Self::empty();
        root.load_json(value);
        Ok(root)
    }

    pub fn from_json_str(json: &str) -> Result<Self, TelemetryError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TelemetryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TelemetryError::Config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(
            config_path = %path.display(),
            file_size_bytes = content.len(),
            "Read JSON configuration file"
        );

        Self::from_json_str(&content)
    }

    /// Build a tree from environment-style variables, where `__` separates
    /// path segments (`OpenTelemetry__Exporters__OTLP__Enabled`).
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut root = Self::empty();
        for (name, value) in vars {
            let path = name.as_ref().replace(ENV_KEY_DELIMITER, ":");
            root.set(&path, Some(value.as_ref().to_string()));
        }
        root
    }

    /// Snapshot of the current process environment.
    pub fn from_environment() -> Self {
        Self::from_env_vars(std::env::vars())
    }

    /// Set the value at `path`, creating intermediate sections as needed.
    pub fn set(&mut self, path: &str, value: Option<String>) {
        let mut node = self;
        for segment in path.split(KEY_DELIMITER) {
            node = node.child_mut(segment);
        }
        node.value = value;
    }

    /// Layer `other` over `self`. Values present in `other` win; children
    /// only present in `other` are appended.
    pub fn merge(&mut self, other: &ConfigSection) {
        if other.value.is_some() {
            self.value.clone_from(&other.value);
        }
        for child in &other.children {
            self.child_mut(&child.key).merge(child);
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn children(&self) -> impl Iterator<Item = &ConfigSection> {
        self.children.iter()
    }

    /// Whether this section carries a value or has any children.
    pub fn exists(&self) -> bool {
        self.value.is_some() || !self.children.is_empty()
    }

    pub fn find(&self, path: &str) -> Option<&ConfigSection> {
        path.split(KEY_DELIMITER)
            .try_fold(self, |node, segment| node.child(segment))
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(ConfigSection::value)
    }

    /// The section at `path`, or an empty section if it does not exist.
    pub fn section(&self, path: &str) -> &ConfigSection {
        self.find(path).unwrap_or(&EMPTY_SECTION)
    }

    /// The section named `name`, or `self` when no name (or a blank one) is given.
    pub fn section_or_root(&self, name: Option<&str>) -> &ConfigSection {
        match name {
            Some(name) if !name.trim().is_empty() => self.section(name),
            _ => self,
        }
    }

    fn child(&self, key: &str) -> Option<&ConfigSection> {
        self.children
            .iter()
            .find(|child| child.key.eq_ignore_ascii_case(key))
    }

    fn child_mut(&mut self, key: &str) -> &mut ConfigSection {
        let index = match self
            .children
            .iter()
            .position(|child| child.key.eq_ignore_ascii_case(key))
        {
            Some(index) => index,
            None => {
                self.children.push(Self::named(key));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn load_json(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.child_mut(key).load_json(child);
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    self.child_mut(&index.to_string()).load_json(child);
                }
            }
            Value::Null => self.value = None,
            Value::String(s) => self.value = Some(s.clone()),
            other => self.value = Some(other.to_string()),
        }
    }
}
