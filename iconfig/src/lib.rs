use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use toml::Value;
use tracing::{debug, trace};

use scute::{Container, Entry, Provider};

/// Candidate files tried by [`load_default`], later files overriding earlier ones.
pub const DEFAULT_PATHS: [&str; 3] = [
    "/etc/scute/config.toml",
    "config/config.toml",
    "./config.toml",
];

/// Parameters read from TOML, mergeable and loadable into a [`Container`].
///
/// Every leaf becomes a plain value entry under its dotted path.
///
/// # Examples
///
/// ```
/// use iconfig::ParameterConfig;
///
/// let mut base = ParameterConfig::from_str(r#"
///     [server]
///     host = "localhost"
///     port = 8080
/// "#).unwrap();
///
/// let overlay = ParameterConfig::from_str(r#"
///     [server]
///     port = 9090
/// "#).unwrap();
///
/// base.merge(overlay);
///
/// let container = base.into_container();
/// assert_eq!(container.get_as::<String>("server.host").unwrap().as_str(), "localhost");
/// assert_eq!(*container.get_as::<i64>("server.port").unwrap(), 9090);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterConfig {
    #[serde(flatten)]
    value: Value,
}

/// A flattened leaf of a [`ParameterConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Strings and datetimes.
    Text(String),
    /// Arrays, converted to JSON.
    List(serde_json::Value),
}

impl Parameter {
    /// `Text` is stored as `String`, `Integer` as `i64`, `Float` as `f64`,
    /// `List` as `serde_json::Value`.
    pub fn into_entry(self) -> Entry {
        match self {
            Parameter::Boolean(v) => Entry::value(v),
            Parameter::Integer(v) => Entry::value(v),
            Parameter::Float(v) => Entry::value(v),
            Parameter::Text(v) => Entry::value(v),
            Parameter::List(v) => Entry::value(v),
        }
    }
}

impl fmt::Display for ParameterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Default for ParameterConfig {
    fn default() -> Self {
        Self {
            value: Value::Table(toml::Table::new()),
        }
    }
}

impl ParameterConfig {
    /// Create a new ParameterConfig from a TOML string
    pub fn from_str(s: &str) -> Result<Self, anyhow::Error> {
        let value = toml::from_str(s)?;
        Ok(Self { value })
    }

    pub fn from_file<P: AsRef<Path>>(fname: P) -> Result<Self, anyhow::Error> {
        let path = fname.as_ref();
        if !path.exists() {
            return Err(anyhow::anyhow!("File {} does not exist", path.display()));
        }
        let config = std::fs::read_to_string(path)?;
        let value = Self::from_str(&config)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        debug!(path = %path.display(), "loaded parameters");

        Ok(value)
    }

    /// Merge another ParameterConfig into this one
    ///
    /// This performs a deep merge where:
    /// - Tables are merged recursively
    /// - Arrays are concatenated
    /// - Other values are overwritten by the new config
    pub fn merge(&mut self, other: Self) {
        self.value = merge_values(&self.value, &other.value);
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Get a value by dotted path (e.g., "server.port")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.value;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn to_string_pretty(&self) -> String {
        self.value.to_string()
    }

    pub fn jsonify(&self) -> Result<String, anyhow::Error> {
        serde_json::to_string(self).map_err(|e| anyhow::anyhow!("Failed to convert to json: {}", e))
    }

    pub fn resolve<T: DeserializeOwned>(&self) -> Result<T, anyhow::Error> {
        let json = self.jsonify()?;
        serde_json::from_str(&json).map_err(|e| anyhow::anyhow!("Failed to convert to json: {}", e))
    }

    pub fn resolve_prefix<T: DeserializeOwned>(&self, prefix: &str) -> Result<T, anyhow::Error> {
        if prefix.is_empty() {
            return self.resolve::<T>();
        }

        let part = self
            .get(prefix)
            .ok_or_else(|| anyhow::anyhow!("No config found for {}", prefix))?;
        let json = serde_json::to_string(part)
            .map_err(|e| anyhow::anyhow!("Failed to convert to json: {}", e))?;

        serde_json::from_str(&json).map_err(|e| anyhow::anyhow!("Failed to convert to json: {}", e))
    }

    /// Leaves keyed by dotted path, sorted by key.
    pub fn parameters(&self) -> Vec<(String, Parameter)> {
        let mut out = Vec::new();
        flatten("", &self.value, &mut out);
        out
    }

    /// Registers every parameter in `container`, overwriting same-named entries.
    pub fn seed(&self, container: &Container) {
        for (key, parameter) in self.parameters() {
            trace!(key = %key, "seeding parameter");
            container.set(key, parameter.into_entry());
        }
    }

    pub fn into_container(self) -> Container {
        let container = Container::new();
        self.seed(&container);
        container
    }
}

impl Provider for ParameterConfig {
    fn register(&self, container: &Container) {
        self.seed(container)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, Parameter)>) {
    let parameter = match value {
        Value::Table(table) => {
            for (k, v) in table {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten(&key, v, out);
            }
            return;
        }
        Value::String(s) => Parameter::Text(s.clone()),
        Value::Integer(i) => Parameter::Integer(*i),
        Value::Float(f) => Parameter::Float(*f),
        Value::Boolean(b) => Parameter::Boolean(*b),
        Value::Datetime(dt) => Parameter::Text(dt.to_string()),
        Value::Array(_) => Parameter::List(to_json(value)),
    };
    out.push((prefix.to_string(), parameter));
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Table(table) => serde_json::Value::Object(
            table.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
    }
}

fn merge_values(a: &Value, b: &Value) -> Value {
    match (a, b) {
        // If both are tables, merge them recursively
        (Value::Table(a_map), Value::Table(b_map)) => {
            let mut result = a_map.clone();
            for (k, v) in b_map {
                let merged = match result.get(k) {
                    Some(existing) => merge_values(existing, v),
                    None => v.clone(),
                };
                result.insert(k.clone(), merged);
            }
            Value::Table(result)
        }
        // If both are arrays, concatenate them
        (Value::Array(a_vec), Value::Array(b_vec)) => {
            let mut result = a_vec.clone();
            result.extend(b_vec.iter().cloned());
            Value::Array(result)
        }
        // In all other cases, use the value from b
        _ => b.clone(),
    }
}

/// Merges every existing file of `paths` in order. Fails when none exists.
pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<ParameterConfig, anyhow::Error> {
    let mut config: Option<ParameterConfig> = None;
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            trace!(path = %path.display(), "skipping missing parameter file");
            continue;
        }
        let loaded = ParameterConfig::from_file(path)?;
        match config.as_mut() {
            Some(config) => config.merge(loaded),
            None => config = Some(loaded),
        }
    }
    config.ok_or_else(|| anyhow::anyhow!("No config file found"))
}

pub fn load_default() -> Result<ParameterConfig, anyhow::Error> {
    load(&DEFAULT_PATHS)
}
