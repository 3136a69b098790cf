use std::collections::HashMap;

use crate::errors::CoreError;

/// Opaque key -> string lookup consulted by property conditions.
///
/// The engine never enumerates or mutates a property source; it only asks
/// for single values on demand.
pub trait PropertySource: Send + Sync {
    /// Look up a property value by name.
    fn get(&self, name: &str) -> Option<String>;
}

/// In-memory property source backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapProperties {
    values: HashMap<String, String>,
}

impl MapProperties {
    /// Create an empty property source
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a property value, replacing any previous one
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Load properties from a flat JSON object.
    ///
    /// Scalar values (strings, numbers, booleans) are coerced to strings;
    /// nested objects and arrays are rejected.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut values = HashMap::with_capacity(raw.len());
        for (name, value) in raw {
            let rendered = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => continue,
                other => {
                    return Err(CoreError::configuration(format!(
                        "property '{}' is not a scalar value: {}",
                        name, other
                    )))
                }
            };
            values.insert(name, rendered);
        }
        Ok(Self { values })
    }

    /// Get the number of stored properties
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the source holds no properties
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PropertySource for MapProperties {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
