//! Named parameters and conversion of their JSON values to types sqlx can bind.

use crate::error::ClioneError;
use serde::Serialize;
use serde_json::{Map, Value};

/// A value that can be bound through the `Any` driver. Converts from serde_json::Value.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
}

impl BindValue {
    /// Arrays and objects bind as their JSON text.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    BindValue::F64(f)
                } else {
                    BindValue::String(n.to_string())
                }
            }
            Value::String(s) => BindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::String(v.to_string()),
        }
    }
}

/// Parameters bound to a 2-Way SQL template by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Parameters from the fields of a serializable entity.
    pub fn from_entity<T: Serialize>(entity: &T) -> Result<Self, ClioneError> {
        match serde_json::to_value(entity) {
            Ok(Value::Object(values)) => Ok(Self { values }),
            Ok(other) => Err(ClioneError::Format(format!(
                "entity parameters must serialize to an object, got {}",
                other
            ))),
            Err(e) => Err(ClioneError::Format(e.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve a dotted path (`person.name`) no deeper than `depth_limit` segments.
    pub fn lookup(&self, path: &str, depth_limit: usize) -> Result<Option<&Value>, ClioneError> {
        let mut segments = path.split('.');
        let depth = path.split('.').count();
        if depth > depth_limit {
            return Err(ClioneError::Format(format!(
                "parameter '{}' nests {} levels, limit is {}",
                path, depth, depth_limit
            )));
        }
        let first = match segments.next() {
            Some(s) => s,
            None => return Ok(None),
        };
        let mut current = match self.values.get(first) {
            Some(v) => v,
            None => return Ok(None),
        };
        for segment in segments {
            current = match current.get(segment) {
                Some(v) => v,
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }
}

impl From<Map<String, Value>> for Params {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
