//! Loosely-typed result records.

use crate::error::ClioneError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::any::AnyRow;
use sqlx::{Column, Row};

/// One row keyed by column label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultMap(Map<String, Value>);

impl ResultMap {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(column))
                .map(|(_, v)| v)
        })
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn get_bool(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|i| i != 0),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Deserialize the record into an entity by column label.
    pub fn into_entity<T: DeserializeOwned>(self) -> Result<T, ClioneError> {
        serde_json::from_value(self.into_value())
            .map_err(|e| ClioneError::Format(format!("cannot map row to entity: {}", e)))
    }
}

impl From<Map<String, Value>> for ResultMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub(crate) fn row_to_result_map(row: &AnyRow) -> ResultMap {
    let mut map = Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i));
    }
    ResultMap(map)
}

fn cell_to_value(row: &AnyRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return v
            .map(|bytes| Value::Array(bytes.into_iter().map(|b| Value::Number(b.into())).collect()))
            .unwrap_or(Value::Null);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn record(v: Value) -> ResultMap {
        match v {
            Value::Object(m) => ResultMap::from(m),
            _ => unreachable!(),
        }
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Person {
        id: i64,
        name: String,
    }

    #[test]
    fn getters_fall_back_to_case_insensitive_labels() {
        let r = record(json!({"ID": 1, "name": "Alice", "active": 1}));
        assert_eq!(r.get_i64("id"), Some(1));
        assert_eq!(r.get_str("NAME"), Some("Alice"));
        assert_eq!(r.get_bool("active"), Some(true));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn maps_into_entity() {
        let r = record(json!({"id": 2, "name": "Bob"}));
        assert_eq!(
            r.into_entity::<Person>().unwrap(),
            Person {
                id: 2,
                name: "Bob".into()
            }
        );
        let bad = record(json!({"id": "x"}));
        assert!(matches!(bad.into_entity::<Person>(), Err(ClioneError::Format(_))));
    }
}
