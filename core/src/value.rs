//! Attribute values exchanged between requests, the engine and the store.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::DomainError;

/// A column value.
///
/// Mirrors the storage classes of a relational row. Booleans arriving from
/// JSON bodies are stored as `Integer(0 | 1)`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Integer value (i64)
    Integer(i64),
    /// Real value (f64)
    Real(f64),
    /// Text value
    Text(String),
}

impl Value {
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Converts a JSON scalar into a column value.
    ///
    /// Arrays and objects have no column representation and are rejected as
    /// `Malformed`.
    pub fn from_json(value: &JsonValue) -> Result<Self, DomainError> {
        match value {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Integer(i64::from(*b))),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .or_else(|| n.as_f64().map(Value::Real))
                .ok_or_else(|| DomainError::malformed(format!("Number {n} is out of range."))),
            JsonValue::String(s) => Ok(Value::Text(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => Err(DomainError::malformed(
                "Attribute values must be strings, numbers, booleans or null.",
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<EntityId> for Value {
    fn from(value: EntityId) -> Self {
        Value::Integer(value.get())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

//------------------------------------------------------------------------------
// Database Driver Implementations
//------------------------------------------------------------------------------

#[cfg(feature = "rusqlite")]
impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, ValueRef};

        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

#[cfg(feature = "rusqlite")]
impl rusqlite::types::FromSql for Value {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        use rusqlite::types::ValueRef;

        let result = match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(items) | ValueRef::Blob(items) => {
                Value::Text(String::from_utf8_lossy(items).into_owned())
            }
        };
        Ok(result)
    }
}

/// Attribute name to value mapping of a single row.
pub type Attributes = BTreeMap<String, Value>;

/// Builds [`Attributes`] from a JSON object body.
pub fn attributes_from_json(
    body: &serde_json::Map<String, JsonValue>,
) -> Result<Attributes, DomainError> {
    body.iter()
        .map(|(key, value)| Ok((key.clone(), Value::from_json(value)?)))
        .collect()
}

/// Store-assigned identifier of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(EntityId)
            .map_err(|_| DomainError::malformed(format!("`{s}` is not a valid id.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(Value::from_json(&json!(null)).unwrap(), Value::Null);
        assert_eq!(Value::from_json(&json!(true)).unwrap(), Value::Integer(1));
        assert_eq!(Value::from_json(&json!(7)).unwrap(), Value::Integer(7));
        assert_eq!(Value::from_json(&json!(0.25)).unwrap(), Value::Real(0.25));
        assert_eq!(
            Value::from_json(&json!("Ana")).unwrap(),
            Value::Text("Ana".into())
        );
    }

    #[test]
    fn json_containers_are_malformed() {
        let err = Value::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, DomainError::Malformed(_)));
        let err = Value::from_json(&json!({"a": 1})).unwrap_err();
        assert!(matches!(err, DomainError::Malformed(_)));
    }

    #[test]
    fn entity_id_parses() {
        assert_eq!("42".parse::<EntityId>().unwrap(), EntityId::new(42));
        assert!(matches!(
            "abc".parse::<EntityId>(),
            Err(DomainError::Malformed(_))
        ));
    }
}
