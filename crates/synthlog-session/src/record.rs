//! Log records
//!
//! A record is an opaque JSON object whose only required field is `id`. The
//! id may be a string or a number, matching whatever the producer used.

use crate::error::{SessionLogError, SessionLogResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Record identifier, unique within its session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(Number),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value.into())
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        RecordId::Number(value.into())
    }
}

/// One entry in a session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: RecordId,

    /// Every field other than `id`, kept as-is
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl LogRecord {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            payload: Map::new(),
        }
    }

    /// Set a payload field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Build a record from an arbitrary JSON value
    ///
    /// The value must be an object carrying a string or numeric `id`.
    pub fn from_value(value: Value) -> SessionLogResult<Self> {
        let Value::Object(mut payload) = value else {
            return Err(SessionLogError::InvalidRecord(
                "record must be a JSON object".to_string(),
            ));
        };

        let id = match payload.remove("id") {
            Some(Value::String(s)) => RecordId::Text(s),
            Some(Value::Number(n)) => RecordId::Number(n),
            Some(other) => {
                return Err(SessionLogError::InvalidRecord(format!(
                    "record id must be a string or number, got {}",
                    other
                )));
            }
            None => {
                return Err(SessionLogError::InvalidRecord(
                    "record is missing the required 'id' field".to_string(),
                ));
            }
        };

        Ok(Self { id, payload })
    }

    /// The record as a single JSON object, `id` included
    pub fn to_value(&self) -> Value {
        let mut object = self.payload.clone();
        let id = match &self.id {
            RecordId::Number(n) => Value::Number(n.clone()),
            RecordId::Text(s) => Value::String(s.clone()),
        };
        object.insert("id".to_string(), id);
        Value::Object(object)
    }
}
