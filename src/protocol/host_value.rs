use crate::client::ParamBinding;
use crate::error::{DriverError, Result};
use serde::Serialize;

/// The dynamic-host value domain. Parameters flow in and fetched
/// column values flow out as this one closed sum type, so parameter
/// dispatch is an exhaustive match rather than a runtime kind check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HostValue {
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
    Bool(bool),
}

impl HostValue {
    /// Marshals this value into its parameter form: nulls become a
    /// type-tagged null integer slot, numbers an 8-byte double bound as
    /// a decimal, text a borrowed exact-length character binding,
    /// booleans a 4-byte integer, integers an 8-byte integer.
    pub fn binding(&self) -> ParamBinding<'_> {
        match self {
            HostValue::Null => ParamBinding::Null,
            HostValue::Integer(n) => ParamBinding::BigInt(*n),
            HostValue::Number(n) => ParamBinding::Double(*n),
            HostValue::Text(s) => ParamBinding::Text(s.as_bytes()),
            HostValue::Bool(b) => ParamBinding::Int(i32::from(*b)),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Integer(_) => "integer",
            HostValue::Number(_) => "number",
            HostValue::Text(_) => "string",
            HostValue::Bool(_) => "boolean",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            HostValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HostValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Marshals one dynamic host value into the parameter domain.
    /// Aggregate kinds have no parameter representation and fail with
    /// an error naming the kind.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(HostValue::Null),
            serde_json::Value::Bool(b) => Ok(HostValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(HostValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(HostValue::Number(f))
                } else {
                    Err(DriverError::UnsupportedBinding("number".to_string()))
                }
            }
            serde_json::Value::String(s) => Ok(HostValue::Text(s.clone())),
            serde_json::Value::Array(_) => {
                Err(DriverError::UnsupportedBinding("array".to_string()))
            }
            serde_json::Value::Object(_) => {
                Err(DriverError::UnsupportedBinding("object".to_string()))
            }
        }
    }

    /// Marshals an ordered dynamic parameter list, stopping at the
    /// first value that has no parameter representation.
    pub fn params_from_json(values: &[serde_json::Value]) -> Result<Vec<Self>> {
        values.iter().map(Self::from_json).collect()
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Integer(n)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Text(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Text(s)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}
