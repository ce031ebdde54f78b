use crate::value::Value;
use std::fmt;

/// Rendered value of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    /// Structured payload that sinks write as-is (source location, HTTP
    /// request, trace flags).
    Opaque(serde_json::Value),
}

impl FieldValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Opaque(v) => v.clone(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Opaque(v) => write!(f, "{}", v),
        }
    }
}

/// One key/value unit of a log record. Keys are not unique within a
/// record; every field is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Field {
            key: key.into(),
            value: FieldValue::String(value.into()),
        }
    }

    pub fn opaque(key: impl Into<String>, value: serde_json::Value) -> Self {
        Field {
            key: key.into(),
            value: FieldValue::Opaque(value),
        }
    }

    /// The value if it is a plain string.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            FieldValue::String(s) => Some(s),
            FieldValue::Opaque(_) => None,
        }
    }
}

/// Turns caller-supplied key/value pairs into [`Field`]s.
///
/// Output order always follows input order. Nothing here fails: a pair
/// that cannot be rendered under its key is dropped.
#[derive(Debug, Clone)]
pub struct FieldEncoder {
    error_key: String,
}

impl FieldEncoder {
    /// `error_key` is both accepted as an alias of `"error"` and used as
    /// the emitted key for error values.
    pub fn new(error_key: impl Into<String>) -> Self {
        Self {
            error_key: error_key.into(),
        }
    }

    pub fn error_key(&self) -> &str {
        &self.error_key
    }

    pub fn encode<'a, I>(&self, pairs: I) -> Vec<Field>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        pairs
            .into_iter()
            .filter_map(|(key, value)| self.encode_pair(key, value))
            .collect()
    }

    /// Encode an alternating `key, value, key, value, ...` list.
    ///
    /// A trailing key without a value is dropped, as is any pair whose key
    /// is not a string.
    pub fn encode_flat(&self, items: Vec<Value>) -> Vec<Field> {
        let mut fields = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            if let Some(key) = key.as_key() {
                if let Some(field) = self.encode_pair(key, value) {
                    fields.push(field);
                }
            }
        }
        fields
    }

    fn encode_pair(&self, key: &str, value: Value) -> Option<Field> {
        if key == "error" || key == self.error_key {
            return match value {
                Value::Error(err) => Some(Field::string(&self.error_key, err.to_string())),
                _ => None,
            };
        }

        let rendered = match value {
            Value::Str(s) | Value::Other(s) => s,
            Value::OptStr(s) => s?,
            Value::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
            Value::OptBytes(b) => String::from_utf8_lossy(&b?).into_owned(),
            Value::Int(n) => n.to_string(),
            Value::Error(err) => err.to_string(),
        };
        Some(Field::string(key, rendered))
    }
}

impl Default for FieldEncoder {
    fn default() -> Self {
        FieldEncoder::new("err")
    }
}
