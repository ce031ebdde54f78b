use std::error::Error;
use std::fmt;

/// A value attached to a structured log call.
///
/// The variant decides how the value is rendered into a field; see
/// [`crate::field::FieldEncoder`].
#[derive(Debug)]
pub enum Value {
    Str(String),
    /// Nullable string; `None` drops the field.
    OptStr(Option<String>),
    /// Raw bytes, rendered lossily as UTF-8.
    Bytes(Vec<u8>),
    /// Nullable bytes; `None` drops the field.
    OptBytes(Option<Vec<u8>>),
    Int(i64),
    Error(Box<dyn Error + Send + Sync>),
    /// Anything else, already rendered with its `Debug` form.
    Other(String),
}

impl Value {
    pub fn error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Value::Error(Box::new(err))
    }

    /// Capture an arbitrary value through its `Debug` representation.
    pub fn debug<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Value::Other(format!("{:?}", value))
    }

    /// The string content, if this value can serve as a key.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        Value::OptStr(v)
    }
}

impl From<Option<&str>> for Value {
    fn from(v: Option<&str>) -> Self {
        Value::OptStr(v.map(str::to_string))
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Option<Vec<u8>>> for Value {
    fn from(v: Option<Vec<u8>>) -> Self {
        Value::OptBytes(v)
    }
}

impl From<Box<dyn Error + Send + Sync>> for Value {
    fn from(v: Box<dyn Error + Send + Sync>) -> Self {
        Value::Error(v)
    }
}

macro_rules! signed_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

macro_rules! debug_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Other(format!("{:?}", v))
            }
        })*
    };
}

signed_into_value!(i8, i16, i32, i64, isize);
debug_into_value!(u8, u16, u32, u64, usize, bool, f32, f64);

/// Build a `Vec<(&str, Value)>` from `key => value` pairs.
///
/// ```
/// use ctxlog::{kv, Value};
///
/// let pairs = kv!["order" => 42, "note" => "late", "error" => Value::debug(&())];
/// assert_eq!(pairs.len(), 3);
/// ```
#[macro_export]
macro_rules! kv {
    () => {
        ::std::vec::Vec::<(&str, $crate::Value)>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$(($key, $crate::Value::from($value))),+]
    };
}
