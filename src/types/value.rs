use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::expr::CompareOp;

/// Named accessor surface for opaque statistics objects supplied by the host.
///
/// Expressions reach into these objects with member access (`stats.count`)
/// and zero-argument method invocation (`stats.getTermCount()`). Both resolve
/// through this capability table rather than reflection: an implementation
/// answers the names it supports and returns `None` for everything else.
pub trait StatsObject: Send + Sync + fmt::Debug {
    /// Read a named property. `None` means the property is not exposed.
    fn field(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Invoke a named zero-argument accessor. `None` means the method is not
    /// exposed; the evaluator reports that as a runtime error.
    fn call(&self, method: &str) -> Option<Value> {
        let _ = method;
        None
    }
}

/// Supported value types for expression evaluation.
///
/// Analysis views supply primitives, nested mappings, and opaque
/// [`StatsObject`]s; `Null` doubles as the explicit absent marker so
/// expressions can test `filters == null` without a resolution error.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null/absent marker.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// A nested name-to-value mapping.
    Map(HashMap<String, Value>),
    /// An opaque host object exposing named accessors.
    Object(Arc<dyn StatsObject>),
}

impl Value {
    /// Compare this value to another using the given operator.
    ///
    /// Equality is defined against `Null` (null equals only null) and between
    /// booleans; ordering is defined for numbers (with Int/Float cross-type
    /// comparison) and strings. Returns `None` for anything else, which the
    /// evaluator surfaces as a runtime error rather than defaulting the gate.
    #[must_use]
    pub fn compare(&self, op: CompareOp, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Null, Value::Null) => match op {
                CompareOp::Eq => Some(true),
                CompareOp::Neq => Some(false),
                _ => None,
            },
            (Value::Null, _) | (_, Value::Null) => match op {
                CompareOp::Eq => Some(false),
                CompareOp::Neq => Some(true),
                _ => None,
            },
            (Value::Bool(a), Value::Bool(b)) => match op {
                CompareOp::Eq => Some(a == b),
                CompareOp::Neq => Some(a != b),
                _ => None,
            },
            _ => {
                let ord = self.partial_cmp_value(other)?;
                Some(match op {
                    CompareOp::Eq => ord == Ordering::Equal,
                    CompareOp::Neq => ord != Ordering::Equal,
                    CompareOp::Gt => ord == Ordering::Greater,
                    CompareOp::Gte => ord != Ordering::Less,
                    CompareOp::Lt => ord == Ordering::Less,
                    CompareOp::Lte => ord != Ordering::Greater,
                })
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Short name of this value's type, used in runtime error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Convert a `serde_json::Value` into an expression value.
    ///
    /// Integral numbers become `Int`, everything else numeric becomes
    /// `Float`, objects become nested `Map`s. Arrays are not part of the
    /// expression language; they convert to `Null` with a warning.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
            serde_json::Value::Array(_) => {
                log::warn!("analysis value contains an array, treating as null");
                Value::Null
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(v: HashMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<Arc<dyn StatsObject>> for Value {
    fn from(v: Arc<dyn StatsObject>) -> Self {
        Value::Object(v)
    }
}

// Strings render unquoted: values are interpolated into rejection messages
// and fed to the truthiness coercion, both of which want the raw text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Map(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {}", entries[*key])?;
                }
                write!(f, "}}")
            }
            Value::Object(_) => write!(f, "<object>"),
        }
    }
}
