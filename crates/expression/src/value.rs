//! Runtime values produced while evaluating an expression.
//!
//! Values borrow from the event and from the expression's constants, so
//! evaluation does not clone property data.

use chrono::{DateTime, SecondsFormat, Utc};
use contracts::{LogEvent, LogLevel, MessageTemplate, PropertyValue};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::EvalError;

#[derive(Debug, Clone)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Cow<'a, str>),
    Level(LogLevel),
    Timestamp(DateTime<Utc>),
    Event(&'a LogEvent),
    Properties(&'a HashMap<String, PropertyValue>),
    Template(&'a MessageTemplate),
    Sequence(&'a [PropertyValue]),
    Structure(&'a BTreeMap<String, PropertyValue>),
}

impl<'a> Value<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Level(_) => "level",
            Value::Timestamp(_) => "timestamp",
            Value::Event(_) => "event",
            Value::Properties(_) => "properties",
            Value::Template(_) => "message template",
            Value::Sequence(_) => "sequence",
            Value::Structure(_) => "structure",
        }
    }

    pub fn from_property(value: &'a PropertyValue) -> Self {
        match value {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Int(i) => Value::Int(*i),
            PropertyValue::Float(f) => Value::Float(*f),
            PropertyValue::String(s) => Value::Str(Cow::Borrowed(s.as_str())),
            PropertyValue::Sequence(items) => Value::Sequence(items),
            PropertyValue::Structure(fields) => Value::Structure(fields),
        }
    }

    pub fn as_bool(&self, context: &str) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::new(format!(
                "{context} expects bool, got {}",
                other.kind()
            ))),
        }
    }

    pub fn as_str(&self, context: &str) -> Result<&str, EvalError> {
        match self {
            Value::Str(s) => Ok(s.as_ref()),
            other => Err(EvalError::new(format!(
                "{context} expects string, got {}",
                other.kind()
            ))),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Equality used by `==` and `!=`. Values of different kinds are unequal.
    pub fn loose_eq(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Level(a), Value::Level(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Event(a), Value::Event(b)) => a == b,
            (Value::Properties(a), Value::Properties(b)) => a == b,
            (Value::Template(a), Value::Template(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Structure(a), Value::Structure(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Ordering used by `<`, `<=`, `>`, `>=`
    pub fn try_cmp(&self, other: &Value<'_>) -> Result<Ordering, EvalError> {
        let ordering = match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Level(a), Value::Level(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => {
                    return Err(EvalError::new(format!(
                        "cannot compare {} with {}",
                        self.kind(),
                        other.kind()
                    )))
                }
            },
        };
        ordering.ok_or_else(|| EvalError::new("cannot order NaN"))
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
            Value::Level(level) => f.write_str(level.as_str()),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Event(event) => f.write_str(&event.render_message()),
            Value::Properties(props) => {
                let sorted: BTreeMap<_, _> = props.iter().collect();
                f.write_str("{ ")?;
                for (i, (name, value)) in sorted.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str(" }")
            }
            Value::Template(template) => f.write_str(template.text()),
            Value::Sequence(items) => write!(f, "{}", PropertyValue::Sequence(items.to_vec())),
            Value::Structure(fields) => {
                write!(f, "{}", PropertyValue::Structure((*fields).clone()))
            }
        }
    }
}
