//! LogEvent - Router input
//!
//! Structured log event and the value types it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Event severity, ordered by increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Verbose,
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    /// All levels, least severe first
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Information,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Canonical level name
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "Verbose",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Fatal => "Fatal",
        }
    }

    /// Look up a level by name or short alias, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let level = match name.to_ascii_lowercase().as_str() {
            "verbose" | "vrb" => LogLevel::Verbose,
            "debug" | "dbg" => LogLevel::Debug,
            "information" | "inf" => LogLevel::Information,
            "warning" | "wrn" => LogLevel::Warning,
            "error" | "err" => LogLevel::Error,
            "fatal" | "ftl" => LogLevel::Fatal,
            _ => return None,
        };
        Some(level)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ContractError::Other(format!("unknown log level: {s}")))
    }
}

/// Structured property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<PropertyValue>),
    Structure(BTreeMap<String, PropertyValue>),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("null"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            PropertyValue::Structure(fields) => {
                f.write_str("{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

/// Message template with `{Name}` holes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageTemplate {
    text: String,
}

impl MessageTemplate {
    /// Create a template from its raw text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Raw template text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitute `{Name}` holes with property values.
    ///
    /// Holes without a matching property are kept verbatim; `{{` and `}}`
    /// render as literal braces.
    pub fn render(&self, properties: &HashMap<String, PropertyValue>) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") || tail.starts_with("}}") {
                out.push_str(&tail[..1]);
                rest = &tail[2..];
                continue;
            }

            if tail.starts_with('{') {
                if let Some(end) = tail.find('}') {
                    let hole = &tail[1..end];
                    // `{Name:format}` and `{@Name}` both look up `Name`
                    let name = hole
                        .trim_start_matches(['@', '$'])
                        .split([':', ','])
                        .next()
                        .unwrap_or_default();
                    match properties.get(name) {
                        Some(value) => out.push_str(&value.to_string()),
                        None => out.push_str(&tail[..=end]),
                    }
                    rest = &tail[end + 1..];
                    continue;
                }
            }

            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }

        out.push_str(rest);
        out
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Structured log event
///
/// Immutable once built; the router only inspects it and hands the same
/// reference to destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Event time (UTC)
    pub timestamp: DateTime<Utc>,

    /// Severity
    pub level: LogLevel,

    /// Message template
    pub message_template: MessageTemplate,

    /// Property name -> value
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,

    /// Rendered exception, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl LogEvent {
    /// Create an event stamped with the current time and no properties
    pub fn new(level: LogLevel, message_template: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message_template: MessageTemplate::new(message_template),
            properties: HashMap::new(),
            exception: None,
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Builder-style timestamp setter
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Builder-style exception setter
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Render the message template against this event's properties
    pub fn render_message(&self) -> String {
        self.message_template.render(&self.properties)
    }
}
