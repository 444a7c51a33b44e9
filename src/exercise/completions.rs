//! Editor completions projection.
//!
//! The host hands the exercise a JSON map keyed by class name:
//!
//! ```json
//! { "Turtle": { "methods": [ { "translated": "avancer(...)", "displayed": "walk" } ] } }
//! ```
//!
//! The exercise only reads it to list the classes and method labels the
//! learner may use. Anything with an unexpected shape projects to an empty
//! list instead of failing.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One method label offered to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodCompletion {
    pub caption: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct MethodEntry {
    #[serde(default)]
    translated: Option<String>,
    #[serde(default)]
    displayed: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completions {
    classes: Map<String, Value>,
}

impl Completions {
    /// Build from arbitrary JSON. A non-object value yields an empty map.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(classes) => Self { classes },
            other => {
                warn!("completions must be a JSON object, got {}", type_name(&other));
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Names of classes described by a mapping.
    pub fn displayed_classes(&self) -> Vec<String> {
        self.classes
            .iter()
            .filter(|(_, v)| v.is_object())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Method labels for `class`. Unknown classes, missing or malformed
    /// `methods` entries give an empty list.
    pub fn displayed_methods(&self, class: &str) -> Vec<MethodCompletion> {
        let Some(methods) = self.classes.get(class).and_then(|c| c.get("methods")) else {
            return Vec::new();
        };
        let entries: Vec<&Value> = match methods {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => return Vec::new(),
        };
        entries
            .into_iter()
            .filter_map(|entry| MethodEntry::deserialize(entry).ok())
            .map(|entry| MethodCompletion {
                caption: entry.translated.unwrap_or_default(),
                value: entry.displayed.unwrap_or_default(),
            })
            .collect()
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
