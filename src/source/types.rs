// Records API response types.
// Defines structs for deserializing the stats and element endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `GET /stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_records: u64,
}

/// Evaluation payload of an element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementResult {
    #[serde(default)]
    pub test: Value,
    #[serde(default)]
    pub train: Value,
}

impl ElementResult {
    pub fn test_text(&self) -> String {
        value_text(&self.test)
    }

    pub fn train_text(&self) -> String {
        value_text(&self.train)
    }
}

/// Response of the element-by-index endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent: Option<Value>,
    #[serde(default)]
    pub result: Option<ElementResult>,
    #[serde(default)]
    pub score: Option<Value>,
}

/// Render a loosely typed field as text; null becomes empty.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
