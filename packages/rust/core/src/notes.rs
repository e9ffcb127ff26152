//! Interpretation of the chief-of-staff output.

use serde_json::Value;

/// Outcome of reading the raw notes as a structured record.
#[derive(Debug, Clone, PartialEq)]
pub enum NotesParse {
    /// The whole text was a JSON object or array.
    Structured(Value),
    /// Anything else; downstream stages fall back to the raw text.
    Unparsed { reason: String },
}

impl NotesParse {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn record(&self) -> Option<&Value> {
        match self {
            Self::Structured(v) => Some(v),
            Self::Unparsed { .. } => None,
        }
    }

    /// Payload for the PRD stage: the record pretty-printed when it has any
    /// content, otherwise the raw notes untouched.
    pub fn prd_payload(&self, raw: &str) -> String {
        match self.record() {
            Some(record) if !is_empty_record(record) => {
                serde_json::to_string_pretty(record).unwrap_or_else(|_| raw.to_string())
            }
            _ => raw.to_string(),
        }
    }
}

/// Parse the complete notes text. Leading and trailing whitespace is allowed;
/// a scalar (string, number, bool, null) does not count as a record.
pub fn parse_notes(raw: &str) -> NotesParse {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => NotesParse::Structured(value),
        Ok(other) => NotesParse::Unparsed {
            reason: format!("expected a JSON object or array, found {}", kind_of(&other)),
        },
        Err(e) => NotesParse::Unparsed {
            reason: e.to_string(),
        },
    }
}

fn is_empty_record(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => true,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
