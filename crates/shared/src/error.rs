use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field name to human readable message.
pub type FieldErrors = BTreeMap<String, String>;

/// Body of a rejected request.
///
/// Field detail arrives either as `errors` or, from the validation handler,
/// as an object-valued `data` next to `message: "Validation failed"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorBody {
    pub fn field_errors(&self) -> FieldErrors {
        if let Some(errors) = &self.errors {
            return errors.clone();
        }
        match &self.data {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(field, message)| {
                    message.as_str().map(|text| (field.clone(), text.to_string()))
                })
                .collect(),
            _ => FieldErrors::new(),
        }
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}
