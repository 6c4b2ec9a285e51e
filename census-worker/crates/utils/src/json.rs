use serde_json::Value;

/// Renders a loosely typed JSON scalar the way the remote services expect it in text fields:
/// strings verbatim, numbers and booleans in their JSON form, `null` and missing as empty.
pub fn scalar_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
