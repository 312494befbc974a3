#![forbid(unsafe_code)]

use super::proto::err_body;
use serde_json::Value;

/// Params are optional on the wire; a missing object reads as empty.
pub(crate) fn params_object(params: &Option<Value>) -> Result<serde_json::Map<String, Value>, Value> {
    match params {
        None | Some(Value::Null) => Ok(serde_json::Map::new()),
        Some(Value::Object(obj)) => Ok(obj.clone()),
        Some(_) => Err(err_body(400, "INVALID_INPUT", "params must be an object")),
    }
}

pub(crate) fn require_string(
    params: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<String, Value> {
    let Some(v) = params.get(key).and_then(|v| v.as_str()) else {
        return Err(err_body(400, "INVALID_INPUT", &format!("{key} is required")));
    };
    Ok(v.to_string())
}

pub(crate) fn optional_string(
    params: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<String>, Value> {
    let Some(value) = params.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::String(v) => Ok(Some(v.to_string())),
        _ => Err(err_body(
            400,
            "INVALID_INPUT",
            &format!("{key} must be a string"),
        )),
    }
}
