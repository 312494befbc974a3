#![forbid(unsafe_code)]

use serde::Deserialize;
use serde_json::{Value, json};

/// One request on the action-dispatched boundary. `id` is echoed back
/// verbatim so callers can match responses on a pipelined connection.
#[derive(Debug, Deserialize)]
pub(crate) struct Request {
    #[serde(default)]
    pub(crate) id: Option<Value>,
    pub(crate) action: String,
    #[serde(default)]
    pub(crate) params: Option<Value>,
}

pub(crate) fn ok_body(result: Value) -> Value {
    json!({
        "status": 200,
        "ok": true,
        "result": result,
        "error": null
    })
}

pub(crate) fn err_body(status: u16, code: &str, message: &str) -> Value {
    json!({
        "status": status,
        "ok": false,
        "result": {},
        "error": { "code": code, "message": message.trim() }
    })
}

pub(crate) fn rate_limited_body(retry_after_ms: i64) -> Value {
    json!({
        "status": 429,
        "ok": false,
        "result": {},
        "error": {
            "code": "RATE_LIMITED",
            "message": "too many requests, slow down",
            "retryAfterMs": retry_after_ms
        }
    })
}

/// Responses always carry the request id, null included, so clients can
/// rely on the field being present.
pub(crate) fn attach_id(mut body: Value, id: Option<Value>) -> Value {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("id".to_string(), id.unwrap_or(Value::Null));
    }
    body
}
