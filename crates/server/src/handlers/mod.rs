#![forbid(unsafe_code)]

use crate::reconciler::ListError;
use crate::{ListServer, attach_id, err_body, ok_body, rate_limited_body};
use crate::{optional_string, params_object, require_string};
use serde_json::{Value, json};

impl ListServer {
    pub(crate) fn handle(&mut self, request: crate::Request) -> Value {
        let crate::Request { id, action, params } = request;

        if let Err(retry_after_ms) = self.limiter.check(crate::now_ms_i64()) {
            return attach_id(rate_limited_body(retry_after_ms), id);
        }

        let body = self.dispatch(&action, &params);
        attach_id(body, id)
    }

    fn dispatch(&mut self, action: &str, params: &Option<Value>) -> Value {
        let params = match params_object(params) {
            Ok(v) => v,
            Err(body) => return body,
        };
        match action {
            "getStatus" => self.action_get_status(),
            "getRoster" => self.action_get_roster(),
            "getStatusWithRoster" => self.action_get_status_with_roster(&params),
            "tryAdd" => self.action_try_add(&params),
            "remove" => self.action_remove(&params),
            "open" => self.action_open(&params),
            "close" => self.action_close(&params),
            _ => err_body(400, "UNKNOWN_ACTION", &format!("unknown action: {action}")),
        }
    }

    fn action_get_status(&mut self) -> Value {
        match self.reconciler.status() {
            Ok(status) => ok_body(json!({ "isOpen": status.is_open() })),
            Err(err) => list_error_body(&err),
        }
    }

    fn action_get_roster(&mut self) -> Value {
        match self.reconciler.roster() {
            Ok(roster) => ok_body(json!({ "names": roster.names() })),
            Err(err) => list_error_body(&err),
        }
    }

    fn action_get_status_with_roster(
        &mut self,
        params: &serde_json::Map<String, Value>,
    ) -> Value {
        let last_cursor = match optional_string(params, "lastCursor") {
            Ok(v) => v,
            Err(body) => return body,
        };
        match self.reconciler.snapshot(last_cursor.as_deref()) {
            Ok(snapshot) => ok_body(json!({
                "isOpen": snapshot.is_open,
                "cursor": snapshot.cursor,
                "changed": snapshot.changed,
                "names": snapshot.names
            })),
            Err(err) => list_error_body(&err),
        }
    }

    fn action_try_add(&mut self, params: &serde_json::Map<String, Value>) -> Value {
        let name = match require_string(params, "name") {
            Ok(v) => v,
            Err(body) => return body,
        };
        let if_cursor = match optional_string(params, "ifCursor") {
            Ok(v) => v,
            Err(body) => return body,
        };
        match self.reconciler.try_add(&name, if_cursor.as_deref()) {
            Ok(placement) => ok_body(json!({ "placement": placement.as_str() })),
            Err(err) => list_error_body(&err),
        }
    }

    fn action_remove(&mut self, params: &serde_json::Map<String, Value>) -> Value {
        let name = match require_string(params, "name") {
            Ok(v) => v,
            Err(body) => return body,
        };
        let if_cursor = match optional_string(params, "ifCursor") {
            Ok(v) => v,
            Err(body) => return body,
        };
        match self.reconciler.remove(&name, if_cursor.as_deref()) {
            Ok(()) => ok_body(json!({})),
            Err(err) => list_error_body(&err),
        }
    }

    fn action_open(&mut self, params: &serde_json::Map<String, Value>) -> Value {
        if let Err(body) = self.check_gate(params) {
            return body;
        }
        match self.reconciler.open() {
            Ok(()) => ok_body(json!({})),
            Err(err) => list_error_body(&err),
        }
    }

    fn action_close(&mut self, params: &serde_json::Map<String, Value>) -> Value {
        if let Err(body) = self.check_gate(params) {
            return body;
        }
        match self.reconciler.close() {
            Ok(()) => ok_body(json!({})),
            Err(err) => list_error_body(&err),
        }
    }

    fn check_gate(&self, params: &serde_json::Map<String, Value>) -> Result<(), Value> {
        let passphrase = optional_string(params, "passphrase")?;
        if self.gate.permits(passphrase.as_deref()) {
            return Ok(());
        }
        Err(err_body(401, "BAD_PASSPHRASE", "wrong or missing passphrase"))
    }
}

fn list_error_body(err: &ListError) -> Value {
    match err {
        ListError::Closed => err_body(400, "LIST_CLOSED", &err.to_string()),
        ListError::Duplicate { .. } => err_body(400, "DUPLICATE_NAME", &err.to_string()),
        ListError::NotFound { .. } => err_body(400, "NOT_FOUND", &err.to_string()),
        ListError::InvalidName(_) => err_body(400, "INVALID_NAME", &err.to_string()),
        ListError::CursorMoved { .. } => err_body(409, "CURSOR_MOVED", &err.to_string()),
        ListError::Sheet(_) => err_body(500, "STORE_ERROR", &err.to_string()),
    }
}
