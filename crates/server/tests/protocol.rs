#![forbid(unsafe_code)]

mod support;
use support::*;

use serde_json::json;

#[test]
fn fresh_store_reads_closed_and_empty() {
    let mut server = Server::start("fresh_store");

    let status = server.call("getStatus", json!({}));
    assert_ok(&status);
    assert_eq!(result_of(&status).get("isOpen"), Some(&json!(false)));

    let roster = server.call("getRoster", json!({}));
    assert_ok(&roster);
    assert!(names_of(&roster).is_empty());
}

#[test]
fn unknown_action_is_rejected() {
    let mut server = Server::start("unknown_action");
    let resp = server.call("getPlayers", json!({}));
    assert_error(&resp, 400, "UNKNOWN_ACTION");
}

#[test]
fn malformed_json_gets_parse_error_with_null_id() {
    let mut server = Server::start("malformed_json");
    server.send_raw("{this is not json");
    let resp = server.recv();
    assert_error(&resp, 400, "PARSE_ERROR");
    assert_eq!(resp.get("id"), Some(&serde_json::Value::Null));

    // The connection survives a bad line.
    let status = server.call("getStatus", json!({}));
    assert_ok(&status);
}

#[test]
fn missing_required_params_are_rejected() {
    let mut server = Server::start("missing_params");

    let resp = server.call("tryAdd", json!({}));
    assert_error(&resp, 400, "INVALID_INPUT");

    let resp = server.call("remove", json!({}));
    assert_error(&resp, 400, "INVALID_INPUT");

    let resp = server.request(json!({ "id": 99, "action": "tryAdd", "params": "Ana" }));
    assert_error(&resp, 400, "INVALID_INPUT");
}

#[test]
fn requests_without_id_echo_null() {
    let mut server = Server::start("null_id");
    let resp = server.request(json!({ "action": "getStatus" }));
    assert_ok(&resp);
    assert_eq!(resp.get("id"), Some(&serde_json::Value::Null));
}
