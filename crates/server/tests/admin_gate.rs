#![forbid(unsafe_code)]

mod support;
use support::*;

use serde_json::json;

#[test]
fn gated_open_and_close_require_the_passphrase() {
    let mut server = Server::start_with_args("gated_open", &["--admin-pass", "hunter2"]);

    let resp = server.call("open", json!({}));
    assert_error(&resp, 401, "BAD_PASSPHRASE");
    let resp = server.call("open", json!({ "passphrase": "wrong" }));
    assert_error(&resp, 401, "BAD_PASSPHRASE");

    // The gate refused before touching the list.
    let status = server.call("getStatus", json!({}));
    assert_eq!(result_of(&status).get("isOpen"), Some(&json!(false)));

    assert_ok(&server.call("open", json!({ "passphrase": "hunter2" })));
    let status = server.call("getStatus", json!({}));
    assert_eq!(result_of(&status).get("isOpen"), Some(&json!(true)));

    let resp = server.call("close", json!({ "passphrase": "nope" }));
    assert_error(&resp, 401, "BAD_PASSPHRASE");
    assert_ok(&server.call("close", json!({ "passphrase": "hunter2" })));
}

#[test]
fn reads_and_signups_are_not_gated() {
    let mut server = Server::start_with_args("ungated_reads", &["--admin-pass", "hunter2"]);
    assert_ok(&server.call("open", json!({ "passphrase": "hunter2" })));

    // Participants never need the passphrase.
    assert_ok(&server.call("getStatus", json!({})));
    assert_ok(&server.call("tryAdd", json!({ "name": "Ana" })));
    assert_ok(&server.call("remove", json!({ "name": "Ana" })));
}

#[test]
fn unconfigured_gate_is_open() {
    let mut server = Server::start("ungated_admin");
    assert_ok(&server.call("open", json!({})));
    assert_ok(&server.call("close", json!({})));
}
