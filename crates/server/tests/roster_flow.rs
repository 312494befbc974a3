#![forbid(unsafe_code)]

mod support;
use support::*;

use serde_json::json;

#[test]
fn closed_list_refuses_signups() {
    let mut server = Server::start("closed_refuses");
    let resp = server.call("tryAdd", json!({ "name": "Ana" }));
    assert_error(&resp, 400, "LIST_CLOSED");
}

#[test]
fn signup_splits_attending_and_waitlist_at_capacity() {
    let mut server = Server::start("capacity_split");
    assert_ok(&server.call("open", json!({})));

    for i in 0..12 {
        let resp = server.call("tryAdd", json!({ "name": format!("Player {i}") }));
        assert_ok(&resp);
        assert_eq!(
            result_of(&resp).get("placement"),
            Some(&json!("ATTENDING")),
            "entrant {i} should attend"
        );
    }

    let resp = server.call("tryAdd", json!({ "name": "Carla" }));
    assert_ok(&resp);
    assert_eq!(result_of(&resp).get("placement"), Some(&json!("WAITLISTED")));

    let roster = server.call("getRoster", json!({}));
    let names = names_of(&roster);
    assert_eq!(names.len(), 13);
    assert_eq!(names.last().map(String::as_str), Some("Carla"));
    assert_eq!(names[0], "Player 0");
}

#[test]
fn duplicate_names_are_rejected_case_insensitively() {
    let mut server = Server::start("duplicate_names");
    assert_ok(&server.call("open", json!({})));
    assert_ok(&server.call("tryAdd", json!({ "name": "Ana" })));

    let resp = server.call("tryAdd", json!({ "name": " ANA " }));
    assert_error(&resp, 400, "DUPLICATE_NAME");

    let names = names_of(&server.call("getRoster", json!({})));
    assert_eq!(names, ["Ana"]);
}

#[test]
fn invalid_names_are_rejected() {
    let mut server = Server::start("invalid_names");
    assert_ok(&server.call("open", json!({})));

    let resp = server.call("tryAdd", json!({ "name": "   " }));
    assert_error(&resp, 400, "INVALID_NAME");

    let resp = server.call("tryAdd", json!({ "name": "x".repeat(31) }));
    assert_error(&resp, 400, "INVALID_NAME");
}

#[test]
fn leaving_and_rejoining_goes_to_the_back() {
    let mut server = Server::start("rejoin_back");
    assert_ok(&server.call("open", json!({})));
    for name in ["Ana", "Bea", "Carla"] {
        assert_ok(&server.call("tryAdd", json!({ "name": name })));
    }

    assert_ok(&server.call("remove", json!({ "name": "ana" })));
    assert_ok(&server.call("tryAdd", json!({ "name": "Ana" })));

    let names = names_of(&server.call("getRoster", json!({})));
    assert_eq!(names, ["Bea", "Carla", "Ana"]);

    let resp = server.call("remove", json!({ "name": "Dora" }));
    assert_error(&resp, 400, "NOT_FOUND");
}

#[test]
fn close_clears_the_roster() {
    let mut server = Server::start("close_clears");
    assert_ok(&server.call("open", json!({})));
    assert_ok(&server.call("tryAdd", json!({ "name": "Ana" })));

    assert_ok(&server.call("close", json!({})));
    let status = server.call("getStatus", json!({}));
    assert_eq!(result_of(&status).get("isOpen"), Some(&json!(false)));
    assert!(names_of(&server.call("getRoster", json!({}))).is_empty());

    // Closing again is a success and leaves the same observable state.
    assert_ok(&server.call("close", json!({})));
    assert_eq!(
        result_of(&server.call("getStatus", json!({}))).get("isOpen"),
        Some(&json!(false))
    );
}

#[test]
fn polling_skips_refetch_until_something_changes() {
    let mut server = Server::start("poll_cursor");
    assert_ok(&server.call("open", json!({})));
    assert_ok(&server.call("tryAdd", json!({ "name": "Ana" })));

    let first = server.call("getStatusWithRoster", json!({}));
    assert_ok(&first);
    assert_eq!(result_of(&first).get("changed"), Some(&json!(true)));
    let cursor = result_of(&first)
        .get("cursor")
        .and_then(|v| v.as_str())
        .expect("cursor stamped after mutations")
        .to_string();
    assert_eq!(names_of(&first), ["Ana"]);

    let unchanged = server.call("getStatusWithRoster", json!({ "lastCursor": cursor }));
    assert_ok(&unchanged);
    assert_eq!(result_of(&unchanged).get("changed"), Some(&json!(false)));
    assert!(names_of(&unchanged).is_empty());

    assert_ok(&server.call("tryAdd", json!({ "name": "Bea" })));
    let moved = server.call("getStatusWithRoster", json!({ "lastCursor": cursor }));
    assert_ok(&moved);
    assert_eq!(result_of(&moved).get("changed"), Some(&json!(true)));
    assert_eq!(names_of(&moved), ["Ana", "Bea"]);
}

#[test]
fn stale_cursor_token_is_a_conflict() {
    let mut server = Server::start("cursor_conflict");
    assert_ok(&server.call("open", json!({})));
    assert_ok(&server.call("tryAdd", json!({ "name": "Ana" })));

    let snapshot = server.call("getStatusWithRoster", json!({}));
    let stale = result_of(&snapshot)
        .get("cursor")
        .and_then(|v| v.as_str())
        .expect("cursor")
        .to_string();

    assert_ok(&server.call("tryAdd", json!({ "name": "Bea" })));

    let resp = server.call("tryAdd", json!({ "name": "Carla", "ifCursor": stale.clone() }));
    assert_error(&resp, 409, "CURSOR_MOVED");
    let resp = server.call("remove", json!({ "name": "Ana", "ifCursor": stale }));
    assert_error(&resp, 409, "CURSOR_MOVED");

    // Nothing was written by the refused calls.
    let names = names_of(&server.call("getRoster", json!({})));
    assert_eq!(names, ["Ana", "Bea"]);

    // A fresh token goes through.
    let snapshot = server.call("getStatusWithRoster", json!({}));
    let current = result_of(&snapshot)
        .get("cursor")
        .and_then(|v| v.as_str())
        .expect("cursor")
        .to_string();
    assert_ok(&server.call("tryAdd", json!({ "name": "Carla", "ifCursor": current })));
}

#[test]
fn roster_survives_a_server_restart() {
    let storage_dir = temp_dir("restart_persistence");
    {
        let mut server = Server::start_with_storage_dir(storage_dir.clone(), &[], false);
        assert_ok(&server.call("open", json!({})));
        assert_ok(&server.call("tryAdd", json!({ "name": "Ana" })));
    }

    let mut server = Server::start_with_storage_dir(storage_dir, &[], true);
    let status = server.call("getStatus", json!({}));
    assert_eq!(result_of(&status).get("isOpen"), Some(&json!(true)));
    assert_eq!(names_of(&server.call("getRoster", json!({}))), ["Ana"]);
}
