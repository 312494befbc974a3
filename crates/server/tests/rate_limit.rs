#![forbid(unsafe_code)]

mod support;
use support::*;

use serde_json::json;

#[test]
fn over_budget_requests_get_a_backoff_hint() {
    let mut server = Server::start_with_args(
        "rate_limited",
        &["--rate-limit", "3", "--rate-window-ms", "60000"],
    );

    for _ in 0..3 {
        assert_ok(&server.call("getStatus", json!({})));
    }

    let resp = server.call("getStatus", json!({}));
    assert_error(&resp, 429, "RATE_LIMITED");
    let retry_after = resp
        .get("error")
        .and_then(|e| e.get("retryAfterMs"))
        .and_then(|v| v.as_i64())
        .expect("error.retryAfterMs");
    assert!(retry_after > 0);
    assert!(retry_after <= 60_000);
}
