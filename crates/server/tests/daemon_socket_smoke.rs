#![forbid(unsafe_code)]
#![cfg(unix)]

mod support;

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

fn wait_for_socket(path: &std::path::Path) -> UnixStream {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(stream) = UnixStream::connect(path) {
            return stream;
        }
        assert!(
            Instant::now() < deadline,
            "daemon socket did not come up at {}",
            path.display()
        );
        std::thread::sleep(Duration::from_millis(25));
    }
}

fn request(stream: &mut UnixStream, reader: &mut BufReader<UnixStream>, req: Value) -> Value {
    writeln!(stream, "{req}").expect("write request");
    stream.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response");
    serde_json::from_str(&line).expect("parse response json")
}

#[test]
fn daemon_serves_connections_over_the_socket() {
    let storage_dir = support::temp_dir("daemon_smoke");
    let socket_path = storage_dir.join("lineup.sock");

    let mut daemon = Command::new(env!("CARGO_BIN_EXE_lu_server"))
        .arg("--daemon")
        .arg("--storage-dir")
        .arg(&storage_dir)
        .arg("--socket")
        .arg(&socket_path)
        .arg("--rate-limit")
        .arg("0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()
        .expect("spawn daemon");

    let mut stream = wait_for_socket(&socket_path);
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

    let resp = request(
        &mut stream,
        &mut reader,
        json!({ "id": 1, "action": "open", "params": {} }),
    );
    assert_eq!(resp.get("status").and_then(|v| v.as_u64()), Some(200));

    let resp = request(
        &mut stream,
        &mut reader,
        json!({ "id": 2, "action": "tryAdd", "params": { "name": "Ana" } }),
    );
    assert_eq!(resp.get("status").and_then(|v| v.as_u64()), Some(200));

    // A second connection sees the same authoritative state.
    let mut other = wait_for_socket(&socket_path);
    let mut other_reader = BufReader::new(other.try_clone().expect("clone stream"));
    let resp = request(
        &mut other,
        &mut other_reader,
        json!({ "id": 1, "action": "getRoster", "params": {} }),
    );
    let names: Vec<&str> = resp
        .get("result")
        .and_then(|r| r.get("names"))
        .and_then(|v| v.as_array())
        .expect("result.names")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(names, ["Ana"]);

    let _ = daemon.kill();
    let _ = daemon.wait();
    let _ = std::fs::remove_dir_all(&storage_dir);
}
