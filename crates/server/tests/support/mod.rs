#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::Value;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub(crate) struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    storage_dir: PathBuf,
    cleanup_storage: bool,
    next_id: i64,
}

impl Server {
    pub(crate) fn start(test_name: &str) -> Self {
        Self::start_with_args(test_name, &[])
    }

    pub(crate) fn start_with_args(test_name: &str, extra_args: &[&str]) -> Self {
        Self::start_with_storage_dir(temp_dir(test_name), extra_args, true)
    }

    pub(crate) fn start_with_storage_dir(
        storage_dir: PathBuf,
        extra_args: &[&str],
        cleanup_storage: bool,
    ) -> Self {
        std::fs::create_dir_all(&storage_dir).expect("create storage dir");
        // Unlimited requests unless a test opts into the limiter.
        let has_rate_limit = extra_args.iter().any(|arg| arg.trim() == "--rate-limit");
        let default_rate_limit: &[&str] = if has_rate_limit {
            &[]
        } else {
            &["--rate-limit", "0"]
        };
        let mut child = Command::new(env!("CARGO_BIN_EXE_lu_server"))
            .env_remove("LINEUP_ADMIN_PASS")
            .env_remove("LINEUP_STORAGE_DIR")
            .arg("--storage-dir")
            .arg(&storage_dir)
            .args(default_rate_limit)
            .args(extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .expect("spawn lu_server");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));

        Self {
            child,
            stdin,
            stdout,
            storage_dir,
            cleanup_storage,
            next_id: 1,
        }
    }

    pub(crate) fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    pub(crate) fn send(&mut self, req: Value) {
        writeln!(self.stdin, "{req}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn send_raw(&mut self, line: &str) {
        writeln!(self.stdin, "{line}").expect("write raw line");
        self.stdin.flush().expect("flush raw line");
    }

    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    pub(crate) fn request(&mut self, req: Value) -> Value {
        self.send(req);
        self.recv()
    }

    /// Issue one action and assert the response echoes the request id.
    pub(crate) fn call(&mut self, action: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let resp = self.request(json!({ "id": id, "action": action, "params": params }));
        assert_eq!(
            resp.get("id").and_then(|v| v.as_i64()),
            Some(id),
            "response must echo the request id"
        );
        resp
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if self.cleanup_storage {
            let _ = std::fs::remove_dir_all(&self.storage_dir);
        }
    }
}

pub(crate) fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("lu_server_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub(crate) fn assert_ok(resp: &Value) {
    assert_eq!(
        resp.get("status").and_then(|v| v.as_u64()),
        Some(200),
        "expected 200, got: {resp}"
    );
    assert_eq!(resp.get("ok"), Some(&json!(true)));
}

pub(crate) fn assert_error(resp: &Value, status: u64, code: &str) {
    assert_eq!(
        resp.get("status").and_then(|v| v.as_u64()),
        Some(status),
        "expected {status}, got: {resp}"
    );
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|c| c.as_str()),
        Some(code),
        "expected {code}, got: {resp}"
    );
}

pub(crate) fn result_of(resp: &Value) -> &Value {
    resp.get("result").expect("result")
}

pub(crate) fn names_of(resp: &Value) -> Vec<String> {
    result_of(resp)
        .get("names")
        .and_then(|v| v.as_array())
        .expect("result.names")
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}
