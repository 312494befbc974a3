#![forbid(unsafe_code)]

use serde::Deserialize;
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// Parsed `getStatusWithRoster` result. When `changed` is false the server
/// omits the roster and the caller keeps its previous copy.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SnapshotView {
    #[serde(rename = "isOpen")]
    pub(crate) is_open: bool,
    #[serde(default)]
    pub(crate) cursor: Option<String>,
    pub(crate) changed: bool,
    #[serde(default)]
    pub(crate) names: Vec<String>,
}

/// Service-level refusal extracted from a response envelope.
#[derive(Clone, Debug)]
pub(crate) struct ServiceError {
    pub(crate) status: u16,
    pub(crate) code: String,
    pub(crate) message: String,
    pub(crate) retry_after_ms: Option<i64>,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.message, self.status, self.code)
    }
}

pub(crate) fn envelope_error(resp: &Value) -> Option<ServiceError> {
    if resp.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        return None;
    }
    let error = resp.get("error")?;
    Some(ServiceError {
        status: resp.get("status").and_then(|v| v.as_u64()).unwrap_or(500) as u16,
        code: error
            .get("code")
            .and_then(|v| v.as_str())
            .unwrap_or("UNKNOWN")
            .to_string(),
        message: error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("request failed")
            .to_string(),
        retry_after_ms: error.get("retryAfterMs").and_then(|v| v.as_i64()),
    })
}

enum Transport {
    Child {
        child: Child,
        stdin: ChildStdin,
        stdout: BufReader<ChildStdout>,
    },
    #[cfg(unix)]
    Socket {
        reader: BufReader<std::os::unix::net::UnixStream>,
        writer: std::os::unix::net::UnixStream,
    },
}

pub(crate) struct ListClient {
    transport: Transport,
    next_id: i64,
}

impl ListClient {
    /// Spawn a private server over stdio against the given storage dir.
    pub(crate) fn spawn(server_bin: &str, storage_dir: &Path) -> Result<Self, String> {
        let mut child = Command::new(server_bin)
            .arg("--storage-dir")
            .arg(storage_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to spawn lu_server ({server_bin}): {e}"))?;

        let stdin = child.stdin.take().ok_or("lu_server stdin unavailable")?;
        let stdout = BufReader::new(child.stdout.take().ok_or("lu_server stdout unavailable")?);

        Ok(Self {
            transport: Transport::Child {
                child,
                stdin,
                stdout,
            },
            next_id: 1,
        })
    }

    /// Connect to a running `--daemon` server on its unix socket.
    #[cfg(unix)]
    pub(crate) fn connect(socket_path: &Path) -> Result<Self, String> {
        use std::os::unix::net::UnixStream;
        use std::time::Duration;

        let writer = UnixStream::connect(socket_path)
            .map_err(|e| format!("failed to connect to {}: {e}", socket_path.display()))?;
        // Boundary calls carry a bounded timeout; a hung read surfaces as a
        // soft failure that the watch loop retries next tick.
        let _ = writer.set_read_timeout(Some(Duration::from_secs(5)));
        let reader = BufReader::new(
            writer
                .try_clone()
                .map_err(|e| format!("failed to clone socket: {e}"))?,
        );
        Ok(Self {
            transport: Transport::Socket { reader, writer },
            next_id: 1,
        })
    }

    fn send(&mut self, req: Value) -> Result<(), String> {
        match &mut self.transport {
            Transport::Child { stdin, .. } => {
                writeln!(stdin, "{req}").map_err(|e| format!("write request failed: {e}"))?;
                stdin.flush().map_err(|e| format!("flush failed: {e}"))
            }
            #[cfg(unix)]
            Transport::Socket { writer, .. } => {
                writeln!(writer, "{req}").map_err(|e| format!("write request failed: {e}"))?;
                writer.flush().map_err(|e| format!("flush failed: {e}"))
            }
        }
    }

    fn recv(&mut self) -> Result<Value, String> {
        let mut line = String::new();
        let read = match &mut self.transport {
            Transport::Child { stdout, .. } => stdout.read_line(&mut line),
            #[cfg(unix)]
            Transport::Socket { reader, .. } => reader.read_line(&mut line),
        };
        read.map_err(|e| format!("read response failed: {e}"))?;
        if line.trim().is_empty() {
            return Err("empty response line from lu_server".to_string());
        }
        serde_json::from_str(&line).map_err(|e| format!("parse response json failed: {e}"))
    }

    /// One action round trip. Transport failures are `Err`; service-level
    /// refusals come back as a normal envelope for the caller to inspect.
    pub(crate) fn call(&mut self, action: &str, params: Value) -> Result<Value, String> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({ "id": id, "action": action, "params": params }))?;
        let resp = self.recv()?;
        let echoed = resp.get("id").and_then(|v| v.as_i64());
        if echoed != Some(id) {
            return Err(format!(
                "response id mismatch (sent {id}, got {echoed:?})"
            ));
        }
        Ok(resp)
    }

    /// Like [`call`], but unwraps the `result` payload and turns envelope
    /// errors into messages.
    ///
    /// [`call`]: Self::call
    pub(crate) fn call_ok(&mut self, action: &str, params: Value) -> Result<Value, String> {
        let resp = self.call(action, params)?;
        if let Some(err) = envelope_error(&resp) {
            return Err(format!("{action} failed: {err}"));
        }
        Ok(resp.get("result").cloned().unwrap_or(Value::Null))
    }
}

impl Drop for ListClient {
    fn drop(&mut self) {
        if let Transport::Child { child, .. } = &mut self.transport {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
