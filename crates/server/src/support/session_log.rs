#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

/// Best-effort session record in the storage dir. Overwritten in place on
/// every note so the file always reflects the latest state even if the
/// process dies without unwinding.
#[derive(Clone, Debug)]
pub(crate) struct SessionLog {
    path: PathBuf,
    start_rfc3339: String,
    pid: u32,
    build: String,
    args: Vec<String>,
    mode: Option<String>,
    gate_enabled: Option<bool>,
    last_action: Option<String>,
    last_error: Option<String>,
    exit: Option<String>,
}

impl SessionLog {
    pub(crate) fn new(storage_dir: &Path) -> Self {
        // Daemon-side records go to a dedicated file so a connection log
        // cannot overwrite the stdio-facing record right before a
        // transport failure that needs diagnosing.
        let args: Vec<String> = std::env::args().collect();
        let is_daemon = args.iter().any(|arg| arg.as_str() == "--daemon");
        let path = if is_daemon {
            storage_dir.join("lineup_last_session_daemon.txt")
        } else {
            storage_dir.join("lineup_last_session.txt")
        };
        let this = Self {
            path,
            start_rfc3339: crate::now_rfc3339(),
            pid: std::process::id(),
            build: crate::build_fingerprint(),
            args,
            mode: None,
            gate_enabled: None,
            last_action: None,
            last_error: None,
            exit: None,
        };
        this.flush();
        this
    }

    pub(crate) fn note_mode(&mut self, mode: &str) {
        self.mode = Some(mode.to_string());
        self.flush();
    }

    pub(crate) fn note_gate(&mut self, enabled: bool) {
        self.gate_enabled = Some(enabled);
        self.flush();
    }

    pub(crate) fn note_action(&mut self, action: &str) {
        let action = action.trim();
        if action.is_empty() {
            return;
        }
        self.last_action = Some(truncate(action, 96));
        self.flush();
    }

    pub(crate) fn note_error(&mut self, error: &str) {
        let error = error.trim();
        if error.is_empty() {
            return;
        }
        self.last_error = Some(truncate(error, 300));
        self.flush();
    }

    pub(crate) fn note_exit(&mut self, reason: &str) {
        self.exit = Some(truncate(reason.trim(), 120));
        self.flush();
    }

    fn flush(&self) {
        use std::fmt::Write as _;

        let mut out = String::new();
        let _ = writeln!(out, "start={}", self.start_rfc3339);
        let _ = writeln!(out, "pid={}", self.pid);
        let _ = writeln!(out, "build={}", self.build);
        let _ = writeln!(out, "args={:?}", self.args);
        if let Some(mode) = &self.mode {
            let _ = writeln!(out, "mode={mode}");
        }
        if let Some(gate_enabled) = self.gate_enabled {
            let _ = writeln!(out, "gate_enabled={gate_enabled}");
        }
        if let Some(last_action) = &self.last_action {
            let _ = writeln!(out, "last_action={last_action}");
        }
        if let Some(last_error) = &self.last_error {
            let _ = writeln!(out, "last_error={last_error}");
        }
        if let Some(exit) = &self.exit {
            let _ = writeln!(out, "exit={exit}");
        }

        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::write(&self.path, out);
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    value.chars().take(max).collect()
}
