#![forbid(unsafe_code)]

mod entry;
mod gate;
mod handlers;
mod ratelimit;
mod reconciler;
mod support;

pub(crate) use gate::AdminGate;
pub(crate) use ratelimit::RateLimiter;
pub(crate) use support::*;

use lu_sheet::{SheetError, SqliteSheet};
use reconciler::Reconciler;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const DEFAULT_RATE_LIMIT: u32 = 30;
const DEFAULT_RATE_WINDOW_MS: i64 = 10_000;

pub(crate) struct ListServer {
    reconciler: Reconciler<SqliteSheet>,
    gate: AdminGate,
    limiter: RateLimiter,
}

impl ListServer {
    pub(crate) fn new(
        storage_dir: &Path,
        admin_pass: Option<&str>,
        rate_limit: u32,
        rate_window_ms: i64,
    ) -> Result<Self, SheetError> {
        let sheet = SqliteSheet::open(storage_dir)?;
        Ok(Self {
            reconciler: Reconciler::new(sheet),
            gate: AdminGate::from_passphrase(admin_pass),
            limiter: RateLimiter::new(rate_limit, rate_window_ms),
        })
    }

    pub(crate) fn gate_enabled(&self) -> bool {
        self.gate.is_enabled()
    }
}

fn write_last_crash(storage_dir: &Path, kind: &str, detail: &str) {
    // Best-effort crash report; never log request bodies.
    let _ = std::fs::create_dir_all(storage_dir);
    let path = storage_dir.join("lineup_last_crash.txt");

    let mut out = String::new();
    let _ = writeln!(out, "ts={}", now_rfc3339());
    let _ = writeln!(out, "pid={}", std::process::id());
    let _ = writeln!(out, "kind={kind}");
    let _ = writeln!(out, "build={}", build_fingerprint());
    let _ = writeln!(out, "args={:?}", std::env::args().collect::<Vec<_>>());
    let _ = writeln!(out, "detail={detail}");

    let _ = std::fs::write(path, out);
}

fn install_crash_reporter(storage_dir: PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let mut detail = info.to_string();
        let backtrace = std::backtrace::Backtrace::force_capture();
        let _ = write!(&mut detail, "\nbacktrace:\n{backtrace}");
        write_last_crash(&storage_dir, "panic", &detail);
        default_hook(info);
    }));
}

fn usage() -> &'static str {
    "lu_server — signup-list coordinator over a tabular store\n\n\
USAGE:\n\
  lu_server [--storage-dir DIR] [--admin-pass PASS]\n\
            [--rate-limit N] [--rate-window-ms MS]\n\
            [--daemon] [--socket PATH]\n\n\
NOTES:\n\
  - default mode serves one client on stdin/stdout (newline JSON or\n\
    Content-Length frames, auto-detected from the first line).\n\
  - `--daemon` (unix) listens on a socket under the storage dir instead;\n\
    each connection gets its own store handle and rate-limit budget.\n\
  - `--admin-pass` (or LINEUP_ADMIN_PASS) gates the open/close actions;\n\
    without it the gate is disabled for local single-admin use.\n\
  - `--rate-limit 0` disables the per-connection request budget.\n"
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn arg_value(name: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|arg| arg == name)
        .and_then(|i| args.get(i + 1))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn has_flag(name: &str) -> bool {
    std::env::args().any(|arg| arg == name)
}

fn parse_storage_dir() -> PathBuf {
    arg_value("--storage-dir")
        .or_else(|| env_var("LINEUP_STORAGE_DIR"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".lineup"))
}

fn parse_admin_pass() -> Option<String> {
    arg_value("--admin-pass").or_else(|| env_var("LINEUP_ADMIN_PASS"))
}

fn parse_rate_limit() -> u32 {
    arg_value("--rate-limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT)
}

fn parse_rate_window_ms() -> i64 {
    arg_value("--rate-window-ms")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RATE_WINDOW_MS)
}

#[cfg(unix)]
fn parse_socket_path(storage_dir: &Path) -> PathBuf {
    arg_value("--socket")
        .map(PathBuf::from)
        .unwrap_or_else(|| storage_dir.join("lineup.sock"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if has_flag("--help") || has_flag("-h") {
        print!("{}", usage());
        return Ok(());
    }
    if has_flag("--version") {
        println!("lu_server {}", build_fingerprint());
        return Ok(());
    }

    let storage_dir = parse_storage_dir();
    let storage_dir_for_errors = storage_dir.clone();
    install_crash_reporter(storage_dir.clone());

    let admin_pass = parse_admin_pass();
    let rate_limit = parse_rate_limit();
    let rate_window_ms = parse_rate_window_ms();

    if has_flag("--daemon") {
        #[cfg(unix)]
        {
            let config = entry::DaemonConfig {
                socket_path: parse_socket_path(&storage_dir),
                storage_dir,
                admin_pass,
                rate_limit,
                rate_window_ms,
            };
            let result = entry::run_socket_daemon(config);
            if let Err(err) = &result {
                write_last_crash(&storage_dir_for_errors, "error", &format!("{err:?}"));
            }
            return result;
        }

        #[cfg(not(unix))]
        {
            return Err("daemon mode is only supported on unix targets".into());
        }
    }

    let mut session = SessionLog::new(&storage_dir);
    let mut server = ListServer::new(
        &storage_dir,
        admin_pass.as_deref(),
        rate_limit,
        rate_window_ms,
    )?;
    session.note_gate(server.gate_enabled());

    let result = entry::run_stdio(&mut server, &mut session);
    if let Err(err) = &result {
        session.note_exit("transport error");
        write_last_crash(&storage_dir_for_errors, "error", &format!("{err:?}"));
    }
    result
}
