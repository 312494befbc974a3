#![forbid(unsafe_code)]

mod client;
mod render;

use client::{ListClient, SnapshotView, envelope_error};
use lu_core::names::canonical_form;
use lu_core::roster::CAPACITY;
use render::render_snapshot;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

const POLL_MS: u64 = 5_000;
const POLL_SLOW_MS: u64 = 15_000;
const COOLDOWN_MS: u64 = 30_000;
const JOIN_RETRY_LIMIT: u32 = 3;

#[derive(Debug)]
struct PollerConfig {
    storage_dir: PathBuf,
    server_bin: String,
    #[cfg(unix)]
    socket: Option<PathBuf>,
    name: Option<String>,
    passphrase: Option<String>,
    once: bool,
}

fn usage() -> &'static str {
    "lu_poller — signup-list client\n\n\
USAGE:\n\
  lu_poller [COMMAND] [ARGS] [--storage-dir DIR] [--server-bin PATH]\n\
            [--connect SOCKET] [--name NAME] [--pass PASS] [--once]\n\n\
COMMANDS:\n\
  watch            poll for changes and re-render on each one (default)\n\
  status           print whether the list is open\n\
  roster           print the current attending/waitlist split\n\
  join NAME        sign NAME up\n\
  leave NAME       take NAME off the list\n\
  open             open the signup window (passphrase via --pass)\n\
  close            close the window and clear the list\n\n\
NOTES:\n\
  - by default a private lu_server is spawned over stdio against\n\
    --storage-dir; `--connect` talks to a running --daemon socket instead.\n\
  - `watch --name NAME` polls slower once NAME is on the roster and backs\n\
    off further when the server asks for a cooldown.\n"
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

fn positional_args() -> Vec<String> {
    const VALUE_FLAGS: [&str; 5] = ["--storage-dir", "--server-bin", "--connect", "--name", "--pass"];
    let mut out = Vec::new();
    let mut skip = false;
    for arg in std::env::args().skip(1) {
        if skip {
            skip = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip = true;
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        out.push(arg);
    }
    out
}

fn parse_config() -> PollerConfig {
    PollerConfig {
        storage_dir: arg_value("--storage-dir")
            .or_else(|| env_var("LINEUP_STORAGE_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".lineup")),
        server_bin: arg_value("--server-bin")
            .or_else(|| env_var("LINEUP_SERVER_BIN"))
            .unwrap_or_else(|| "lu_server".to_string()),
        #[cfg(unix)]
        socket: arg_value("--connect").map(PathBuf::from),
        name: arg_value("--name"),
        passphrase: arg_value("--pass").or_else(|| env_var("LINEUP_ADMIN_PASS")),
        once: has_flag("--once"),
    }
}

fn build_client(config: &PollerConfig) -> Result<ListClient, String> {
    #[cfg(unix)]
    if let Some(socket) = &config.socket {
        return ListClient::connect(socket);
    }
    ListClient::spawn(&config.server_bin, &config.storage_dir)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    if has_flag("--help") || has_flag("-h") {
        print!("{}", usage());
        return Ok(());
    }

    let config = parse_config();
    let positional = positional_args();
    let command = positional
        .first()
        .map(String::as_str)
        .unwrap_or("watch");
    let name_arg = positional.get(1).cloned().or_else(|| config.name.clone());

    let mut client = build_client(&config)?;

    match command {
        "watch" => run_watch(&mut client, &config),
        "status" => run_status(&mut client),
        "roster" => run_roster(&mut client),
        "join" => {
            let name = name_arg.ok_or("join requires a name")?;
            run_join(&mut client, &name)
        }
        "leave" => {
            let name = name_arg.ok_or("leave requires a name")?;
            run_leave(&mut client, &name)
        }
        "open" => run_admin(&mut client, "open", config.passphrase.as_deref()),
        "close" => run_admin(&mut client, "close", config.passphrase.as_deref()),
        other => Err(format!("unknown command: {other}\n\n{}", usage())),
    }
}

enum PollFailure {
    Transport(String),
    RateLimited(i64),
}

fn poll_once(client: &mut ListClient, last_cursor: Option<&str>) -> Result<SnapshotView, PollFailure> {
    let params = match last_cursor {
        Some(cursor) => json!({ "lastCursor": cursor }),
        None => json!({}),
    };
    let resp = client
        .call("getStatusWithRoster", params)
        .map_err(PollFailure::Transport)?;
    if let Some(err) = envelope_error(&resp) {
        if err.code == "RATE_LIMITED" {
            return Err(PollFailure::RateLimited(err.retry_after_ms.unwrap_or(0)));
        }
        return Err(PollFailure::Transport(err.to_string()));
    }
    let result = resp.get("result").cloned().unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|e| PollFailure::Transport(format!("bad snapshot payload: {e}")))
}

fn run_watch(client: &mut ListClient, config: &PollerConfig) -> Result<(), String> {
    let mut last_cursor: Option<String> = None;
    let mut shadow: Vec<String> = Vec::new();

    // One request in flight at a time: each tick completes (or fails soft)
    // before the next one is scheduled.
    loop {
        let mut rate_limited: Option<i64> = None;
        match poll_once(client, last_cursor.as_deref()) {
            Ok(snapshot) => {
                if snapshot.changed {
                    last_cursor = snapshot.cursor.clone();
                    shadow = snapshot.names.clone();
                    print!("{}", render_snapshot(&snapshot, CAPACITY));
                }
            }
            Err(PollFailure::RateLimited(hint)) => {
                eprintln!("rate limited; cooling down");
                rate_limited = Some(hint);
            }
            Err(PollFailure::Transport(message)) => {
                // Stale view is fine; the next successful poll self-heals.
                eprintln!("poll failed: {message}");
            }
        }

        if config.once {
            return Ok(());
        }
        let on_roster = watcher_on_roster(config.name.as_deref(), &shadow);
        sleep(Duration::from_millis(next_interval_ms(
            on_roster,
            rate_limited,
        )));
    }
}

fn watcher_on_roster(name: Option<&str>, shadow: &[String]) -> bool {
    let Some(name) = name else {
        return false;
    };
    let needle = canonical_form(name);
    shadow.iter().any(|entry| canonical_form(entry) == needle)
}

fn next_interval_ms(on_roster: bool, rate_limited: Option<i64>) -> u64 {
    if let Some(hint) = rate_limited {
        // Cooldown window: at least the server's hint, never shorter than
        // the fixed backoff interval.
        return (hint.max(0) as u64).max(COOLDOWN_MS);
    }
    if on_roster { POLL_SLOW_MS } else { POLL_MS }
}

fn run_status(client: &mut ListClient) -> Result<(), String> {
    let result = client.call_ok("getStatus", json!({}))?;
    let is_open = result.get("isOpen").and_then(|v| v.as_bool()).unwrap_or(false);
    println!("list is {}", if is_open { "OPEN" } else { "CLOSED" });
    Ok(())
}

fn run_roster(client: &mut ListClient) -> Result<(), String> {
    let result = client.call_ok("getStatusWithRoster", json!({}))?;
    let snapshot: SnapshotView = serde_json::from_value(result)
        .map_err(|e| format!("bad snapshot payload: {e}"))?;
    print!("{}", render_snapshot(&snapshot, CAPACITY));
    Ok(())
}

/// Mutations carry the cursor they were read against; when the list moved
/// underneath, re-read and try again a bounded number of times.
fn run_join(client: &mut ListClient, name: &str) -> Result<(), String> {
    for _ in 0..JOIN_RETRY_LIMIT {
        let cursor = read_cursor(client)?;
        let params = match &cursor {
            Some(cursor) => json!({ "name": name, "ifCursor": cursor }),
            None => json!({ "name": name }),
        };
        let resp = client.call("tryAdd", params)?;
        match envelope_error(&resp) {
            None => {
                let placement = resp
                    .get("result")
                    .and_then(|r| r.get("placement"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                if placement == "WAITLISTED" {
                    println!("{name} is on the waitlist");
                } else {
                    println!("{name} is attending");
                }
                return Ok(());
            }
            Some(err) if err.code == "CURSOR_MOVED" => continue,
            Some(err) => return Err(format!("join failed: {err}")),
        }
    }
    Err("the list kept changing; try again".to_string())
}

fn run_leave(client: &mut ListClient, name: &str) -> Result<(), String> {
    for _ in 0..JOIN_RETRY_LIMIT {
        let cursor = read_cursor(client)?;
        let params = match &cursor {
            Some(cursor) => json!({ "name": name, "ifCursor": cursor }),
            None => json!({ "name": name }),
        };
        let resp = client.call("remove", params)?;
        match envelope_error(&resp) {
            None => {
                println!("{name} left the list");
                return Ok(());
            }
            Some(err) if err.code == "CURSOR_MOVED" => continue,
            Some(err) => return Err(format!("leave failed: {err}")),
        }
    }
    Err("the list kept changing; try again".to_string())
}

fn read_cursor(client: &mut ListClient) -> Result<Option<String>, String> {
    let result = client.call_ok("getStatusWithRoster", json!({}))?;
    Ok(result
        .get("cursor")
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

fn run_admin(client: &mut ListClient, action: &str, passphrase: Option<&str>) -> Result<(), String> {
    let params = match passphrase {
        Some(passphrase) => json!({ "passphrase": passphrase }),
        None => json!({}),
    };
    client.call_ok(action, params)?;
    println!(
        "{}",
        if action == "open" {
            "signup window opened"
        } else {
            "signup window closed"
        }
    );
    Ok(())
}
