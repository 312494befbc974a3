#![forbid(unsafe_code)]

use crate::entry::stdio::process;
use crate::{ListServer, SessionLog};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Clone)]
pub(crate) struct DaemonConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) socket_path: PathBuf,
    pub(crate) admin_pass: Option<String>,
    pub(crate) rate_limit: u32,
    pub(crate) rate_window_ms: i64,
}

pub(crate) fn run_socket_daemon(config: DaemonConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Another live daemon on the same socket wins; this process just yields.
    if UnixStream::connect(&config.socket_path).is_ok() {
        return Ok(());
    }

    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    let listener = match UnixListener::bind(&config.socket_path) {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            if UnixStream::connect(&config.socket_path).is_ok() {
                return Ok(());
            }
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    let _ = listener.set_nonblocking(true);

    let mut session = SessionLog::new(&config.storage_dir);
    session.note_mode("socket-daemon");

    let config = Arc::new(config);

    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                let config = Arc::clone(&config);
                thread::spawn(move || {
                    let _ = handle_connection(stream, config);
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(_) => continue,
        }
    }
}

fn handle_connection(
    stream: UnixStream,
    config: Arc<DaemonConfig>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    // Connections share nothing in memory. Each one opens its own store
    // handle and re-derives truth per request; the rate limiter budget is
    // per-connection as well.
    let mut session = SessionLog::new(&config.storage_dir);
    session.note_mode("socket-connection");
    let mut server = ListServer::new(
        &config.storage_dir,
        config.admin_pass.as_deref(),
        config.rate_limit,
        config.rate_window_ms,
    )?;
    session.note_gate(server.gate_enabled());

    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            session.note_exit("connection closed");
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }
        let resp = process(&mut server, &mut session, line.as_bytes());
        writeln!(writer, "{resp}")?;
        writer.flush()?;
    }
}
