#![forbid(unsafe_code)]

use crate::entry::framing::{
    TransportMode, parse_request, read_content_length_frame, sniff_transport, write_response,
};
use crate::{ListServer, SessionLog, attach_id, err_body};
use serde_json::Value;
use std::io::{BufRead, BufReader};

pub(crate) fn run_stdio(
    server: &mut ListServer,
    session: &mut SessionLog,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut stdout = std::io::stdout().lock();

    let mut mode: Option<TransportMode> = None;

    loop {
        match mode {
            None => {
                let mut first = String::new();
                let read = reader.read_line(&mut first)?;
                if read == 0 {
                    session.note_exit("stdin closed");
                    return Ok(());
                }
                let Some(detected) = sniff_transport(&first) else {
                    if first.trim().is_empty() {
                        continue;
                    }
                    let resp = attach_id(
                        err_body(400, "PARSE_ERROR", "could not detect request framing"),
                        None,
                    );
                    write_response(&mut stdout, TransportMode::NewlineJson, &resp)?;
                    continue;
                };
                mode = Some(detected);
                session.note_mode(match detected {
                    TransportMode::NewlineJson => "stdio/newline-json",
                    TransportMode::ContentLength => "stdio/content-length",
                });
                match detected {
                    TransportMode::NewlineJson => {
                        let resp = process(server, session, first.as_bytes());
                        write_response(&mut stdout, detected, &resp)?;
                    }
                    TransportMode::ContentLength => {
                        let Some(body) = read_content_length_frame(&mut reader, Some(first))?
                        else {
                            session.note_exit("stdin closed");
                            return Ok(());
                        };
                        let resp = process(server, session, &body);
                        write_response(&mut stdout, detected, &resp)?;
                    }
                }
            }
            Some(TransportMode::NewlineJson) => {
                let mut line = String::new();
                let read = reader.read_line(&mut line)?;
                if read == 0 {
                    session.note_exit("stdin closed");
                    return Ok(());
                }
                if line.trim().is_empty() {
                    continue;
                }
                let resp = process(server, session, line.as_bytes());
                write_response(&mut stdout, TransportMode::NewlineJson, &resp)?;
            }
            Some(TransportMode::ContentLength) => {
                let Some(body) = read_content_length_frame(&mut reader, None)? else {
                    session.note_exit("stdin closed");
                    return Ok(());
                };
                let resp = process(server, session, &body);
                write_response(&mut stdout, TransportMode::ContentLength, &resp)?;
            }
        }
    }
}

pub(crate) fn process(server: &mut ListServer, session: &mut SessionLog, raw: &[u8]) -> Value {
    let request = match parse_request(raw) {
        Ok(request) => request,
        Err(resp) => {
            session.note_error("parse error");
            return resp;
        }
    };
    session.note_action(&request.action);

    let resp = server.handle(request);
    if let Some(code) = resp
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
    {
        session.note_error(code);
    }
    resp
}
