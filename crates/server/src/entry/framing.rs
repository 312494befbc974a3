#![forbid(unsafe_code)]

use crate::{Request, attach_id, err_body};
use serde_json::Value;
use std::io::{BufRead, Write};

/// Upper bound on a framed request body. Roster payloads are tiny; anything
/// bigger than this is a confused client, not a signup.
const MAX_FRAME_BYTES: usize = 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TransportMode {
    NewlineJson,
    ContentLength,
}

fn split_header(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    Some((name.trim(), value.trim()))
}

/// `Content-Length` value of a header line, when the line is one.
pub(crate) fn content_length_of(line: &str) -> Option<usize> {
    let (name, value) = split_header(line.trim_end())?;
    if !name.eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.parse::<usize>().ok()
}

/// Sniff the framing from the first line a client sends: a JSON payload
/// means newline-delimited JSON, a plausible header line means
/// Content-Length frames. The choice is made once per transport; responses
/// use the same framing so the two styles never interleave.
pub(crate) fn sniff_transport(first_line: &str) -> Option<TransportMode> {
    let trimmed = first_line.trim();
    match trimmed.chars().next() {
        None => None,
        Some('{' | '[') => Some(TransportMode::NewlineJson),
        Some(_) => match split_header(trimmed) {
            Some((name, _))
                if name.eq_ignore_ascii_case("content-length")
                    || name.eq_ignore_ascii_case("content-type") =>
            {
                Some(TransportMode::ContentLength)
            }
            _ => None,
        },
    }
}

/// Read one frame: a header block, a blank line, then exactly the announced
/// number of body bytes. `seed_header` is the line the transport sniffer
/// already consumed. `Ok(None)` means the peer went away, blank-line-clean
/// or mid-headers alike.
pub(crate) fn read_content_length_frame<R: BufRead>(
    reader: &mut R,
    seed_header: Option<String>,
) -> std::io::Result<Option<Vec<u8>>> {
    let mut length: Option<usize> = None;
    let mut line = seed_header.unwrap_or_default();

    loop {
        if line.is_empty() && reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.trim_end().is_empty() {
            break;
        }
        length = length.or_else(|| content_length_of(&line));
        line.clear();
    }

    let Some(len) = length else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "frame headers carry no Content-Length",
        ));
    };
    if len > MAX_FRAME_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "frame body exceeds the size cap",
        ));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(Some(body))
}

pub(crate) fn write_response<W: Write>(
    out: &mut W,
    mode: TransportMode,
    resp: &Value,
) -> std::io::Result<()> {
    match mode {
        TransportMode::NewlineJson => {
            writeln!(out, "{resp}")?;
        }
        TransportMode::ContentLength => {
            let body = resp.to_string();
            write!(out, "Content-Length: {}\r\n\r\n{}", body.len(), body)?;
        }
    }
    out.flush()
}

pub(crate) fn parse_request(raw: &[u8]) -> Result<Request, Value> {
    match serde_json::from_slice::<Request>(raw) {
        Ok(request) => Ok(request),
        Err(err) => Err(attach_id(
            err_body(400, "PARSE_ERROR", &format!("invalid request: {err}")),
            None,
        )),
    }
}
