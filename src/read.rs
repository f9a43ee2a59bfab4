use std::io::{self, Read};

use tracing::{debug, info};

use crate::error::Result;
use crate::models::BufferedResponse;
use crate::registry::is_valid_status;
use crate::responder::{ErrorResponder, ResponseContext};
use crate::response::reason_phrase;
use crate::server::Connection;

pub enum ReadProgress {
    /// More bytes are needed before the request head is complete.
    Pending,
    /// A response has been queued on the connection.
    Ready,
    Closed,
}

pub fn handle_read_state(
    conn: &mut Connection,
    responder: &ErrorResponder<'_>,
) -> Result<ReadProgress> {
    let mut buf = [0u8; 1024];

    let parsed = loop {
        match conn.stream.read(&mut buf) {
            Ok(0) => return Ok(ReadProgress::Closed),
            Ok(n) => match conn.request.append(&buf[..n]) {
                Ok(()) if conn.request.done() => break Ok(()),
                Ok(()) => continue,
                Err(reason) => break Err(reason),
            },
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Ok(ReadProgress::Pending);
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };

    let request = match parsed {
        Ok(()) => conn.request.get(),
        Err(_) => None,
    };

    let mut ctx = ResponseContext::new().with_client(&conn.peer.ip().to_string(), "");
    // Malformed requests still report whatever first line arrived.
    match request {
        Some(request) => ctx = ctx.with_request_line(&request.request_line),
        None => {
            if let Some(line) = conn.request.first_line() {
                ctx = ctx.with_request_line(&line);
            }
        }
    }

    match request {
        Some(request) => match preview_code(&request.path) {
            Some(code) => responder.record_error(
                &mut ctx,
                code,
                reason_phrase(code),
                &[("url", request.path.as_str())],
            )?,
            None => responder.record_error(
                &mut ctx,
                404,
                reason_phrase(404),
                &[("url", request.path.as_str()), ("method", request.method.as_str())],
            )?,
        },
        None => {
            let reason = parsed.err().unwrap_or("Invalid request line");
            debug!(peer = %conn.peer, reason, "rejecting malformed request");
            responder.record_error(&mut ctx, 400, reason_phrase(400), &[("detail", reason)])?
        }
    }

    let mut body = Vec::new();
    responder.send_error_response(&mut ctx, &mut body)?;
    if let Some(error) = ctx.error() {
        info!(peer = %conn.peer, code = error.code, bytes = body.len(), "queued error response");
    }

    conn.response = Some(BufferedResponse::new(body));
    Ok(ReadProgress::Ready)
}

/// `/503` previews the page configured for 503.
fn preview_code(path: &str) -> Option<u16> {
    let digits = path.strip_prefix('/')?;
    if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&code| is_valid_status(code))
}
