use std::io::{self, Write};
use std::net::Shutdown;

use tracing::debug;

use crate::server::Connection;

pub enum WriteProgress {
    Pending,
    Finished,
}

/// Drains the queued response. The connection is shut down once the last
/// byte is out, since every error response carries `Connection: close`.
pub fn handle_write_state(conn: &mut Connection) -> io::Result<WriteProgress> {
    let Some(response) = conn.response.as_mut() else {
        return Ok(WriteProgress::Pending);
    };

    while !response.is_finished() {
        match conn.stream.write(response.peek()) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => response.next(n),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Ok(WriteProgress::Pending);
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    debug!(peer = %conn.peer, "response sent, closing connection");
    let _ = conn.stream.shutdown(Shutdown::Both);
    Ok(WriteProgress::Finished)
}
