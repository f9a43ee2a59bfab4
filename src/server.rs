use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::BufferedResponse;
use crate::read::{ReadProgress, handle_read_state};
use crate::request::HttpRequestBuilder;
use crate::responder::ErrorResponder;
use crate::write::{WriteProgress, handle_write_state};

const SERVER_TOKEN: Token = Token(0);

pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub request: HttpRequestBuilder,
    pub response: Option<BufferedResponse>,
}

pub struct Server {
    poll: Poll,
    events: Events,
    connections: HashMap<Token, Connection>,
    next_token: usize,
}

impl Server {
    pub fn new() -> io::Result<Self> {
        Ok(Server {
            poll: Poll::new()?,
            events: Events::with_capacity(1024),
            connections: HashMap::new(),
            next_token: 1, // Start tokens for connections from 1
        })
    }

    /// Answers every request on `config.listen` with an error page.
    pub fn run(&mut self, config: &Config) -> Result<()> {
        let registry = config.registry()?;
        let responder =
            ErrorResponder::new(&registry, config.identity()).with_renderer(config.renderer());

        let mut listener = TcpListener::bind(config.listen)?;
        self.poll
            .registry()
            .register(&mut listener, SERVER_TOKEN, Interest::READABLE)?;

        info!(
            addr = %config.listen,
            server = %responder.server().package,
            pages = registry.len(),
            fallback = %registry.fallback().display(),
            "server listening"
        );

        loop {
            if let Err(e) = self.poll.poll(&mut self.events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            let ready: Vec<(Token, bool, bool)> = self
                .events
                .iter()
                .map(|event| (event.token(), event.is_readable(), event.is_writable()))
                .collect();

            for (token, readable, writable) in ready {
                if token == SERVER_TOKEN {
                    self.accept(&listener)?;
                    continue;
                }

                let keep = match self.connections.get_mut(&token) {
                    Some(conn) => Self::drive(conn, &responder, readable, writable),
                    None => continue,
                };

                match keep {
                    Ok(true) => {
                        if let Some(conn) = self.connections.get_mut(&token) {
                            if conn.response.is_some() {
                                self.poll
                                    .registry()
                                    .reregister(&mut conn.stream, token, Interest::WRITABLE)?;
                            }
                        }
                    }
                    Ok(false) => self.close(token),
                    Err(e) => {
                        error!(?token, error = %e, "connection failed");
                        self.close(token);
                    }
                }
            }
        }
    }

    fn accept(&mut self, listener: &TcpListener) -> io::Result<()> {
        loop {
            match listener.accept() {
                Ok((mut stream, peer)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;

                    self.poll
                        .registry()
                        .register(&mut stream, token, Interest::READABLE)?;
                    self.connections.insert(
                        token,
                        Connection {
                            stream,
                            peer,
                            request: HttpRequestBuilder::new(),
                            response: None,
                        },
                    );
                    debug!(?token, %peer, "accepted connection");
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    return Ok(());
                }
            }
        }
    }

    /// Returns whether the connection should stay open.
    fn drive(
        conn: &mut Connection,
        responder: &ErrorResponder<'_>,
        readable: bool,
        writable: bool,
    ) -> Result<bool> {
        if readable && conn.response.is_none() {
            match handle_read_state(conn, responder)? {
                ReadProgress::Pending => return Ok(true),
                ReadProgress::Closed => return Ok(false),
                ReadProgress::Ready => {}
            }
        }

        // Try straight away; most error pages fit in the socket buffer.
        if conn.response.is_some() || writable {
            return match handle_write_state(conn)? {
                WriteProgress::Pending => Ok(true),
                WriteProgress::Finished => Ok(false),
            };
        }
        Ok(true)
    }

    fn close(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            let _ = self.poll.registry().deregister(&mut conn.stream);
            debug!(?token, peer = %conn.peer, "connection closed");
        }
    }
}
