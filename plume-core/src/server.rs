//! Single-threaded readiness-driven connection reactor
//!
//! One `mio::Poll` instance multiplexes the listening socket and every
//! accepted connection. All work for a request — decode, route, handler,
//! encode, write — runs synchronously inside the readiness callback, so a
//! slow handler blocks the whole reactor; that trade-off buys a lock-free
//! core. Connections are never reused: after one response the stream is
//! half-closed for write and dropped, whatever the request's `Connection`
//! header said. A read is assumed to contain one complete request; requests
//! larger than one read buffer are not reassembled.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};

use crate::error::{HttpResult, ServerError};
use crate::request::HttpRequest;
use crate::response::{HttpResponse, StatusCode};
use crate::router::Router;

const LISTENER: Token = Token(0);

/// Configuration for the connection reactor
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Accept backlog for the listening socket
    pub backlog: i32,
    /// Bytes read per readiness event; also the maximum decodable request size
    pub read_buffer_size: usize,
    /// Readiness events drained per poll
    pub max_events: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { backlog: 5, read_buffer_size: 4096, max_events: 64 }
    }
}

/// HTTP server builder
///
/// Routes are registered on a [`Router`] handed over before binding; the
/// trie is read-only from then on.
///
/// # Example
///
/// ```rust,no_run
/// use plume_core::{HttpServer, Router};
///
/// let mut router = Router::new();
/// router.get("/", |_req, _res| {});
///
/// HttpServer::new()
///     .with_router(router)
///     .bind("127.0.0.1:4221")?
///     .run()?;
/// # Ok::<(), plume_core::ServerError>(())
/// ```
pub struct HttpServer {
    config: ServerConfig,
    router: Option<Router>,
}

impl HttpServer {
    /// Create a server builder with default configuration
    pub fn new() -> Self {
        Self { config: ServerConfig::default(), router: None }
    }

    /// Create a server builder with custom configuration
    pub fn with_config(config: ServerConfig) -> Self {
        Self { config, router: None }
    }

    /// Set the router for handling requests
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Bind the listening socket and set up the readiness loop.
    ///
    /// Without a router every request answers `404 Not Found`.
    pub fn bind(self, addr: &str) -> HttpResult<Reactor> {
        Reactor::new(addr, self.config, self.router.unwrap_or_default())
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

/// One accepted connection: the socket and the peer it came from.
///
/// Created on accept, destroyed on read error, EOF, or after its single
/// response is written.
struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
}

/// The readiness loop: accepts, reads, dispatches, writes, closes.
pub struct Reactor {
    poll: Poll,
    listener: TcpListener,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    config: ServerConfig,
    router: Router,
}

impl Reactor {
    fn new(addr: &str, config: ServerConfig, router: Router) -> HttpResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| ServerError::InvalidAddress(addr.to_string()))?;
        let std_listener = bind_listener(addr, config.backlog)
            .map_err(|source| ServerError::Bind { addr: addr.to_string(), source })?;
        let mut listener = TcpListener::from_std(std_listener);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        Ok(Self {
            poll,
            listener,
            connections: HashMap::new(),
            next_token: LISTENER.0 + 1,
            config,
            router,
        })
    }

    /// The address the listener is bound to
    pub fn local_addr(&self) -> HttpResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the event loop. Blocks the calling thread forever.
    ///
    /// Connection-level failures are logged and close only the connection
    /// involved; only poll itself can end the loop.
    pub fn run(&mut self) -> HttpResult<()> {
        let mut events = Events::with_capacity(self.config.max_events);
        log::info!("HTTP server listening on {}", self.local_addr()?);

        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(ServerError::Io(e));
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_pending(),
                    token => self.handle_readable(token),
                }
            }
        }
    }

    /// Accept until the listener would block, registering each stream for
    /// read readiness.
    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, addr)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;
                    if let Err(e) =
                        self.poll.registry().register(&mut stream, token, Interest::READABLE)
                    {
                        log::warn!("failed to register connection from {}: {}", addr, e);
                        continue;
                    }
                    log::debug!("accepted connection from {}", addr);
                    self.connections.insert(token, Connection { stream, addr });
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("accept failed: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_readable(&mut self, token: Token) {
        let done = {
            let Some(conn) = self.connections.get_mut(&token) else {
                return;
            };
            serve_one(conn, &self.router, &self.config)
        };
        if done {
            self.close(token);
        }
    }

    fn close(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            if let Err(e) = self.poll.registry().deregister(&mut conn.stream) {
                log::debug!("deregister {}: {}", conn.addr, e);
            }
            log::debug!("closed connection from {}", conn.addr);
        }
    }
}

/// One bounded read, one dispatch, one write, then close.
///
/// Returns `true` when the connection is finished (which is every outcome
/// except a spurious wakeup).
fn serve_one(conn: &mut Connection, router: &Router, config: &ServerConfig) -> bool {
    let mut buffer = vec![0u8; config.read_buffer_size];
    match conn.stream.read(&mut buffer) {
        Ok(0) => {
            log::debug!("connection from {} closed by peer", conn.addr);
            true
        }
        Ok(n) => {
            let response = dispatch(router, &buffer[..n]);
            if let Err(e) = conn.stream.write_all(&response.to_bytes()) {
                log::warn!("failed to write response to {}: {}", conn.addr, e);
            }
            let _ = conn.stream.shutdown(Shutdown::Write);
            true
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => false,
        Err(e) => {
            log::warn!("read from {} failed: {}", conn.addr, e);
            true
        }
    }
}

/// Decode, resolve, run the handler, and hand back the response to write.
///
/// A decode failure answers `400 Bad Request`; a routing miss leaves the
/// default `404 Not Found` in place.
fn dispatch(router: &Router, raw: &[u8]) -> HttpResponse {
    let mut response = HttpResponse::new();

    match HttpRequest::parse(raw) {
        Ok(mut request) => {
            if let Some((handler, params)) = router.resolve(request.method(), request.path()) {
                request.set_params(params);
                handler(&request, &mut response);
            }
            log::info!("{} {} -> {}", request.method(), request.path(), response.status());
        }
        Err(e) => {
            log::debug!("rejected request: {}", e);
            response.set_status(StatusCode::BadRequest);
        }
    }

    response
}

/// Build the listening socket with an explicit accept backlog, then hand it
/// to mio already non-blocking.
fn bind_listener(addr: SocketAddr, backlog: i32) -> io::Result<std::net::TcpListener> {
    let domain = if addr.is_ipv4() { socket2::Domain::IPV4 } else { socket2::Domain::IPV6 };
    let socket = socket2::Socket::new(domain, socket2::Type::STREAM, Some(socket2::Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    Ok(socket.into())
}
