//! Plume - a featherweight HTTP/1.1 server core
//!
//! Plume implements the request lifecycle of a minimal HTTP/1.1 server from
//! scratch: a non-blocking connection reactor, a byte-stream request parser,
//! a segment-trie router with path parameters, and a response builder with
//! optional gzip encoding.
//!
//! # Architecture
//!
//! - [`server`] - Single-threaded readiness-driven connection reactor
//! - [`request`] - HTTP request parsing and representation
//! - [`response`] - HTTP response building and serialization
//! - [`router`] - Segment-trie routing with `:name` path parameters
//! - [`error`] - Parse and server error types
//!
//! # Example
//!
//! ```rust,no_run
//! use plume_core::{HttpServer, Router};
//!
//! let mut router = Router::new();
//! router.get("/echo/:content", |req, res| {
//!     res.send(req.params()["content"].clone());
//! });
//!
//! let reactor = HttpServer::new().with_router(router).bind("127.0.0.1:4221")?;
//! // reactor.run()?;
//! # Ok::<(), plume_core::ServerError>(())
//! ```
//!
//! # Scope
//!
//! One request per connection, one read per request. No TLS, no chunked
//! transfer encoding, no keep-alive reuse, no worker threads. Everything a
//! request needs runs synchronously inside the readiness callback.

pub mod error;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

// Re-export main types for convenience
pub use error::{HttpResult, ParseError, ServerError};
pub use request::{Headers, HttpMethod, HttpRequest, HttpVersion};
pub use response::{HttpResponse, StatusCode};
pub use router::{PathParams, RouteHandler, Router};
pub use server::{HttpServer, Reactor, ServerConfig};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 4221;

/// HTTP/1.1 protocol constants
pub mod constants {
    /// HTTP/1.1 version string
    pub const HTTP_1_1: &str = "HTTP/1.1";

    /// Common HTTP headers
    pub mod headers {
        pub const CONTENT_TYPE: &str = "Content-Type";
        pub const CONTENT_LENGTH: &str = "Content-Length";
        pub const CONTENT_ENCODING: &str = "Content-Encoding";
        pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
        pub const USER_AGENT: &str = "User-Agent";
    }

    /// Common content types
    pub mod content_types {
        pub const TEXT: &str = "text/plain";
        pub const BINARY: &str = "application/octet-stream";
    }

    /// HTTP line ending
    pub const CRLF: &str = "\r\n";
    pub const CRLF_BYTES: &[u8] = b"\r\n";
    pub const DOUBLE_CRLF_BYTES: &[u8] = b"\r\n\r\n";
}
