//! Parse and server error types

/// Result type for server operations
pub type HttpResult<T> = std::result::Result<T, ServerError>;

/// Failures produced while decoding a raw request buffer.
///
/// Decode errors are values, not control flow: the reactor answers them with
/// a `400 Bad Request` and keeps running.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
    #[error("malformed request path: {0}")]
    MalformedPath(String),
    #[error("unsupported HTTP version: {0}")]
    UnsupportedVersion(String),
    #[error("malformed header line: {0}")]
    MalformedHeader(String),
}

/// Errors raised by the connection reactor itself.
///
/// Per-connection read/write failures are handled in place by closing the
/// connection; only listener setup and the poll loop surface errors here.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
