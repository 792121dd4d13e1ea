//! HTTP response building and serialization
//!
//! A response starts as `404 Not Found` with no headers and an empty body;
//! exactly one route handler mutates it before it is serialized back onto
//! the wire.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::constants::{content_types, headers, CRLF};

/// HTTP status codes emitted by this server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    BadRequest = 400,
    NotFound = 404,
}

impl StatusCode {
    /// Get the status code as a number
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the reason phrase for this status code
    pub fn reason_phrase(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Mutable HTTP response accumulator
///
/// # Example
///
/// ```rust
/// use plume_core::{HttpResponse, StatusCode};
///
/// let mut response = HttpResponse::new();
/// assert_eq!(response.status(), StatusCode::NotFound);
/// response.send("hello");
/// let bytes = response.to_bytes();
/// assert!(bytes.ends_with(b"hello"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new response. The status defaults to `404 Not Found` until a
    /// handler (or the router's GET wrapper) says otherwise.
    pub fn new() -> Self {
        Self { status: StatusCode::NotFound, headers: HashMap::new(), body: Vec::new() }
    }

    /// Set the status code
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Set a header verbatim
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Replace the body with text content.
    ///
    /// Sets `Content-Type: text/plain` and recomputes `Content-Length`.
    pub fn send(&mut self, content: impl Into<Vec<u8>>) {
        self.body = content.into();
        self.set_header(headers::CONTENT_TYPE, content_types::TEXT);
        self.set_content_length();
    }

    /// Read an entire file into the body.
    ///
    /// On success the response becomes `200 OK` with
    /// `Content-Type: application/octet-stream`; a file that cannot be
    /// opened leaves the response as `404 Not Found` with no body and no
    /// header side effects.
    pub fn send_file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(contents) => {
                self.body = contents;
                self.set_header(headers::CONTENT_TYPE, content_types::BINARY);
                self.set_content_length();
                self.set_status(StatusCode::Ok);
            }
            Err(e) => {
                log::debug!("send_file {}: {}", path.display(), e);
                self.set_status(StatusCode::NotFound);
            }
        }
    }

    /// Compress the current body into a gzip container (default level).
    ///
    /// Replaces the body with the compressed bytes, sets
    /// `Content-Encoding: gzip`, and recomputes `Content-Length` from the
    /// compressed size. Call after the body is finalized; encoding an unset
    /// body produces a gzipped empty payload.
    pub fn encode_gzip(&mut self) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        if encoder.write_all(&self.body).is_ok() {
            if let Ok(compressed) = encoder.finish() {
                self.body = compressed;
                self.set_header(headers::CONTENT_ENCODING, "gzip");
                self.set_content_length();
            }
        }
    }

    /// Recompute the Content-Length header from the current body
    fn set_content_length(&mut self) {
        self.headers
            .insert(headers::CONTENT_LENGTH.to_string(), self.body.len().to_string());
    }

    // Accessors

    /// Get the status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get all headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Get a specific header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Get the response body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Serialize the response to raw HTTP bytes.
    ///
    /// Header iteration order is whatever the map yields; nothing on the
    /// receiving side may depend on it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = String::new();

        write!(&mut head, "HTTP/1.1 {}{}", self.status, CRLF)
            .expect("write to String is infallible");

        for (name, value) in &self.headers {
            write!(&mut head, "{}: {}{}", name, value, CRLF)
                .expect("write to String is infallible");
        }

        head.push_str(CRLF);

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}
