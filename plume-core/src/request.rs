//! HTTP request parsing and representation
//!
//! Decoding is a pure function over a raw byte buffer: it allocates the
//! parsed request and nothing else. Connection state never enters here.

use std::collections::HashMap;
use std::str::FromStr;

use crate::constants::{self, CRLF_BYTES};
use crate::error::ParseError;

/// HTTP methods supported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
}

impl HttpMethod {
    /// Convert method to string
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ParseError;

    // Method tokens are case-sensitive on the wire; "get" is not a method.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP version information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http11,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http11 => constants::HTTP_1_1,
        }
    }
}

impl FromStr for HttpVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            constants::HTTP_1_1 => Ok(HttpVersion::Http11),
            _ => Err(ParseError::UnsupportedVersion(s.to_string())),
        }
    }
}

impl std::fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP headers collection.
///
/// Names are stored verbatim as they appeared on the wire; a later duplicate
/// overwrites an earlier one.
pub type Headers = HashMap<String, String>;

/// Represents a complete HTTP request
///
/// # Example
///
/// ```rust
/// use plume_core::{HttpMethod, HttpRequest};
///
/// let raw = b"GET /users HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let request = HttpRequest::parse(raw).unwrap();
/// assert_eq!(request.method(), &HttpMethod::GET);
/// assert_eq!(request.path(), "/users");
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: HttpMethod,
    path: String,
    version: HttpVersion,
    headers: Headers,
    params: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Parse an HTTP request from raw bytes
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the request line, method, path, version,
    /// or any header line is malformed.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let line_end = find(raw, CRLF_BYTES).ok_or(ParseError::MalformedRequestLine)?;
        let request_line = std::str::from_utf8(&raw[..line_end])
            .map_err(|_| ParseError::MalformedRequestLine)?;
        let (method, path, version) = Self::parse_request_line(request_line)?;

        let rest = &raw[line_end + 2..];
        let (headers, body_start) = Self::parse_header_block(rest)?;
        let body = Self::parse_body(&rest[body_start..], &headers);

        Ok(Self { method, path, version, headers, params: HashMap::new(), body })
    }

    /// Parse the HTTP request line (e.g., "GET /path HTTP/1.1")
    fn parse_request_line(line: &str) -> Result<(HttpMethod, String, HttpVersion), ParseError> {
        let method_end = line.find(' ').ok_or(ParseError::MalformedRequestLine)?;
        let method = line[..method_end].parse()?;

        let rest = &line[method_end + 1..];
        let path_end = rest.find(' ').ok_or(ParseError::MalformedRequestLine)?;
        let path = &rest[..path_end];
        if !is_valid_path(path) {
            return Err(ParseError::MalformedPath(path.to_string()));
        }

        let version = rest[path_end + 1..].parse()?;

        Ok((method, path.to_string(), version))
    }

    /// Parse the header block up to and including the terminating blank line.
    ///
    /// Returns the headers together with the offset of the first body byte.
    fn parse_header_block(block: &[u8]) -> Result<(Headers, usize), ParseError> {
        let mut headers = HashMap::new();
        let mut cursor = 0;

        while cursor < block.len() && !block[cursor..].starts_with(CRLF_BYTES) {
            let line_end = find(&block[cursor..], CRLF_BYTES).ok_or_else(|| {
                ParseError::MalformedHeader(String::from_utf8_lossy(&block[cursor..]).into_owned())
            })?;
            let line = std::str::from_utf8(&block[cursor..cursor + line_end]).map_err(|_| {
                ParseError::MalformedHeader(
                    String::from_utf8_lossy(&block[cursor..cursor + line_end]).into_owned(),
                )
            })?;

            let colon = line
                .find(':')
                .ok_or_else(|| ParseError::MalformedHeader(line.to_string()))?;
            let name = &line[..colon];
            // Only leading spaces are stripped from the value; trailing
            // whitespace is part of it.
            let value = line[colon + 1..].trim_start_matches(' ');
            headers.insert(name.to_string(), value.to_string());

            cursor += line_end + 2;
        }

        if block[cursor..].starts_with(CRLF_BYTES) {
            cursor += 2;
        }

        Ok((headers, cursor))
    }

    /// Take `Content-Length` bytes following the header block.
    ///
    /// A missing or unparseable `Content-Length` means an empty body; a
    /// declared length past the end of the buffer is clamped to what is
    /// actually there.
    fn parse_body(after_headers: &[u8], headers: &Headers) -> Vec<u8> {
        let declared = headers
            .get(constants::headers::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        after_headers[..declared.min(after_headers.len())].to_vec()
    }

    // Accessors

    /// Get the HTTP method
    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the HTTP version
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// Get all headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get a specific header value (names match verbatim)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Path parameters bound by the router for this request
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Get a specific path parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Attach the path parameters extracted during route resolution.
    ///
    /// Bindings are request-scoped; the router produces a fresh map per
    /// resolution.
    pub fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Get the request body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// A path must be absolute and contain no space characters.
fn is_valid_path(path: &str) -> bool {
    path.starts_with('/') && !path.contains(' ')
}

/// Find the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
