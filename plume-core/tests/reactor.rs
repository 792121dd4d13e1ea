//! End-to-end tests driving the reactor over real sockets.
//!
//! Each test binds an ephemeral port, runs the reactor on a background
//! thread, and speaks HTTP/1.1 to it with a plain blocking client. The
//! server closes every connection after one response, so `read_to_end`
//! doubles as the close assertion.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use plume_core::{HttpServer, Router};

fn spawn_server(router: Router) -> SocketAddr {
    let mut reactor = HttpServer::new()
        .with_router(router)
        .bind("127.0.0.1:0")
        .expect("bind ephemeral port");
    let addr = reactor.local_addr().expect("local addr");
    std::thread::spawn(move || {
        let _ = reactor.run();
    });
    addr
}

fn send_request(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.write_all(raw).expect("write request");
    let mut response = Vec::new();
    stream.read_to_end(&mut response).expect("read response");
    response
}

/// Split a raw response into (status line, headers, body).
fn parse_response(raw: &[u8]) -> (String, HashMap<String, String>, Vec<u8>) {
    let sep = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator");
    let head = std::str::from_utf8(&raw[..sep]).expect("utf-8 head");
    let body = raw[sep + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().expect("status line").to_string();
    let mut headers = HashMap::new();
    for line in lines {
        let (name, value) = line.split_once(": ").expect("header line");
        headers.insert(name.to_string(), value.to_string());
    }
    (status_line, headers, body)
}

fn echo_router() -> Router {
    let mut router = Router::new();
    router.get("/echo/:content", |req, res| {
        res.send(req.params()["content"].clone());
        if req.header("Accept-Encoding").is_some_and(|v| v.contains("gzip")) {
            res.encode_gzip();
        }
    });
    router.get("/user-agent", |req, res| {
        res.send(req.header("User-Agent").unwrap_or_default().to_string());
    });
    router
}

#[test]
fn echo_round_trip() {
    let addr = spawn_server(echo_router());

    let raw = send_request(addr, b"GET /echo/hello HTTP/1.1\r\nHost: localhost\r\n\r\n");
    let (status, headers, body) = parse_response(&raw);

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(headers.get("Content-Type").map(String::as_str), Some("text/plain"));
    assert_eq!(headers.get("Content-Length").map(String::as_str), Some("5"));
    assert_eq!(body, b"hello");
}

#[test]
fn echo_with_gzip_negotiation() {
    let addr = spawn_server(echo_router());

    let raw = send_request(
        addr,
        b"GET /echo/compress-me HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n",
    );
    let (status, headers, body) = parse_response(&raw);

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(headers.get("Content-Encoding").map(String::as_str), Some("gzip"));
    assert_eq!(
        headers.get("Content-Length").map(String::as_str),
        Some(body.len().to_string().as_str())
    );

    let mut decoder = flate2::read::GzDecoder::new(body.as_slice());
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).expect("gzip body");
    assert_eq!(decompressed, b"compress-me");
}

#[test]
fn user_agent_header_reaches_handler() {
    let addr = spawn_server(echo_router());

    let raw = send_request(
        addr,
        b"GET /user-agent HTTP/1.1\r\nUser-Agent: test-agent\r\n\r\n",
    );
    let (status, _, body) = parse_response(&raw);

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, b"test-agent");
}

#[test]
fn unknown_route_answers_not_found() {
    let addr = spawn_server(echo_router());

    let raw = send_request(addr, b"GET /nonexistent/route HTTP/1.1\r\n\r\n");
    let (status, _, body) = parse_response(&raw);

    assert_eq!(status, "HTTP/1.1 404 Not Found");
    assert!(body.is_empty());
}

#[test]
fn malformed_request_answers_bad_request() {
    let addr = spawn_server(echo_router());

    let raw = send_request(addr, b"BOGUS\r\n\r\n");
    let (status, _, body) = parse_response(&raw);

    assert_eq!(status, "HTTP/1.1 400 Bad Request");
    assert!(body.is_empty());
}

#[test]
fn reactor_survives_bad_connections() {
    let addr = spawn_server(echo_router());

    // A malformed request closes only its own connection.
    let raw = send_request(addr, b"\x00\x01\x02garbage");
    let (status, _, _) = parse_response(&raw);
    assert_eq!(status, "HTTP/1.1 400 Bad Request");

    let raw = send_request(addr, b"GET /echo/alive HTTP/1.1\r\n\r\n");
    let (status, _, body) = parse_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, b"alive");
}

#[test]
fn file_round_trip_through_post_and_get() {
    let dir = Arc::new(tempfile::tempdir().expect("tempdir"));

    let mut router = Router::new();
    let read_root = Arc::clone(&dir);
    router.get("/files/:filename", move |req, res| {
        res.send_file(read_root.path().join(&req.params()["filename"]));
    });
    let write_root = Arc::clone(&dir);
    router.post("/files/:filename", move |req, res| {
        match std::fs::write(write_root.path().join(&req.params()["filename"]), req.body()) {
            Ok(()) => res.set_status(plume_core::StatusCode::Created),
            Err(_) => {}
        }
    });

    let addr = spawn_server(router);

    let raw = send_request(
        addr,
        b"POST /files/notes.txt HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world",
    );
    let (status, _, _) = parse_response(&raw);
    assert_eq!(status, "HTTP/1.1 201 Created");

    let raw = send_request(addr, b"GET /files/notes.txt HTTP/1.1\r\n\r\n");
    let (status, headers, body) = parse_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(
        headers.get("Content-Type").map(String::as_str),
        Some("application/octet-stream")
    );
    assert_eq!(body, b"hello world");

    let raw = send_request(addr, b"GET /files/missing.txt HTTP/1.1\r\n\r\n");
    let (status, _, body) = parse_response(&raw);
    assert_eq!(status, "HTTP/1.1 404 Not Found");
    assert!(body.is_empty());
}
