use hebbgrid::{HopfieldMemory, HopfieldServer, MemoryConfig, ServerConfig};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn start_server_with(grid_size: usize, config: ServerConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    let memory = Arc::new(HopfieldMemory::new(MemoryConfig::new(grid_size)).unwrap());
    let server = HopfieldServer::new(config, memory).unwrap();
    thread::spawn(move || {
        let _ = server.serve(listener);
    });
    addr
}

fn start_server(grid_size: usize) -> SocketAddr {
    start_server_with(
        grid_size,
        ServerConfig {
            workers: 2,
            ..ServerConfig::default()
        },
    )
}

/// Send one request and return (status, headers, parsed JSON body)
fn send(addr: SocketAddr, method: &str, path: &str, body: Option<Value>) -> (u16, String, Value) {
    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    let request = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        method,
        path,
        payload.len(),
        payload
    );
    send_raw(addr, request.as_bytes())
}

/// Write raw bytes and parse whatever response comes back
fn send_raw(addr: SocketAddr, request: &[u8]) -> (u16, String, Value) {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.write_all(request).unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();
    let (head, body) = raw.split_once("\r\n\r\n").expect("header terminator");
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status code");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).expect("json body")
    };
    (status, head.to_string(), json)
}

#[test]
fn test_full_session_over_http() {
    let addr = start_server(3);
    let grid = json!([[1, 1, 1], [-1, -1, -1], [1, -1, 1]]);

    let (status, _, body) = send(addr, "POST", "/api/recallAll", None);
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "No patterns memorized" }));

    let (status, headers, body) = send(addr, "POST", "/api/memorize", Some(json!({ "grid": grid })));
    assert_eq!(status, 200);
    assert!(headers.contains("Access-Control-Allow-Origin: *"));
    assert_eq!(body["message"], "Pattern memorized successfully");

    let (_, _, body) = send(addr, "GET", "/api/get-patterns", None);
    assert_eq!(body, json!({ "patterns": 1 }));

    let noisy = json!([[1, 1, 1], [-1, 1, -1], [1, -1, 1]]);
    let (status, _, body) = send(addr, "POST", "/api/recall", Some(json!({ "grid": noisy })));
    assert_eq!(status, 200);
    assert_eq!(body["grid"], grid);
    assert_eq!(body["energy"], -36);

    let (_, _, body) = send(addr, "POST", "/api/recallAll", None);
    assert_eq!(body, json!({ "grids": [grid] }));

    let (status, _, body) = send(addr, "POST", "/api/clear", None);
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Memory cleared successfully");

    let (_, _, body) = send(addr, "GET", "/api/get-patterns", None);
    assert_eq!(body, json!({ "patterns": 0 }));
}

#[test]
fn test_bad_requests_over_http() {
    let addr = start_server(3);

    let (status, _, body) = send(addr, "POST", "/api/memorize", Some(json!({})));
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "Invalid grid data" }));

    let (status, _, body) = send(addr, "POST", "/api/recall", Some(json!({ "grid": [] })));
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "No grid data received" }));

    let (status, _, _) = send(addr, "POST", "/api/memorize", Some(json!({ "grid": [[1, 1], [1, 1]] })));
    assert_eq!(status, 400);

    let (status, headers, _) = send(addr, "OPTIONS", "/api/memorize", None);
    assert_eq!(status, 204);
    assert!(headers.contains("Access-Control-Allow-Methods"));

    let (status, _, _) = send(addr, "GET", "/missing", None);
    assert_eq!(status, 404);
}

#[test]
fn test_oversized_body_gets_413() {
    let addr = start_server_with(
        3,
        ServerConfig {
            workers: 4,
            max_body_bytes: 1024,
            ..ServerConfig::default()
        },
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(move || {
                let body = format!(r#"{{"grid": "{}"}}"#, "x".repeat(200_000));
                let request = format!(
                    "POST /api/memorize HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                send_raw(addr, request.as_bytes())
            })
        })
        .collect();

    for handle in handles {
        let (status, _, body) = handle.join().unwrap();
        assert_eq!(status, 413);
        assert!(body["error"].is_string());
    }

    // Server still answers normally afterwards
    let (status, _, _) = send(addr, "GET", "/api/get-patterns", None);
    assert_eq!(status, 200);
}

#[test]
fn test_garbage_request_line_gets_400() {
    let addr = start_server(3);

    let (status, _, body) = send_raw(addr, b"GARBAGE\r\n\r\n");
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("malformed request line"));

    let (status, _, body) = send_raw(
        addr,
        b"POST /api/memorize HTTP/1.1\r\nContent-Length: lots\r\n\r\n",
    );
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("Content-Length"));
}

#[test]
fn test_shutdown_flag_stops_idle_server() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let memory = Arc::new(HopfieldMemory::new(MemoryConfig::new(3)).unwrap());
    let server = HopfieldServer::new(ServerConfig::default(), memory).unwrap();
    let flag = server.shutdown_handle();

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let result = server.serve(listener);
        let _ = done_tx.send(result.is_ok());
    });

    thread::sleep(Duration::from_millis(100));
    flag.store(true, Ordering::Relaxed);

    let stopped = done_rx.recv_timeout(Duration::from_secs(3));
    assert_eq!(stopped, Ok(true));
}
