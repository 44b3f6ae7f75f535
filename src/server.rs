// src/server.rs
// HTTP/1.1 + JSON adapter over the shared memory.
// Accepted connections are handed to a fixed worker pool over a channel;
// each connection carries a single request and is closed after the reply.

use crate::{GridError, GridResult, HopfieldMemory, ServerConfig};
use crate::models::Grid;
use crossbeam_channel::{bounded, Receiver};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Take, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_HEADER_LINES: usize = 100;
const MAX_HEADER_BYTES: u64 = 16 * 1024;
// Oversized bodies are read and discarded up to this many bytes before the 413
const MAX_DRAIN_BYTES: u64 = 16 * 1024 * 1024;
const ACCEPT_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Default, Deserialize)]
struct GridRequest {
    #[serde(default)]
    grid: Option<Grid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl HttpResponse {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "error": message.into() }))
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            204 => "No Content",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        }
    }

    /// Serialize with permissive CORS headers
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self
            .body
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();
        let mut out = format!("HTTP/1.1 {} {}\r\n", self.status, self.reason());
        out.push_str("Access-Control-Allow-Origin: *\r\n");
        out.push_str("Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n");
        out.push_str("Access-Control-Allow-Headers: Content-Type\r\n");
        if self.body.is_some() {
            out.push_str("Content-Type: application/json\r\n");
        }
        out.push_str(&format!("Content-Length: {}\r\n", body.len()));
        out.push_str("Connection: close\r\n\r\n");
        out.push_str(&body);
        out.into_bytes()
    }
}

/// Map a request onto a memory operation. Pure apart from the memory itself.
pub fn route(memory: &HopfieldMemory, request: &HttpRequest) -> HttpResponse {
    let path = request.path.split('?').next().unwrap_or("");
    let method = request.method.as_str();

    if method == "OPTIONS" {
        return HttpResponse::no_content();
    }

    let allowed = match path {
        "/api/memorize" | "/api/recall" | "/api/recallAll" | "/api/clear" => "POST",
        "/api/get-patterns" => "GET",
        _ => return HttpResponse::error(404, format!("No route for {}", path)),
    };
    if method != allowed {
        return HttpResponse::error(405, format!("{} expects {}", path, allowed));
    }

    match path {
        "/api/memorize" => match parse_grid(&request.body) {
            Ok(Some(grid)) => match memory.learn(&grid) {
                Ok(()) => HttpResponse::json(200, json!({ "message": "Pattern memorized successfully" })),
                Err(GridError::InvalidInput(_)) => HttpResponse::error(400, "Invalid grid data"),
                Err(e) => error_response(e),
            },
            Ok(None) => HttpResponse::error(400, "Invalid grid data"),
            Err(e) => error_response(e),
        },
        "/api/recall" => match parse_grid(&request.body) {
            Ok(Some(grid)) => match memory.recall(&grid) {
                Ok(recalled) => HttpResponse::json(200, json!(recalled)),
                Err(GridError::InvalidInput(_)) => HttpResponse::error(400, "No grid data received"),
                Err(e) => error_response(e),
            },
            Ok(None) => HttpResponse::error(400, "No grid data received"),
            Err(e) => error_response(e),
        },
        "/api/recallAll" => match memory.recall_all() {
            Ok(grids) => HttpResponse::json(200, json!({ "grids": grids })),
            Err(e) => error_response(e),
        },
        "/api/get-patterns" => HttpResponse::json(200, json!({ "patterns": memory.pattern_count() })),
        _ => {
            memory.clear();
            HttpResponse::json(200, json!({ "message": "Memory cleared successfully" }))
        }
    }
}

/// `None` when the grid is missing, null or empty
fn parse_grid(body: &[u8]) -> GridResult<Option<Grid>> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(None);
    }
    let request: GridRequest = serde_json::from_slice(body)?;
    Ok(request.grid.filter(|g| !g.is_empty()))
}

fn error_response(e: GridError) -> HttpResponse {
    if e.is_client_error() {
        warn!("Rejected request: {}", e);
        HttpResponse::error(400, e.to_string())
    } else {
        warn!("Request failed: {}", e);
        HttpResponse::error(500, e.to_string())
    }
}

enum ReadOutcome {
    Request(HttpRequest),
    TooLarge,
}

/// Read one header line, failing once the header section exceeds its byte limit
fn read_head_line<R: BufRead>(head: &mut Take<R>, line: &mut String) -> GridResult<usize> {
    let n = head.read_line(line)?;
    if n > 0 && !line.ends_with('\n') && head.limit() == 0 {
        return Err(GridError::InvalidInput("request header too large".into()));
    }
    Ok(n)
}

fn read_request(stream: &TcpStream, max_body: usize) -> GridResult<ReadOutcome> {
    let mut reader = BufReader::new(stream);

    let (method, path, content_length) = {
        let mut head = reader.by_ref().take(MAX_HEADER_BYTES);

        let mut request_line = String::new();
        read_head_line(&mut head, &mut request_line)?;
        let mut parts = request_line.split_whitespace();
        let (method, path) = match (parts.next(), parts.next()) {
            (Some(m), Some(p)) => (m.to_string(), p.to_string()),
            _ => return Err(GridError::InvalidInput("malformed request line".into())),
        };

        let mut content_length = 0usize;
        for _ in 0..MAX_HEADER_LINES {
            let mut line = String::new();
            if read_head_line(&mut head, &mut line)? == 0 {
                break;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().map_err(|_| {
                        GridError::InvalidInput(format!("bad Content-Length: {}", value.trim()))
                    })?;
                }
            }
        }
        (method, path, content_length)
    };

    if content_length > max_body {
        // Unread bytes left in the socket turn the close into a reset
        let limit = (content_length as u64).min(MAX_DRAIN_BYTES);
        if let Err(e) = io::copy(&mut reader.by_ref().take(limit), &mut io::sink()) {
            debug!("Drain of oversized body stopped early: {}", e);
        }
        return Ok(ReadOutcome::TooLarge);
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    Ok(ReadOutcome::Request(HttpRequest { method, path, body }))
}

fn handle_connection(mut stream: TcpStream, memory: &HopfieldMemory, max_body: usize) {
    if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
        warn!("Could not set read timeout: {}", e);
    }

    let response = match read_request(&stream, max_body) {
        Ok(ReadOutcome::Request(request)) => {
            debug!("{} {}", request.method, request.path);
            route(memory, &request)
        }
        Ok(ReadOutcome::TooLarge) => {
            warn!("Rejected request body above {} bytes", max_body);
            HttpResponse::error(413, "Request body too large")
        }
        Err(GridError::Io(e)) => {
            warn!("Read error: {}", e);
            return;
        }
        Err(e) => error_response(e),
    };

    if let Err(e) = stream.write_all(&response.to_bytes()).and_then(|_| stream.flush()) {
        warn!("Write error: {}", e);
        return;
    }
    let _ = stream.shutdown(Shutdown::Write);
}

pub struct HopfieldServer {
    pub config: ServerConfig,
    memory: Arc<HopfieldMemory>,
    shutdown: Arc<AtomicBool>,
}

impl HopfieldServer {
    pub fn new(config: ServerConfig, memory: Arc<HopfieldMemory>) -> GridResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            memory,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Setting the flag stops the accept loop within one poll interval
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until shutdown
    pub fn run(&self) -> GridResult<()> {
        let listener = TcpListener::bind(self.config.bind_address())?;
        self.serve(listener)
    }

    /// Serve on an already-bound listener
    pub fn serve(&self, listener: TcpListener) -> GridResult<()> {
        info!("Hopfield server listening on {}", listener.local_addr()?);

        let (tx, rx) = bounded::<TcpStream>(self.config.workers * 4);
        let workers: Vec<_> = (0..self.config.workers)
            .map(|id| {
                let rx = rx.clone();
                let memory = self.memory.clone();
                let max_body = self.config.max_body_bytes;
                thread::spawn(move || Self::worker_loop(id, rx, memory, max_body))
            })
            .collect();
        drop(rx);

        listener.set_nonblocking(true)?;
        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nonblocking(false) {
                        warn!("Dropping connection from {}: {}", peer, e);
                        continue;
                    }
                    if tx.send(stream).is_err() {
                        warn!("Worker pool gone, stopping accept loop");
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => warn!("Connection failed: {}", e),
            }
        }

        drop(tx);
        for handle in workers {
            let _ = handle.join();
        }
        info!("Hopfield server stopped");
        Ok(())
    }

    fn worker_loop(id: usize, rx: Receiver<TcpStream>, memory: Arc<HopfieldMemory>, max_body: usize) {
        debug!("Worker {} started", id);
        for stream in rx.iter() {
            handle_connection(stream, &memory, max_body);
        }
        debug!("Worker {} exiting", id);
    }
}
