//! In-process stand-in for the remote numeric service.
//!
//! Listens on an ephemeral port and answers the service contract by running
//! the real engines, so contract tests can compare remote results against
//! local computation exactly. Behaviors cover the failure paths: delayed or
//! stalled replies for deadline tests, error replies, and shape-mangled
//! replies.

#![allow(dead_code)]

use mathviz_core::fractal::{self, FractalRequest};
use mathviz_core::spectrum::{self, SpectrumRequest};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How the stub treats compute requests (health always answers).
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Run the real engines and answer with their output.
    Compute,
    /// Sleep before computing; sleeps longer than the client deadline trip
    /// its timeout handling.
    Delay(Duration),
    /// Send the headers and the start of a payload, then go silent for
    /// this long before hanging up.
    Stall(Duration),
    /// Answer every compute request with this status and error message.
    Fail { status: u16, message: String },
    /// Compute, then drop the tail of the payload to break its shape.
    Truncate,
}

#[derive(Default)]
pub struct Hits {
    pub health: AtomicUsize,
    pub mandelbrot: AtomicUsize,
    pub fourier: AtomicUsize,
}

pub struct StubService {
    base_url: String,
    hits: Arc<Hits>,
}

impl StubService {
    pub fn spawn(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("stub listener should bind");
        let addr = listener.local_addr().expect("stub listener address");
        let hits = Arc::new(Hits::default());
        let worker_hits = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => handle_connection(stream, &behavior, &worker_hits),
                    Err(_) => break,
                }
            }
        });
        Self {
            base_url: format!("http://{addr}/api"),
            hits,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn hits(&self) -> &Hits {
        &self.hits
    }
}

enum Endpoint {
    Mandelbrot,
    Fourier,
}

/// What a connection writes back: a complete response, or a partial one
/// held open for the given pause before the socket closes.
enum Reply {
    Whole(String),
    Stalled(String, Duration),
}

fn handle_connection(stream: TcpStream, behavior: &Behavior, hits: &Hits) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {
                let header = line.trim();
                if header.is_empty() {
                    break;
                }
                if let Some(value) = header.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            Err(_) => return,
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body).is_err() {
        return;
    }

    let reply = route(&request_line, &body, behavior, hits);
    let stream = reader.get_mut();
    match reply {
        Reply::Whole(response) => {
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
        Reply::Stalled(head, pause) => {
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.flush();
            thread::sleep(pause);
        }
    }
}

fn route(request_line: &str, body: &[u8], behavior: &Behavior, hits: &Hits) -> Reply {
    if request_line.starts_with("GET /api/health") {
        hits.health.fetch_add(1, Ordering::SeqCst);
        return Reply::Whole(json_response(
            200,
            r#"{"status": "healthy", "version": "1.4.2", "backend": "stub"}"#.to_string(),
        ));
    }

    let endpoint = if request_line.starts_with("POST /api/mandelbrot") {
        hits.mandelbrot.fetch_add(1, Ordering::SeqCst);
        Endpoint::Mandelbrot
    } else if request_line.starts_with("POST /api/fourier") {
        hits.fourier.fetch_add(1, Ordering::SeqCst);
        Endpoint::Fourier
    } else {
        return Reply::Whole(json_response(
            404,
            r#"{"error": "unknown endpoint"}"#.to_string(),
        ));
    };

    match behavior {
        // An empty message mimics a reply with no decodable error body.
        Behavior::Fail { status, message } if message.is_empty() => {
            Reply::Whole(text_response(*status, "no body".to_string()))
        }
        Behavior::Fail { status, message } => Reply::Whole(json_response(
            *status,
            serde_json::json!({ "error": message }).to_string(),
        )),
        Behavior::Delay(pause) => {
            thread::sleep(*pause);
            Reply::Whole(serve_compute(endpoint, body, false))
        }
        Behavior::Stall(pause) => {
            // The declared length exceeds the bytes sent, so the reader
            // keeps waiting for more until its deadline fires.
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 4096\r\nConnection: close\r\n\r\n{}",
                r#"{"success": true, "data": {"iterations": [[1"#
            );
            Reply::Stalled(head, *pause)
        }
        Behavior::Compute => Reply::Whole(serve_compute(endpoint, body, false)),
        Behavior::Truncate => Reply::Whole(serve_compute(endpoint, body, true)),
    }
}

fn serve_compute(endpoint: Endpoint, body: &[u8], truncate: bool) -> String {
    match endpoint {
        Endpoint::Mandelbrot => match serde_json::from_slice::<FractalRequest>(body) {
            Ok(request) => {
                let field = fractal::compute_field(&request);
                let mut rows: Vec<Vec<u32>> = field.rows().map(|row| row.to_vec()).collect();
                if truncate {
                    rows.pop();
                }
                let payload = serde_json::json!({
                    "success": true,
                    "data": {
                        "iterations": rows,
                        "width": field.width(),
                        "height": field.height(),
                        "computation_method": "stub"
                    }
                });
                json_response(200, payload.to_string())
            }
            Err(err) => bad_request(err),
        },
        Endpoint::Fourier => match serde_json::from_slice::<SpectrumRequest>(body) {
            Ok(request) => {
                let mut result = spectrum::analyze(&request);
                if truncate {
                    result.magnitude.pop();
                }
                let payload = serde_json::json!({ "success": true, "data": result });
                json_response(200, payload.to_string())
            }
            Err(err) => bad_request(err),
        },
    }
}

fn bad_request(err: serde_json::Error) -> String {
    json_response(400, serde_json::json!({ "error": err.to_string() }).to_string())
}

fn json_response(status: u16, body: String) -> String {
    response_with(status, "application/json", body)
}

fn text_response(status: u16, body: String) -> String {
    response_with(status, "text/plain", body)
}

fn response_with(status: u16, content_type: &str, body: String) -> String {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    };
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}
