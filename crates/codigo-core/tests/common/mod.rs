//! Minimal HTTP stub for exercising the clients against a real socket.
//!
//! Replies are served in order; once exhausted the last one repeats. Every
//! request is recorded before its reply is written.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub enum StubReply {
    Json(u16, String),
    Raw(u16, String),
    /// Never answer within any reasonable client timeout.
    Hang,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(replies: Vec<StubReply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        tokio::spawn(async move {
            let mut next = 0usize;
            while let Ok((stream, _)) = listener.accept().await {
                let reply = replies
                    .get(next)
                    .or_else(|| replies.last())
                    .cloned()
                    .unwrap_or(StubReply::Json(200, "{}".to_string()));
                next += 1;
                let log = log.clone();
                tokio::spawn(async move {
                    serve(stream, reply, log).await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub async fn json(status: u16, body: &str) -> Self {
        Self::start(vec![StubReply::Json(status, body.to_string())]).await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request log").len()
    }
}

/// A URL on which nothing is listening.
pub async fn dead_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}{}", addr, path)
}

async fn serve(mut stream: TcpStream, reply: StubReply, log: Arc<Mutex<Vec<RecordedRequest>>>) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    log.lock().expect("request log").push(request);

    let (status, content_type, body) = match reply {
        StubReply::Json(status, body) => (status, "application/json", body),
        StubReply::Raw(status, body) => (status, "text/html", body),
        StubReply::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            return;
        }
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason_phrase(status),
        content_type,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

struct RequestHead {
    header_len: usize,
    method: String,
    path: String,
    headers: Vec<(String, String)>,
}

fn parse_head(buf: &[u8]) -> Option<RequestHead> {
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut req = httparse::Request::new(&mut headers);
    match req.parse(buf) {
        Ok(httparse::Status::Complete(header_len)) => Some(RequestHead {
            header_len,
            method: req.method?.to_string(),
            path: req.path?.to_string(),
            headers: req
                .headers
                .iter()
                .map(|h| {
                    (
                        h.name.to_ascii_lowercase(),
                        String::from_utf8_lossy(h.value).to_string(),
                    )
                })
                .collect(),
        }),
        _ => None,
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(head) = parse_head(&buf) {
            break head;
        }
    };

    let content_length = head
        .headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head.header_len + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method: head.method,
        path: head.path,
        headers: head.headers,
        body: buf[head.header_len..].to_vec(),
    })
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
