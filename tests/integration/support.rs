//! Test doubles shared by the integration tests

use async_trait::async_trait;
use precache::http::{Request, Response};
use precache::network::Network;
use precache::{PrecacheError, PrecacheResult};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

pub const SCOPE: &str = "http://localhost:8080/";

/// In-memory site that counts requests per URL
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
    offline: Mutex<bool>,
}

impl FakeSite {
    pub fn new() -> Self {
        let mut site = Self::default();
        for path in ["", "index.html", "manifest.json", "app.js"] {
            site.pages
                .insert(format!("{}{}", SCOPE, path), format!("page:{}", path));
        }
        site
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }
}

#[async_trait]
impl Network for FakeSite {
    async fn fetch(&self, request: &Request) -> PrecacheResult<Response> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.url.clone())
            .or_default() += 1;

        if *self.offline.lock().unwrap() {
            return Err(PrecacheError::network(&request.url, "offline"));
        }

        Ok(match self.pages.get(&request.url) {
            Some(body) => Response::new(&request.url, 200, body.as_bytes().to_vec()),
            None => Response::new(&request.url, 404, b"missing".to_vec()),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Serve exactly `connections` plain-text responses on a local port, then
/// close the listener. Returns the base URL and the requested paths.
pub fn serve(connections: usize) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut paths = vec![];
        for stream in listener.incoming().take(connections) {
            let mut stream = stream.unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let read = stream.read(&mut chunk).unwrap();
                if read == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..read]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let head = String::from_utf8_lossy(&head);
            let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
            let body = format!("body of {}", path);
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
            paths.push(path);
        }
        paths
    });

    (format!("http://{}/", addr), handle)
}
