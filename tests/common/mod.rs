//! Scripted HTTP server shared by the integration tests.
//!
//! The same server plays the vendor endpoint and an HTTP proxy: it answers
//! every request, absolute-form proxy requests included, from a script.

#![allow(dead_code)]

use parking_lot::Mutex;
use reqwest_proxy_supply::{
    normalize, CheckerConfig, Logger, NormalizedProxy, RetryPolicy, VendorConfig, VendorSource,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const BACKOFF: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub enum Reply {
    Ok(String),
    Status(u16),
}

impl Reply {
    pub fn body(body: &str) -> Self {
        Reply::Ok(body.to_string())
    }
}

type Script = dyn Fn(usize) -> Reply + Send + Sync;

pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Answer request number `n` (zero based) with `script(n)`.
    pub async fn start<F>(script: F) -> Self
    where
        F: Fn(usize) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let script: Arc<Script> = Arc::new(script);

        let task = tokio::spawn({
            let requests = Arc::clone(&requests);
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let requests = Arc::clone(&requests);
                    let script = Arc::clone(&script);
                    tokio::spawn(async move {
                        let _ = serve(socket, requests, script).await;
                    });
                }
            }
        });

        Self { addr, requests, task }
    }

    /// Replay `replies` in order, repeating the last one forever.
    pub async fn sequence(replies: Vec<Reply>) -> Self {
        Self::start(move |n| replies[n.min(replies.len() - 1)].clone()).await
    }

    /// Always answer with `reply`.
    pub async fn always(reply: Reply) -> Self {
        Self::start(move |_| reply.clone()).await
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `ip:port` token as a vendor would list it.
    pub fn token(&self) -> String {
        format!("127.0.0.1:{}", self.port())
    }

    /// Normalized proxy URL for this server.
    pub fn proxy_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port())
    }

    /// This server as a normalized proxy.
    pub fn proxy(&self) -> NormalizedProxy {
        normalize(&self.token(), "", "").unwrap()
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port(), path_and_query)
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().len()
    }

    /// Request lines received so far, e.g. `GET /get?num=2 HTTP/1.1`.
    pub fn request_lines(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut socket: TcpStream,
    requests: Arc<Mutex<Vec<String>>>,
    script: Arc<Script>,
) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = socket.read(&mut buf).await?;
        if read == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..read]);
    }

    let request_line = String::from_utf8_lossy(&head)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();
    let reply = {
        let mut requests = requests.lock();
        requests.push(request_line);
        script(requests.len() - 1)
    };

    let (status, body) = match reply {
        Reply::Ok(body) => (200, body),
        Reply::Status(status) => (status, String::new()),
    };
    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A normalized proxy nothing listens on.
pub async fn dead_proxy() -> NormalizedProxy {
    normalize(&dead_addr().await.to_string(), "", "").unwrap()
}

/// Collects every message for assertions.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter_map(|line| line.strip_prefix("[WARN] ").map(ToString::to_string))
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str) {
        self.lines.lock().push(format!("[INFO] {}", message));
    }

    fn warn(&self, message: &str) {
        self.lines.lock().push(format!("[WARN] {}", message));
    }
}

pub fn checker_config() -> CheckerConfig {
    CheckerConfig::builder()
        .target_url("http://probe.invalid/")
        .timeout(Duration::from_secs(2))
        .build()
}

pub fn vendor_config(endpoint: String, retry: RetryPolicy) -> VendorConfig {
    VendorConfig::builder()
        .endpoint(endpoint)
        .request_timeout(Duration::from_secs(2))
        .retry(retry)
        .system_proxy(false)
        .build()
}

/// A source pointed at `vendor`'s `/get?num=${num}` with a short retry backoff.
pub fn vendor_source(vendor: &MockServer) -> VendorSource {
    let endpoint = vendor.url("/get?num=${num}");
    source_with(vendor_config(endpoint, RetryPolicy::unbounded(BACKOFF)))
}

pub fn source_with(config: VendorConfig) -> VendorSource {
    let _ = env_logger::builder().is_test(true).try_init();
    VendorSource::new(config).unwrap().with_checker(checker_config())
}
