//! HTTP transport listener: accept loop and minimal request handling.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address (fatal on failure —
//!    no retry).
//! 2. Accepting connections in a loop that polls the shutdown flag.
//! 3. Parsing *just enough* HTTP per connection: the request line plus a
//!    header table in which only `content-length` is interpreted; every
//!    other header is ignored.
//! 4. Routing `/api` paths to the dispatcher and other GET paths to the
//!    static resolver.
//! 5. Writing exactly one `Connection: close` response and closing the
//!    socket, regardless of any keep-alive the client asked for.
//!
//! This is deliberately not a framework: no keep-alive, no pipelining, no
//! chunked transfer, no TLS.  A request that cannot be parsed is dropped
//! without a response — there is no safe way to answer it.
//!
//! # Scalability
//!
//! Each connection runs in its own Tokio task; the accept loop never blocks
//! on a slow peer.  Requests that reach the serial channel still serialize
//! against each other there — that is the hardware's constraint, not the
//! listener's.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use percent_encoding::percent_decode_str;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::dispatch::Dispatcher;
use crate::application::port::CommandPort;
use crate::domain::BridgeConfig;
use crate::infrastructure::static_files;

/// Upper bound on the request head (request line + headers).  Anything
/// larger is malformed for this API's purposes.
const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Upper bound on an accepted body.  The motor API ignores bodies, so this
/// only guards memory against a hostile content-length.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Socket-level bound on any single read, so a stalled peer cannot pin a
/// connection task forever.
const CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(10);

// ── Parsed request ────────────────────────────────────────────────────────────

/// One parsed HTTP exchange, alive for exactly one connection.
#[derive(Debug, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Raw request target (path plus optional query), not yet decoded.
    pub target: String,
    pub body: Vec<u8>,
}

/// Reads one request from the stream.
///
/// `None` means the request was malformed (read error, orderly close, or an
/// oversize head before the terminator) — the caller drops the connection
/// without responding.  A body shorter than its content-length is *not*
/// malformed: the peer disconnecting early yields whatever arrived.
pub(crate) async fn read_request<S>(stream: &mut S) -> Option<Request>
where
    S: AsyncRead + Unpin,
{
    // Accumulate until the header-terminator sequence appears.
    let mut head = Vec::new();
    let split = loop {
        if let Some(pos) = find_terminator(&head) {
            break pos;
        }
        if head.len() > MAX_HEAD_BYTES {
            debug!("request head exceeds {MAX_HEAD_BYTES} bytes; dropping");
            return None;
        }
        let mut buf = [0u8; 4096];
        match timeout(CLIENT_READ_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(0)) => return None, // closed before the head completed
            Ok(Ok(n)) => head.extend_from_slice(&buf[..n]),
            Ok(Err(e)) => {
                debug!("read error before head complete: {e}");
                return None;
            }
            Err(_) => {
                debug!("client stalled before head complete; dropping");
                return None;
            }
        }
    };

    let mut body: Vec<u8> = head.split_off(split + 4);
    head.truncate(split);
    let head_text = String::from_utf8_lossy(&head).into_owned();

    let mut lines = head_text.split("\r\n");
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") || parts.next().is_some() {
        debug!("malformed request line: {request_line:?}");
        return None;
    }

    // Headers are a closed set from our point of view: content-length is the
    // only one interpreted, all others ignored.
    let mut content_length: usize = 0;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    if content_length > MAX_BODY_BYTES {
        debug!("content-length {content_length} exceeds cap; dropping");
        return None;
    }

    // Collect body bytes until content-length is satisfied or the peer goes
    // away; never block indefinitely on a body that stops arriving.
    body.truncate(content_length);
    while body.len() < content_length {
        let mut buf = vec![0u8; (content_length - body.len()).min(4096)];
        match timeout(CLIENT_READ_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break, // early disconnect: proceed with what we have
            Ok(Ok(n)) => body.extend_from_slice(&buf[..n]),
            Ok(Err(_)) | Err(_) => break,
        }
    }

    Some(Request {
        method,
        target,
        body,
    })
}

/// Finds the `\r\n\r\n` head terminator, returning its start offset.
fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Writes one complete response and lets the caller close the socket.
pub(crate) async fn write_response<S>(
    stream: &mut S,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n",
        reason = reason_phrase(status),
        len = body.len(),
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Decides, per request, between the API dispatcher and the static resolver.
pub struct Router {
    dispatcher: Dispatcher,
    static_root: PathBuf,
}

impl Router {
    /// Creates a router over the given dispatcher and static root.
    pub fn new(dispatcher: Dispatcher, static_root: PathBuf) -> Self {
        Self {
            dispatcher,
            static_root,
        }
    }

    /// Produces the `(status, content type, body)` triple for one request.
    pub async fn handle(&self, request: &Request) -> (u16, String, Vec<u8>) {
        let (raw_path, query) = match request.target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (request.target.as_str(), ""),
        };
        let path = percent_decode_str(raw_path).decode_utf8_lossy();

        if path.starts_with("/api") {
            let resp = self
                .dispatcher
                .dispatch(&request.method, &path, query, &request.body)
                .await;
            return (
                resp.status,
                resp.content_type.to_string(),
                resp.body.into_bytes(),
            );
        }

        if request.method == "GET" {
            let resp = static_files::resolve(&self.static_root, &path).await;
            return (resp.status, resp.content_type.to_string(), resp.body);
        }

        (404, "text/plain".to_string(), b"Not Found".to_vec())
    }
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// The bound TCP listener, separated from `serve` so tests can bind port 0
/// and learn the assigned address before driving requests at it.
pub struct HttpListener {
    listener: TcpListener,
}

impl HttpListener {
    /// Binds the listener.  Bind failure (address in use, permission) is
    /// fatal at startup; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns the bind error with address context.
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;
        Ok(Self { listener })
    }

    /// Returns the actual bound address (useful after binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until `running` is set to `false`.
    ///
    /// Each accepted connection is handed to its own Tokio task immediately,
    /// so a slow or stalled peer never delays other clients from connecting.
    /// The short accept timeout exists only so the loop can poll the
    /// shutdown flag while idle.
    pub async fn serve(self, router: Arc<Router>, running: Arc<AtomicBool>) {
        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            match timeout(Duration::from_millis(200), self.listener.accept()).await {
                Ok(Ok((stream, peer_addr))) => {
                    let router = Arc::clone(&router);
                    tokio::spawn(async move {
                        handle_connection(stream, peer_addr, router).await;
                    });
                }
                Ok(Err(e)) => {
                    // Transient accept error (e.g. out of file descriptors).
                    // Local to the attempt; keep accepting.
                    error!("accept error: {e}");
                }
                Err(_) => {
                    // Timeout — no connection in the last 200 ms; poll the
                    // running flag again.
                }
            }
        }
    }
}

/// Top-level handler for one connection; wraps [`serve_connection`] and logs
/// the outcome so the inner function can use `?` freely.
async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, router: Arc<Router>) {
    match serve_connection(stream, router).await {
        Ok(true) => debug!("{peer_addr}: request served"),
        Ok(false) => debug!("{peer_addr}: malformed request dropped"),
        Err(e) => warn!("{peer_addr}: connection error: {e}"),
    }
}

/// Parse → route → respond for one connection.  Returns `Ok(false)` when the
/// request was malformed and dropped without a response.
async fn serve_connection(mut stream: TcpStream, router: Arc<Router>) -> std::io::Result<bool> {
    let Some(request) = read_request(&mut stream).await else {
        return Ok(false);
    };

    let (status, content_type, body) = router.handle(&request).await;
    write_response(&mut stream, status, &content_type, &body).await?;
    Ok(true)
}

// ── Entry point used by main ──────────────────────────────────────────────────

/// Binds and runs the bridge's HTTP surface until `running` clears.
///
/// # Errors
///
/// Returns an error only for listener-level failures at startup; per
/// connection errors are handled locally.
pub async fn run_server(
    config: BridgeConfig,
    port: Arc<dyn CommandPort>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = HttpListener::bind(config.http_bind_addr).await?;
    let addr = listener.local_addr()?;
    info!(
        "HTTP serving {} on http://{addr}",
        config.static_root.display()
    );

    let router = Arc::new(Router::new(Dispatcher::new(port), config.static_root));
    listener.serve(router, running).await;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
//
// End-to-end listener behavior (real sockets, JSON bodies) lives in
// tests/http_integration.rs; these cover the parser state machine.
