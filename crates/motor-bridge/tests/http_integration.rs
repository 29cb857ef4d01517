//! End-to-end tests for the HTTP surface.
//!
//! Each test binds a real listener on port 0, wires it to a scripted
//! [`MockCommandPort`], and talks to it over plain TCP sockets the way any
//! HTTP client would.  This exercises the full path the spec cares about:
//! socket → parse → route → dispatch → response → close.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use motor_bridge::application::{CommandPort, Dispatcher};
use motor_bridge::infrastructure::serial::MockCommandPort;
use motor_bridge::infrastructure::{HttpListener, Router};

/// A running test server plus handles to poke at it.
struct TestServer {
    addr: SocketAddr,
    mock: Arc<MockCommandPort>,
    running: Arc<AtomicBool>,
    // Held so the static root outlives the server.
    _static_root: tempfile::TempDir,
}

async fn spawn_server() -> TestServer {
    let static_root = tempfile::tempdir().unwrap();
    std::fs::write(static_root.path().join("index.html"), b"<h1>motors</h1>").unwrap();

    let mock = Arc::new(MockCommandPort::new());
    let dispatcher = Dispatcher::new(Arc::clone(&mock) as Arc<dyn CommandPort>);
    let router = Arc::new(Router::new(dispatcher, static_root.path().to_path_buf()));

    let listener = HttpListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        listener.serve(router, running_clone).await;
    });

    TestServer {
        addr,
        mock,
        running,
        _static_root: static_root,
    }
}

/// Sends raw bytes and returns everything the server wrote back before
/// closing the connection.
async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

/// Convenience GET returning (status code, body).
async fn get(addr: SocketAddr, path: &str) -> (u16, String) {
    let request = format!("GET {path} HTTP/1.1\r\nHost: test\r\n\r\n");
    let response = raw_exchange(addr, request.as_bytes()).await;
    split_response(&response)
}

fn split_response(response: &[u8]) -> (u16, String) {
    let text = String::from_utf8_lossy(response);
    let status: u16 = text
        .split_whitespace()
        .nth(1)
        .expect("status line present")
        .parse()
        .expect("numeric status");
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

// ── API behavior over real sockets ────────────────────────────────────────────

#[tokio::test]
async fn test_status_endpoint_relays_device_reply() {
    let server = spawn_server().await;
    server.mock.script_ack("STATUS OK");

    let (status, body) = get(server.addr, "/api/status").await;

    assert_eq!(status, 200);
    assert_eq!(body, r#"{"status":"STATUS OK"}"#);
}

#[tokio::test]
async fn test_status_endpoint_reports_no_reply_marker() {
    let server = spawn_server().await;
    server.mock.script_no_reply();

    let (status, body) = get(server.addr, "/api/status").await;

    assert_eq!(status, 200);
    assert_eq!(body, r#"{"status":"NO-REPLY"}"#);
}

#[tokio::test]
async fn test_start_with_clamped_speed_and_lowercase_dir() {
    let server = spawn_server().await;

    let (status, body) = get(server.addr, "/api/motor/3/start?speed=150&dir=ccw").await;

    assert_eq!(status, 200);
    assert_eq!(body, r#"{"ok":true}"#);
    assert_eq!(
        server.mock.sent_lines(),
        vec!["M3:START:100:CCW".to_string()]
    );
}

#[tokio::test]
async fn test_invalid_id_is_400_and_never_reaches_the_device() {
    let server = spawn_server().await;

    let (status, body) = get(server.addr, "/api/motor/10/start?speed=50").await;

    assert_eq!(status, 400);
    assert_eq!(body, r#"{"error":"invalid id; expected 1..9"}"#);
    assert!(server.mock.sent_lines().is_empty());
}

#[tokio::test]
async fn test_write_failure_maps_to_500() {
    let server = spawn_server().await;
    server.mock.script_write_failure();

    let (status, body) = get(server.addr, "/api/motor/1/stop").await;

    assert_eq!(status, 500);
    assert_eq!(body, r#"{"ok":false}"#);
}

#[tokio::test]
async fn test_post_is_accepted_on_motor_endpoints() {
    let server = spawn_server().await;

    let request = b"POST /api/motor/2/set?speed=40&dir=CW HTTP/1.1\r\nHost: t\r\nContent-Length: 0\r\n\r\n";
    let (status, body) = split_response(&raw_exchange(server.addr, request).await);

    assert_eq!(status, 200);
    assert_eq!(body, r#"{"ok":true}"#);
    assert_eq!(server.mock.sent_lines(), vec!["M2:SET:40:CW".to_string()]);
}

#[tokio::test]
async fn test_double_stop_is_idempotent_end_to_end() {
    let server = spawn_server().await;

    let first = get(server.addr, "/api/motor/7/stop").await;
    let second = get(server.addr, "/api/motor/7/stop").await;

    assert_eq!(first, second);
    assert_eq!(first.1, r#"{"ok":true}"#);
}

#[tokio::test]
async fn test_concurrent_requests_both_complete() {
    let server = spawn_server().await;

    let addr = server.addr;
    let a = tokio::spawn(async move { get(addr, "/api/motor/1/start?speed=10").await });
    let b = tokio::spawn(async move { get(addr, "/api/motor/2/start?speed=20").await });

    let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
    assert_eq!(ra.1, r#"{"ok":true}"#);
    assert_eq!(rb.1, r#"{"ok":true}"#);

    let mut lines = server.mock.sent_lines();
    lines.sort();
    assert_eq!(lines, vec!["M1:START:10:CW", "M2:START:20:CW"]);
}

// ── Transport behavior ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_response_closes_connection_despite_keep_alive() {
    let server = spawn_server().await;
    server.mock.script_ack("OK");

    let request = b"GET /api/status HTTP/1.1\r\nHost: t\r\nConnection: keep-alive\r\n\r\n";
    let response = raw_exchange(server.addr, request).await;
    let text = String::from_utf8_lossy(&response);

    // read_to_end returning at all proves the server closed the socket.
    assert!(text.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_content_length_matches_body() {
    let server = spawn_server().await;

    let response = raw_exchange(server.addr, b"GET /api/status HTTP/1.1\r\nHost: t\r\n\r\n").await;
    let text = String::from_utf8_lossy(&response);
    let (head, body) = text.split_once("\r\n\r\n").unwrap();

    let declared: usize = head
        .lines()
        .find_map(|l| l.strip_prefix("Content-Length: "))
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(declared, body.len());
}

#[tokio::test]
async fn test_malformed_request_is_dropped_without_response() {
    let server = spawn_server().await;

    let response = raw_exchange(server.addr, b"NONSENSE\r\n\r\n").await;

    assert!(response.is_empty(), "no response bytes for a malformed request");
    assert!(server.mock.sent_lines().is_empty());
}

// ── Static file serving ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_root_serves_index_page() {
    let server = spawn_server().await;

    let (status, body) = get(server.addr, "/").await;

    assert_eq!(status, 200);
    assert_eq!(body, "<h1>motors</h1>");
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let server = spawn_server().await;

    let (status, body) = get(server.addr, "/missing.html").await;

    assert_eq!(status, 404);
    assert_eq!(body, "Not Found");
}

#[tokio::test]
async fn test_non_get_outside_api_is_404() {
    let server = spawn_server().await;

    let request = b"POST /index.html HTTP/1.1\r\nHost: t\r\nContent-Length: 0\r\n\r\n";
    let (status, _) = split_response(&raw_exchange(server.addr, request).await);

    assert_eq!(status, 404);
}

// ── Shutdown ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_clearing_the_flag_stops_accepting() {
    let server = spawn_server().await;

    // Sanity: the server is up.
    let (status, _) = get(server.addr, "/api/status").await;
    assert_eq!(status, 200);

    // Act: clear the flag and give the accept loop time to notice (it polls
    // every 200 ms).
    server.running.store(false, Ordering::Relaxed);
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    // Assert: the listener socket is gone.
    assert!(TcpStream::connect(server.addr).await.is_err());
}
