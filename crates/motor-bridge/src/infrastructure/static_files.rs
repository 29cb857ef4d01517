//! Static asset resolver.
//!
//! Collaborator territory for the bridge: GET paths outside `/api` map to
//! files under the configured static root.  `/` serves `index.html`, any
//! `..` segment is rejected outright, and unknown files are a plain 404.

use std::path::Path;

use tracing::debug;

/// A resolved static response: status, content type, body bytes.
pub struct StaticResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Resolves a decoded request path against the static root.
///
/// Missing files and traversal attempts are both 404 — the client learns
/// nothing about why.
pub async fn resolve(root: &Path, request_path: &str) -> StaticResponse {
    let path = if request_path == "/" {
        "/index.html"
    } else {
        request_path
    };

    // No path may escape the root. Rejecting ".." segments is sufficient
    // because the path was percent-decoded before it got here.
    if path.split('/').any(|segment| segment == "..") {
        debug!("rejected traversal attempt: {request_path}");
        return not_found();
    }

    let file_path = root.join(path.trim_start_matches('/'));
    match tokio::fs::read(&file_path).await {
        Ok(body) => StaticResponse {
            status: 200,
            content_type: content_type_for(path),
            body,
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> StaticResponse {
    StaticResponse {
        status: 404,
        content_type: "text/plain",
        body: b"Not Found".to_vec(),
    }
}

/// Content type by file extension.  Unknown extensions fall back to
/// `text/plain`, matching what the firmware's little control page needs.
fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "text/plain",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
