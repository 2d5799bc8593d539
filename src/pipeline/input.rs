//! Input acquisition: CSV sources for rendering, JSON documents and Google
//! Drive files for extraction.
//!
//! ## Why download Drive files to a temp file?
//!
//! Extraction is path-based: the input's stem names the CSV and its
//! extension decides whether the plain-text fallback applies. Downloading to
//! a `TempDir` gives the extractor a real path while ensuring cleanup happens
//! automatically when `ResolvedInput` is dropped. CSV sources for rendering
//! are only needed as text, so they are fetched straight into memory.

use crate::error::RowKitError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Name given to a file downloaded from Google Drive.
pub const DOWNLOADED_FILE_NAME: &str = "downloaded_file";

static RE_DRIVE_PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").unwrap());
static RE_DRIVE_QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=([a-zA-Z0-9_-]+)").unwrap());

/// The resolved input: either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read the full text of a CSV source: an http(s) URL or a local path.
///
/// The body is decoded as UTF-8, replacing invalid sequences.
pub async fn load_csv_source(source: &str, timeout_secs: u64) -> Result<String, RowKitError> {
    let bytes = if is_url(source) {
        info!("Downloading CSV from: {}", source);
        fetch(source, timeout_secs).await?.1
    } else {
        read_local(Path::new(source)).await?
    };
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string())
}

async fn read_local(path: &Path) -> Result<Vec<u8>, RowKitError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(RowKitError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(RowKitError::InputNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Single GET. Returns the `Content-Type` header and the body.
async fn fetch(url: &str, timeout_secs: u64) -> Result<(Option<String>, Vec<u8>), RowKitError> {
    let failed = |reason: String| RowKitError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            RowKitError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(classify)?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response.bytes().await.map_err(classify)?;
    debug!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok((content_type, bytes.to_vec()))
}

// ── Google Drive ─────────────────────────────────────────────────────────

/// Extract a Drive file id from a sharing URL (`/d/<id>/` or `?id=<id>`).
pub fn drive_file_id(url: &str) -> Option<String> {
    RE_DRIVE_PATH_ID
        .captures(url)
        .or_else(|| RE_DRIVE_QUERY_ID.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Direct-download URL for a Drive file id.
pub fn drive_download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={file_id}")
}

/// Download a Drive file into a fresh temp directory as `downloaded_file`.
///
/// Drive answers with an HTML page when the file is not shared publicly or
/// needs a virus-scan confirmation; that is reported as a download failure.
pub async fn download_drive_file(
    file_id: &str,
    timeout_secs: u64,
) -> Result<ResolvedInput, RowKitError> {
    info!("Downloading Drive file {}", file_id);
    download_to_temp(&drive_download_url(file_id), timeout_secs).await
}

/// GET `url` into a temp directory, rejecting HTML responses.
async fn download_to_temp(url: &str, timeout_secs: u64) -> Result<ResolvedInput, RowKitError> {
    let (content_type, bytes) = fetch(url, timeout_secs).await?;
    if content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("text/html"))
    {
        return Err(RowKitError::DownloadFailed {
            url: url.to_string(),
            reason: "received an HTML page instead of the file; is it shared with 'Anyone with the link'?"
                .into(),
        });
    }

    let temp_dir = TempDir::new().map_err(|e| RowKitError::Internal(e.to_string()))?;
    let path = temp_dir.path().join(DOWNLOADED_FILE_NAME);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| RowKitError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", path.display());
    Ok(ResolvedInput::Downloaded {
        path,
        _temp_dir: temp_dir,
    })
}

// ── JSON documents ───────────────────────────────────────────────────────

/// Read and parse a JSON document.
///
/// `.txt` files that are not JSON as a whole are searched for the outermost
/// `{…}` or `[…]` span, which is parsed instead.
pub fn read_document(path: &Path) -> Result<Value, RowKitError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => RowKitError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => RowKitError::InputNotFound {
            path: path.to_path_buf(),
        },
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);

    let parse_error = match serde_json::from_str(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let is_txt = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
    if is_txt {
        if let Some(span) = json_span(text) {
            if let Ok(value) = serde_json::from_str(span) {
                warn!(
                    "{} is not pure JSON; using the embedded JSON block",
                    path.display()
                );
                return Ok(value);
            }
        }
    }

    Err(RowKitError::InvalidJson {
        path: path.to_path_buf(),
        detail: parse_error.to_string(),
    })
}

/// The span from the first `{` or `[` to the last matching closer.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// HTTP/1.1 response with a `Content-Length` header.
    fn http_response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Local server answering one request with `response`.
    async fn serve_once(response: String) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        addr
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/data.csv"));
        assert!(is_url("http://example.com/data.csv"));
        assert!(!is_url("/tmp/data.csv"));
        assert!(!is_url("data.csv"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_drive_file_id() {
        assert_eq!(
            drive_file_id("https://drive.google.com/file/d/1AbC-d_9/view?usp=sharing").as_deref(),
            Some("1AbC-d_9")
        );
        assert_eq!(
            drive_file_id("https://drive.google.com/open?id=XYZ123").as_deref(),
            Some("XYZ123")
        );
        assert_eq!(
            drive_file_id("https://drive.google.com/uc?export=download&id=q_w-e").as_deref(),
            Some("q_w-e")
        );
        assert_eq!(drive_file_id("https://example.com/nothing"), None);
    }

    #[test]
    fn test_drive_download_url() {
        assert_eq!(
            drive_download_url("abc"),
            "https://drive.google.com/uc?export=download&id=abc"
        );
    }

    #[test]
    fn test_json_span() {
        assert_eq!(json_span("log: {\"a\": 1} end"), Some("{\"a\": 1}"));
        assert_eq!(json_span("x [1, [2]] y"), Some("[1, [2]]"));
        assert_eq!(json_span("no json here"), None);
        assert_eq!(json_span("} {"), None);
    }

    #[test]
    fn test_read_document_txt_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("capture.txt");
        std::fs::write(&txt, "Response:\n{\"k\": [1, 2]}\n-- end --").unwrap();
        assert_eq!(read_document(&txt).unwrap(), serde_json::json!({"k": [1, 2]}));

        // The fallback is limited to .txt inputs.
        let json = dir.path().join("capture.json");
        std::fs::write(&json, "Response:\n{\"k\": 1}").unwrap();
        assert!(matches!(
            read_document(&json),
            Err(RowKitError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_read_document_missing() {
        let err = read_document(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, RowKitError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_csv_source_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, b"\xEF\xBB\xBFa,b\n1,\xFF\n").unwrap();
        let text = load_csv_source(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(text, "a,b\n1,\u{FFFD}\n");

        let missing = load_csv_source("/no/such/file.csv", 5).await;
        assert!(matches!(missing, Err(RowKitError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn test_load_csv_source_http() {
        let addr = serve_once(http_response("200 OK", "text/csv", "a,b\n1,2\n")).await;
        let text = load_csv_source(&format!("http://{addr}/data.csv"), 5)
            .await
            .unwrap();
        assert_eq!(text, "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_http_error_status_is_download_failure() {
        let addr = serve_once(http_response("404 Not Found", "text/plain", "gone")).await;
        let err = load_csv_source(&format!("http://{addr}/data.csv"), 5)
            .await
            .unwrap_err();
        match err {
            RowKitError::DownloadFailed { reason, .. } => assert!(reason.contains("404"), "{reason}"),
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_html_page_is_rejected_as_download() {
        let addr = serve_once(http_response(
            "200 OK",
            "text/html; charset=utf-8",
            "<html>Sign in</html>",
        ))
        .await;
        let err = download_to_temp(&format!("http://{addr}/uc?id=abc"), 5)
            .await
            .unwrap_err();
        match err {
            RowKitError::DownloadFailed { reason, .. } => assert!(reason.contains("HTML"), "{reason}"),
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_to_temp_writes_body() {
        let addr = serve_once(http_response(
            "200 OK",
            "application/octet-stream",
            "{\"k\": 1}",
        ))
        .await;
        let input = download_to_temp(&format!("http://{addr}/uc?id=abc"), 5)
            .await
            .unwrap();
        assert!(input.path().ends_with(DOWNLOADED_FILE_NAME));
        assert_eq!(std::fs::read_to_string(input.path()).unwrap(), "{\"k\": 1}");
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });
        let err = load_csv_source(&format!("http://{addr}/slow.csv"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RowKitError::DownloadTimeout { secs: 1, .. }), "{err:?}");
    }
}
