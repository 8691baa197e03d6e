// madj-net/src/http.rs
use std::time::Duration;

use madj_common::error::{MadjError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, error};

use crate::validation::validate_url;

const DOWNLOAD_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 15;
const USER_AGENT_STRING: &str = concat!("madj/", env!("CARGO_PKG_VERSION"), " (Rust)");

pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| MadjError::HttpError(format!("Failed to build HTTP client: {e}")))
}

/// Downloads whole application files into memory. They are small (scripts, a manifest, an
/// icon), so there is no streaming to disk here.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        validate_url(url)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            debug!("HTTP request failed for {url}: {e}");
            MadjError::HttpError(format!("HTTP request failed for {url}: {e}"))
        })?;
        let status = response.status();
        debug!("Received HTTP status: {} for {}", status, url);

        if !status.is_success() {
            error!("HTTP error {} for URL {}", status, url);
            let resource = url.rsplit('/').next().unwrap_or(url).to_string();
            return Err(match status {
                StatusCode::NOT_FOUND => MadjError::DownloadError(
                    resource,
                    url.to_string(),
                    "Resource not found (404)".to_string(),
                ),
                StatusCode::FORBIDDEN => MadjError::DownloadError(
                    resource,
                    url.to_string(),
                    "Access forbidden (403)".to_string(),
                ),
                _ => MadjError::HttpError(format!("HTTP error {status} for URL {url}")),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MadjError::HttpError(format!("Failed to read response body bytes: {e}")))?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves exactly one canned HTTP response on a loopback port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> u16 {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        port
    }

    #[tokio::test]
    async fn fetches_body_on_success() {
        let port = serve_once("200 OK", "print('hello')").await;
        let fetcher = HttpFetcher::new().unwrap();
        let bytes = fetcher
            .fetch_bytes(&format!("http://127.0.0.1:{port}/app.py"))
            .await
            .unwrap();
        assert_eq!(bytes, b"print('hello')");
    }

    #[tokio::test]
    async fn not_found_is_a_download_error() {
        let port = serve_once("404 Not Found", "").await;
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch_bytes(&format!("http://127.0.0.1:{port}/missing.py"))
            .await
            .unwrap_err();
        assert!(matches!(err, MadjError::DownloadError(name, _, _) if name == "missing.py"));
    }

    #[tokio::test]
    async fn remote_plain_http_is_refused_before_connecting() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch_bytes("http://example.invalid/app.py")
            .await
            .unwrap_err();
        assert!(matches!(err, MadjError::ValidationError(_)));
    }
}
