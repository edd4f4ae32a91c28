//! HTTP donor source.

use std::time::Duration;

use tracing::{debug, warn};

use super::{parse_payload, DonorSource, Result, SourceError};
use crate::donor::RawDonor;
use crate::error::Error;

/// Fetches donors with a single GET request.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source for `url` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> std::result::Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::HttpClient)?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// The endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl DonorSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<RawDonor>> {
        let request_error = |source| SourceError::Request {
            url: self.url.clone(),
            source,
        };

        debug!(url = %self.url, "Fetching donors");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "Donor source returned an error status");
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(request_error)?;
        parse_payload(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{ViewCoordinator, Views};
    use crate::geo::RegionTable;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned response on a loopback port and return its URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        });
        format!("http://{addr}/api/donors")
    }

    #[test]
    fn test_new_keeps_url() {
        let source = HttpSource::new("http://localhost:8080/api/donors", Duration::from_secs(5))
            .unwrap();
        assert_eq!(source.url(), "http://localhost:8080/api/donors");
        assert_eq!(source.describe(), "http://localhost:8080/api/donors");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let source =
            HttpSource::new("http://127.0.0.1:9/api/donors", Duration::from_secs(2)).unwrap();
        let result = source.fetch().await;
        assert!(matches!(result, Err(SourceError::Request { .. })));
    }

    #[tokio::test]
    async fn test_fetch_parses_success_body() {
        let url = serve_once(
            "200 OK",
            r#"[{"_id": "1", "name": "Nimal", "address": "1 Lake Rd, Colombo"}]"#,
        )
        .await;
        let source = HttpSource::new(url, Duration::from_secs(5)).unwrap();
        let payloads = source.fetch().await.unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].id, Some(serde_json::Value::from("1")));
    }

    #[tokio::test]
    async fn test_error_status_is_status_error() {
        let url = serve_once("500 Internal Server Error", r#"{"error": "down"}"#).await;
        let source = HttpSource::new(url, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            source.fetch().await,
            Err(SourceError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_error_status_makes_views_unavailable() {
        let url = serve_once("500 Internal Server Error", "").await;
        let source = HttpSource::new(url, Duration::from_secs(5)).unwrap();
        let mut coordinator = ViewCoordinator::new(RegionTable::default());
        match coordinator.load(&source).await.views() {
            Views::Unavailable { reason } => assert!(reason.contains("HTTP 500")),
            other => panic!("expected unavailable views, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_parse_error() {
        let url = serve_once("200 OK", "<html>maintenance</html>").await;
        let source = HttpSource::new(url, Duration::from_secs(5)).unwrap();
        assert!(matches!(source.fetch().await, Err(SourceError::Parse(_))));
    }
}
