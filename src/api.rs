//! HTTP access to the content search API.
//!
//! The pipeline never talks to `reqwest` directly. It goes through the
//! [`PageSource`] trait so the enumerator and fetcher can be driven by an
//! in-memory source in tests.
//!
//! # Architecture
//!
//! - [`PageSource`]: Core trait, "GET this URL and hand me the body"
//! - [`HttpPageSource`]: The real implementation on top of `reqwest::Client`
//!
//! There is deliberately no retry layer: a failed request aborts the run.

use std::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::Result;
use crate::utils::redact_api_key;

/// Something that can return the body of a search API URL.
pub trait PageSource {
    /// Issue one GET and return the response body.
    ///
    /// Implementations must fail on transport errors and non-2xx statuses.
    async fn get_body(&self, url: &Url) -> Result<String>;
}

/// [`PageSource`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl PageSource for HttpPageSource {
    #[instrument(level = "debug", skip_all, fields(url = %redact_api_key(url)))]
    async fn get_body(&self, url: &Url) -> Result<String> {
        let t0 = Instant::now();
        let res = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let dt = t0.elapsed();

        let response = match res {
            Ok(r) => r,
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "GET failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.text().await?;
        debug!(
            %status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "GET succeeded"
        );
        Ok(body)
    }
}

/// In-memory [`PageSource`] for tests.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::error::PipelineError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned bodies keyed by the URL's `page` parameter
    /// (`None` for the page-less probe URL) and records every request.
    #[derive(Debug, Default)]
    pub struct FakePageSource {
        bodies: HashMap<Option<u32>, String>,
        pub requested: RefCell<Vec<Url>>,
    }

    impl FakePageSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_body(mut self, page: Option<u32>, body: impl Into<String>) -> Self {
            self.bodies.insert(page, body.into());
            self
        }

        pub fn requested_pages(&self) -> Vec<Option<u32>> {
            self.requested.borrow().iter().map(page_param).collect()
        }
    }

    pub fn page_param(url: &Url) -> Option<u32> {
        url.query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
    }

    /// One search result item as the API would render it.
    pub fn result_json(id: &str, date: &str, wordcount: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "article",
            "sectionId": "politics",
            "sectionName": "Politics",
            "webPublicationDate": date,
            "webTitle": format!("Title of {id}"),
            "webUrl": format!("https://www.theguardian.com/{id}"),
            "apiUrl": format!("https://content.guardianapis.com/{id}"),
            "isHosted": false,
            "pillarId": "pillar/news",
            "pillarName": "News",
            "fields": { "wordcount": wordcount }
        })
    }

    /// A full page body with the given pagination metadata and items.
    pub fn page_body(pages: u32, page_size: usize, results: Vec<serde_json::Value>) -> String {
        serde_json::json!({
            "response": {
                "status": "ok",
                "pages": pages,
                "pageSize": page_size,
                "results": results
            }
        })
        .to_string()
    }

    /// Answer exactly one request on a local port with a canned response.
    ///
    /// Returns a search URL (carrying an `api-key`) pointing at that port.
    pub async fn serve_once(status: &'static str, body: &'static str) -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        Url::parse(&format!("http://{addr}/search?q=Brexit&api-key=k&page=1")).unwrap()
    }

    /// An [`HttpPageSource`] that ignores any proxy configured in the environment.
    pub fn local_http_source() -> HttpPageSource {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpPageSource::with_client(client)
    }

    impl PageSource for FakePageSource {
        async fn get_body(&self, url: &Url) -> Result<String> {
            self.requested.borrow_mut().push(url.clone());
            self.bodies.get(&page_param(url)).cloned().ok_or_else(|| {
                PipelineError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no canned body for {url}"),
                ))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{local_http_source, serve_once};
    use super::*;
    use crate::error::PipelineError;

    #[tokio::test]
    async fn test_get_body_returns_body_on_200() {
        let url = serve_once("200 OK", r#"{"response":{"pages":1}}"#).await;
        let body = local_http_source().get_body(&url).await.unwrap();
        assert_eq!(body, r#"{"response":{"pages":1}}"#);
    }

    #[tokio::test]
    async fn test_get_body_fails_on_server_error() {
        let url = serve_once("500 Internal Server Error", "upstream exploded").await;
        let err = local_http_source().get_body(&url).await.unwrap_err();
        match err {
            PipelineError::Http(e) => {
                assert_eq!(e.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_body_fails_on_client_error() {
        let url = serve_once("401 Unauthorized", r#"{"message":"Unauthorized"}"#).await;
        let err = local_http_source().get_body(&url).await.unwrap_err();
        assert!(matches!(err, PipelineError::Http(_)));
    }
}
