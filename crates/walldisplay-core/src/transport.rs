//! HTTP transport used by the sessioned client.
//!
//! The client only needs two request shapes: a GET with query parameters and
//! a form POST. Keeping them behind a trait lets tests script server replies.

use async_trait::async_trait;

use crate::error::Result;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A `200 OK` response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request/response transport holding the HTTP session (cookies).
///
/// Implementations report unreachable hosts as
/// [`WallDisplayError::Connection`](crate::WallDisplayError::Connection) and
/// return every received response, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with the given query parameters appended.
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse>;

    /// POST `form` as `application/x-www-form-urlencoded` to `url`.
    async fn post_form(
        &self,
        url: &str,
        query: &[(&str, String)],
        form: &[(&str, String)],
    ) -> Result<HttpResponse>;
}

#[cfg(feature = "http")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "http")]
mod reqwest_transport {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;

    use super::{HttpResponse, Transport};
    use crate::error::{Result, WallDisplayError};

    /// [`Transport`] backed by a `reqwest` client with a cookie store, so the
    /// Piwigo session cookie set at login is sent with later requests.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        /// Build a transport whose requests time out after `timeout`.
        pub fn new(timeout: Duration) -> Result<Self> {
            let client = Client::builder()
                .cookie_store(true)
                .timeout(timeout)
                .build()
                .map_err(|e| {
                    WallDisplayError::Configuration(format!("Cannot build HTTP client: {}", e))
                })?;
            Ok(Self { client })
        }

        async fn finish(request: reqwest::RequestBuilder) -> Result<HttpResponse> {
            let response = request
                .send()
                .await
                .map_err(|e| WallDisplayError::Connection(format!("HTTP request failed: {}", e)))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| WallDisplayError::Connection(format!("Body read error: {}", e)))?;

            Ok(HttpResponse { status, body })
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse> {
            Self::finish(self.client.get(url).query(query)).await
        }

        async fn post_form(
            &self,
            url: &str,
            query: &[(&str, String)],
            form: &[(&str, String)],
        ) -> Result<HttpResponse> {
            Self::finish(self.client.post(url).query(query).form(form)).await
        }
    }
}
