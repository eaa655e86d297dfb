//! Network access for the build. Everything that talks to a remote host goes
//! through the [`Remote`] trait so the pipeline can be driven by
//! [`HttpRemote`] in production and by an in-memory fake in tests.

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const USER_AGENT: &str = concat!("projectpages/", env!("CARGO_PKG_VERSION"));

/// Metadata returned by a header-only request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Head {
    /// The value of the `Content-Length` header, if present and numeric.
    pub content_length: Option<u64>,
}

/// Read-only access to remote resources.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Retrieves the body of `url` as text. Non-success statuses are errors.
    async fn get(&self, url: &Url) -> Result<String>;

    /// Issues a header-only request against `url`. Non-success statuses are
    /// errors.
    async fn head(&self, url: &Url) -> Result<Head>;
}

/// A [`Remote`] backed by a [`reqwest::Client`]. Every request carries the
/// timeout the client was built with.
pub struct HttpRemote {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRemote {
    pub fn new(timeout: Duration) -> Result<HttpRemote> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;
        Ok(HttpRemote { client, timeout })
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| self.classify(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn classify(&self, url: &Url, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            Error::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn get(&self, url: &Url) -> Result<String> {
        tracing::debug!(url = %url, "GET");
        let response = self.send(self.client.get(url.clone()), url).await?;
        response.text().await.map_err(|e| self.classify(url, e))
    }

    async fn head(&self, url: &Url) -> Result<Head> {
        tracing::debug!(url = %url, "HEAD");
        let response = self.send(self.client.head(url.clone()), url).await?;

        // `Response::content_length` describes the (empty) HEAD body.
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        Ok(Head { content_length })
    }
}

/// The result of a fallible remote operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed remote operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the HTTP client can't be constructed.
    #[error("building HTTP client: {0}")]
    Client(String),

    /// Returned for connection, TLS, decoding and other transport problems.
    #[error("requesting `{url}`: {message}")]
    Transport { url: String, message: String },

    /// Returned when the remote answers with a non-success status.
    #[error("`{url}` returned status {status}")]
    Status { url: String, status: u16 },

    /// Returned when the request didn't complete in time.
    #[error("`{url}` timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}
