//! HTTP client shared by the analysis engine and the issue tracker.
//!
//! Thin wrapper over reqwest: one configured `Client`, JSON posts with the
//! auth schemes the collaborators need, and a response wrapper. No retries;
//! callers surface failures as-is.

mod response;

pub use response::HttpResponse;

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const USER_AGENT: &str = concat!("policy-compass/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// How a request authenticates.
#[derive(Clone, Default)]
pub enum RequestAuth {
    #[default]
    None,
    /// Standard `Authorization: Basic` header.
    Basic { username: String, password: String },
    /// A single header carrying a key (e.g. `x-goog-api-key`).
    Header { name: &'static str, value: String },
}

impl std::fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Basic { username, .. } => write!(f, "Basic({}, <redacted>)", username),
            Self::Header { name, .. } => write!(f, "Header({}, <redacted>)", name),
        }
    }
}

/// Builder for `HttpClient`.
pub struct HttpClientBuilder {
    name: String,
    timeout: Duration,
}

impl HttpClientBuilder {
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .gzip(true)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(HttpClient {
            client,
            name: self.name,
        })
    }
}

/// HTTP client with request logging.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    name: String,
}

impl HttpClient {
    /// Start building a client. `name` identifies the collaborator in logs.
    pub fn builder(name: &str, timeout: Duration) -> HttpClientBuilder {
        HttpClientBuilder {
            name: name.to_string(),
            timeout,
        }
    }

    /// POST a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        auth: &RequestAuth,
    ) -> Result<HttpResponse, HttpError> {
        let mut request = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(body);

        request = match auth {
            RequestAuth::None => request,
            RequestAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            RequestAuth::Header { name, value } => request.header(*name, value),
        };

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        debug!(
            "{}: POST {} -> {} in {:?}",
            self.name,
            redact_query(url),
            status.as_u16(),
            start.elapsed()
        );

        Ok(HttpResponse::new(status, response))
    }
}

/// Strip the query string so keys passed as parameters never reach logs.
fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
