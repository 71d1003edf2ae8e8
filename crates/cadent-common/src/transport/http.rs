//! HTTP Transport
//!
//! GET-only transport used to reach cadent hosts.
//!
//! # Components
//!
//! - **[`Transport`]**: the seam the fetch engine talks through
//! - **[`HttpTransport`]**: hyper-util client implementation with a per-request timeout
//!
//! # Example
//!
//! ```no_run
//! use cadent_common::transport::{HttpTransport, Transport};
//! use cadent_common::PathsRequest;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new();
//! let body = transport
//!     .get("http://127.0.0.1:8083/paths", &PathsRequest::new("servers.*").params())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::ACCEPT;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;
use url::Url;

use crate::protocol::error::{CadentError, Result};
use crate::protocol::QueryParams;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A GET-capable transport.
///
/// `url` is the endpoint without a query string; `params` are appended in
/// order, repeated keys included.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, params: &QueryParams) -> impl Future<Output = Result<Bytes>> + Send;
}

/// HTTP transport backed by the hyper-util legacy client
///
/// The client pools connections per host, so one transport should be shared
/// by every request of a finder.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the default 30 second timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom per-request timeout
    ///
    /// The timeout covers connecting, sending and reading the whole body.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the full request URL
    ///
    /// # Example
    ///
    /// ```
    /// use cadent_common::transport::HttpTransport;
    ///
    /// let url = HttpTransport::build_url(
    ///     "http://127.0.0.1:8083/metrics",
    ///     &vec![("target".into(), "a.b".into()), ("target".into(), "c.d".into())],
    /// ).unwrap();
    /// assert_eq!(url, "http://127.0.0.1:8083/metrics?target=a.b&target=c.d");
    /// ```
    pub fn build_url(base: &str, params: &QueryParams) -> Result<String> {
        let mut url = Url::parse(base)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    async fn send(&self, url: &str) -> Result<Bytes> {
        let uri: Uri = url
            .parse()
            .map_err(|e| CadentError::InvalidUrl(format!("{}: {}", url, e)))?;

        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| CadentError::Transport(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| CadentError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CadentError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| CadentError::Transport(format!("Failed to read response: {}", e)))?
            .to_bytes();
        Ok(body)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, params: &QueryParams) -> Result<Bytes> {
        let url = Self::build_url(url, params)?;
        debug!("GET {}", url);

        tokio::time::timeout(self.timeout, self.send(&url))
            .await
            .map_err(|_| CadentError::Timeout(self.timeout.as_millis() as u64))?
    }
}
