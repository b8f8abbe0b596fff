//! HTTP client with certificate pinning.
//!
//! Every request opens a fresh HTTP/1.1 connection through a
//! [`SecureConnector`], so every request runs a full trust evaluation of the
//! server chain, pin check included.
//!
//! # Example
//!
//! ```rust,ignore
//! use certpin::PinnedClient;
//!
//! let client = PinnedClient::builder()
//!     .fingerprint("7A:5C:EC:...:67:B3")
//!     .base_url("https://example.com")
//!     .build()?;
//!
//! let resp = client.get("/status").send().await?;
//! ```

use crate::base::neterror::NetError;
use crate::http::HttpResponse;
use crate::socket::connector::{ConnectError, SecureConnector};
use crate::socket::tls::TlsConfig;
use crate::tls::error::CertificateError;
use crate::tls::pinning::{PinningSpec, PinningSpecBuilder};
use crate::tls::truststore::TrustStore;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, HOST};
use http::{Method, Request};
use http_body_util::Full;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failure of a pinned HTTP request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("connection failed")]
    Connect(#[from] ConnectError),

    #[error("HTTP exchange failed: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(#[from] http::Error),

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Net(#[from] NetError),
}

impl ClientError {
    /// Certificate failure behind this error, if any.
    pub fn certificate_error(&self) -> Option<&CertificateError> {
        match self {
            ClientError::Connect(err) => err.certificate_error(),
            _ => None,
        }
    }

    pub fn is_pinning_mismatch(&self) -> bool {
        self.certificate_error()
            .is_some_and(CertificateError::is_pinning_mismatch)
    }

    /// Chromium error code for this failure.
    pub fn net_error(&self) -> NetError {
        match self {
            ClientError::InvalidUrl(_) | ClientError::Request(_) => NetError::InvalidUrl,
            ClientError::Connect(err) => err.net_error(),
            ClientError::Http(err) => http_net_error(err),
            ClientError::Timeout => NetError::ConnectionTimedOut,
            ClientError::Net(err) => *err,
        }
    }
}

/// Pinned HTTP client.
///
/// Use [`PinnedClient::builder()`] to configure and create a client.
#[derive(Clone, Debug)]
pub struct PinnedClient {
    connector: Arc<SecureConnector>,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl PinnedClient {
    /// Create a new client builder with no pins.
    pub fn builder() -> PinnedClientBuilder {
        PinnedClientBuilder::default()
    }

    /// Client pinning `spec` over the platform trust store.
    pub fn new(spec: PinningSpec) -> Result<Self, ClientError> {
        Self::builder().spec(&spec).build()
    }

    pub fn connector(&self) -> &SecureConnector {
        &self.connector
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start building a PUT request.
    pub fn put<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start building a DELETE request.
    pub fn delete<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Resolve a request URL against the base URL.
    pub fn resolve(&self, url: &str) -> Result<Url, ClientError> {
        Ok(match &self.base_url {
            Some(base) => base.join(url)?,
            None => Url::parse(url)?,
        })
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<HttpResponse, ClientError> {
        let stream = self.connector.connect(&url).await?;
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "http connection closed with error");
            }
        });

        let mut request = Request::builder()
            .method(method)
            .uri(request_target(&url))
            .body(Full::new(body))?;
        let request_headers = request.headers_mut();
        request_headers.extend(self.default_headers.clone());
        request_headers.extend(headers);
        if !request_headers.contains_key(HOST) {
            let host = HeaderValue::from_str(&host_header(&url)).map_err(http::Error::from)?;
            request_headers.insert(HOST, host);
        }

        tracing::debug!(method = %request.method(), url = %url, "sending pinned request");
        let response = sender.send_request(request).await?;
        Ok(HttpResponse::read(response).await?)
    }
}

fn http_net_error(err: &hyper::Error) -> NetError {
    if err.is_incomplete_message() {
        NetError::EmptyResponse
    } else if err.is_parse() {
        NetError::InvalidHttpResponse
    } else if err.is_closed() || err.is_canceled() {
        NetError::ConnectionClosed
    } else {
        NetError::InvalidResponse
    }
}

fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Builder for creating a [`PinnedClient`].
#[derive(Default)]
pub struct PinnedClientBuilder {
    pins: PinningSpecBuilder,
    base_url: Option<String>,
    trust_store: Option<TrustStore>,
    tls_config: Option<TlsConfig>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl PinnedClientBuilder {
    /// Append an accepted public key fingerprint.
    pub fn fingerprint(mut self, sha: impl Into<String>) -> Self {
        self.pins = self.pins.with_sha(sha);
        self
    }

    /// Replace the accepted fingerprints with those of `spec`.
    pub fn spec(mut self, spec: &PinningSpec) -> Self {
        self.pins = spec
            .fingerprints()
            .iter()
            .fold(PinningSpecBuilder::new(), |pins, sha| pins.with_sha(sha.as_str()));
        self
    }

    /// Base URL relative request paths are joined with.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Roots for baseline validation instead of the platform store.
    pub fn trust_store(mut self, store: TrustStore) -> Self {
        self.trust_store = Some(store);
        self
    }

    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Header sent with every request unless the request overrides it.
    pub fn default_header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.default_headers.insert(key, val);
        }
        self
    }

    /// Set request timeout, covering connect, handshake and response.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PinnedClient, ClientError> {
        let base_url = self.base_url.as_deref().map(Url::parse).transpose()?;
        let store = match self.trust_store {
            Some(store) => store,
            None => TrustStore::platform().map_err(ConnectError::TrustStore)?,
        };
        let tls_config = self.tls_config.unwrap_or_default();
        let connector = SecureConnector::with_options(self.pins.build(), &store, &tls_config)?;

        Ok(PinnedClient {
            connector: Arc::new(connector),
            base_url,
            default_headers: self.default_headers,
            timeout: self.timeout,
        })
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: PinnedClient,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    /// Add a header.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.headers.insert(key, val);
        }
        self
    }

    /// Set request body.
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Set JSON body.
    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, json: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(json) {
            self.body = Bytes::from(bytes);
            self.headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Send the request.
    pub async fn send(self) -> Result<HttpResponse, ClientError> {
        let url = self.client.resolve(&self.url)?;
        let exchange = self
            .client
            .execute(self.method, url, self.headers, self.body);

        match self.client.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| ClientError::Timeout)?,
            None => exchange.await,
        }
    }
}
