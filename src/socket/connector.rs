//! TLS connector enforcing certificate pins.
//!
//! [`SecureConnector`] owns a BoringSSL connector and a trust evaluator.
//! Every handshake it performs hands the server chain to the evaluator, so a
//! server with a valid chain but an unpinned key is refused.
//!
//! ```rust,ignore
//! use certpin::socket::connector::SecureConnector;
//!
//! let connector = SecureConnector::from_fingerprint("7A:5C:EC:...:67:B3")?;
//! let stream = connector.connect(&"https://example.com".parse()?).await?;
//! ```

use crate::base::neterror::NetError;
use crate::socket::connectjob::{bare_host, require_https, target_of, ConnectJob};
use crate::socket::tls::{take_verdict, verify_callback, TlsConfig, Verdict};
use crate::tls::config::PinningConfig;
use crate::tls::error::CertificateError;
use crate::tls::evaluator::TrustEvaluator;
use crate::tls::factory::PinningTrustEvaluatorFactory;
use crate::tls::pinning::PinningSpec;
use crate::tls::truststore::{PlatformTrustStore, TrustStore};
use boring::error::ErrorStack;
use boring::ssl::{SslConnector, SslMethod, SslVerifyMode};
use boring::x509::X509;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_boring::SslStream;
use url::Url;

/// Failure to establish a pinned TLS connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The server certificate chain was rejected during the handshake.
    #[error("server certificate rejected")]
    Certificate(#[source] CertificateError),

    /// The trust store could not be loaded.
    #[error("trust store unavailable")]
    TrustStore(#[source] CertificateError),

    #[error("TLS setup failed: {0}")]
    Ssl(#[from] ErrorStack),

    #[error(transparent)]
    Net(#[from] NetError),
}

impl ConnectError {
    /// Certificate failure behind this error, if any.
    pub fn certificate_error(&self) -> Option<&CertificateError> {
        match self {
            ConnectError::Certificate(err) => Some(err),
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
            ConnectError::Certificate(err) => err.net_error(),
            ConnectError::TrustStore(_) | ConnectError::Ssl(_) => NetError::SslProtocolError,
            ConnectError::Net(err) => *err,
        }
    }
}

/// TLS client connector whose trust decision is a pinning evaluator.
pub struct SecureConnector {
    connector: SslConnector,
    evaluator: Arc<dyn TrustEvaluator>,
}

impl fmt::Debug for SecureConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureConnector").finish_non_exhaustive()
    }
}

impl SecureConnector {
    /// Connector pinning `spec` over the platform trust store.
    pub fn new(spec: PinningSpec) -> Result<Self, ConnectError> {
        let store = TrustStore::platform().map_err(ConnectError::TrustStore)?;
        Self::with_trust_store(spec, store)
    }

    /// Connector pinning a single fingerprint over the platform trust store.
    pub fn from_fingerprint(sha: impl Into<String>) -> Result<Self, ConnectError> {
        Self::new(PinningSpec::from_fingerprint(sha))
    }

    /// Connector built from a pinning configuration file.
    pub fn from_config(config: &PinningConfig) -> Result<Self, ConnectError> {
        let store =
            TrustStore::from_parameters(&config.trust_store).map_err(ConnectError::TrustStore)?;
        Self::with_trust_store(config.spec(), store)
    }

    /// Connector pinning `spec` over an explicit trust store.
    pub fn with_trust_store(spec: PinningSpec, store: TrustStore) -> Result<Self, ConnectError> {
        Self::with_options(spec, &store, &TlsConfig::default())
    }

    pub fn with_options(
        spec: PinningSpec,
        store: &TrustStore,
        tls_config: &TlsConfig,
    ) -> Result<Self, ConnectError> {
        let source = PlatformTrustStore::from_store(store).map_err(ConnectError::TrustStore)?;
        let factory = PinningTrustEvaluatorFactory::with_delegate_source(spec, Box::new(source));
        Self::from_factory(&factory, store, tls_config)
    }

    /// Connector using the evaluator produced by `factory`.
    ///
    /// `store` becomes the TLS stack's own root store, checked before the
    /// evaluator runs.
    pub fn from_factory(
        factory: &PinningTrustEvaluatorFactory,
        store: &TrustStore,
        tls_config: &TlsConfig,
    ) -> Result<Self, ConnectError> {
        let evaluator: Arc<dyn TrustEvaluator> = factory.pinning_evaluator();
        let connector = build_connector(store, tls_config)?;
        tracing::debug!(pins = factory.spec().len(), roots = store.len(), "secure connector ready");
        Ok(Self {
            connector,
            evaluator,
        })
    }

    pub fn evaluator(&self) -> Arc<dyn TrustEvaluator> {
        self.evaluator.clone()
    }

    /// Open a TLS connection to an `https` URL.
    pub async fn connect(&self, url: &Url) -> Result<SslStream<TcpStream>, ConnectError> {
        require_https(url)?;
        let (host, _) = target_of(url)?;
        let host = bare_host(host);
        let stream = ConnectJob::connect(url).await?;

        let mut config = self.connector.configure()?;
        config.set_use_server_name_indication(TlsConfig::should_set_sni(host));
        let verdict: Verdict = Arc::new(Mutex::new(None));
        config.set_verify_callback(
            SslVerifyMode::PEER,
            verify_callback(self.evaluator.clone(), verdict.clone()),
        );

        match tokio_boring::connect(config, host, stream).await {
            Ok(tls_stream) => {
                tracing::debug!(host, "pinned TLS handshake complete");
                Ok(tls_stream)
            }
            Err(e) => match take_verdict(&verdict) {
                Some(err) => {
                    tracing::debug!(host, error = %err, "server certificate rejected");
                    Err(ConnectError::Certificate(err))
                }
                None => {
                    tracing::debug!(host, error = ?e, "TLS handshake failed");
                    Err(NetError::SslProtocolError.into())
                }
            },
        }
    }
}

fn build_connector(store: &TrustStore, tls_config: &TlsConfig) -> Result<SslConnector, ConnectError> {
    let mut builder = SslConnector::builder(SslMethod::tls())?;
    tls_config.apply_to_builder(&mut builder)?;
    tls_config.apply_trust_store(&mut builder, store)?;
    Ok(builder.build())
}

/// Leaf certificate of an `https` server, checked by standard validation only.
pub async fn fetch_server_certificate(url: &Url) -> Result<X509, ConnectError> {
    require_https(url)?;
    let (host, _) = target_of(url)?;
    let host = bare_host(host);
    let stream = ConnectJob::connect(url).await?;

    let store = TrustStore::platform().map_err(ConnectError::TrustStore)?;
    let connector = build_connector(&store, &TlsConfig::default())?;
    let mut config = connector.configure()?;
    config.set_use_server_name_indication(TlsConfig::should_set_sni(host));

    let tls_stream = tokio_boring::connect(config, host, stream)
        .await
        .map_err(|e| {
            tracing::debug!(host, error = ?e, "TLS handshake failed");
            NetError::SslProtocolError
        })?;
    tls_stream
        .ssl()
        .peer_certificate()
        .ok_or_else(|| NetError::SslServerCertBadFormat.into())
}
