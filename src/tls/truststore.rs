//! Trust stores and the baseline CA evaluator.
//!
//! [`TrustStore`] is the set of root certificates baseline validation trusts.
//! [`StoreTrustEvaluator`] verifies chains against one with BoringSSL.
//! [`TrustStoreProvider`] is the source of baseline evaluators that the
//! pinning layer wraps; [`PlatformTrustStore`] is its default, backed by the
//! system CA bundle.

use crate::tls::error::CertificateError;
use crate::tls::evaluator::TrustEvaluator;
use boring::error::ErrorStack;
use boring::stack::Stack;
use boring::x509::store::{X509Store, X509StoreBuilder};
use boring::x509::{X509StoreContext, X509};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding the platform CA bundle location.
pub const CERT_FILE_ENV: &str = "SSL_CERT_FILE";

/// Well-known CA bundle locations, checked in order.
const PLATFORM_BUNDLES: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/ssl/ca-bundle.pem",
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
    "/etc/ssl/cert.pem",
    "/usr/local/etc/openssl/cert.pem",
    "/usr/local/share/certs/ca-root-nss.crt",
];

/// Ordered set of trusted root certificates.
#[derive(Clone, Default)]
pub struct TrustStore {
    roots: Vec<X509>,
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("roots", &self.roots.len())
            .finish()
    }
}

impl TrustStore {
    /// Create an empty trust store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the platform CA bundle.
    ///
    /// Honors `SSL_CERT_FILE`, otherwise uses the first well-known bundle
    /// that exists. A host without any bundle yields an empty store.
    pub fn platform() -> Result<Self, CertificateError> {
        let mut store = Self::new();
        match platform_bundle_path() {
            Some(path) => {
                store.add_pem_file(&path)?;
                tracing::debug!(path = %path.display(), roots = store.len(), "loaded platform trust store");
            }
            None => tracing::warn!("no platform CA bundle found"),
        }
        Ok(store)
    }

    /// Build a store from PEM-encoded certificates.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CertificateError> {
        let mut store = Self::new();
        store.add_pem(pem)?;
        Ok(store)
    }

    /// Build a store from the given parameters.
    pub fn from_parameters(parameters: &TrustStoreParameters) -> Result<Self, CertificateError> {
        let mut store = if parameters.include_platform_roots {
            Self::platform()?
        } else {
            Self::new()
        };
        for path in &parameters.ca_files {
            store.add_pem_file(path)?;
        }
        Ok(store)
    }

    pub fn add(&mut self, cert: X509) {
        self.roots.push(cert);
    }

    /// Append every certificate in a PEM document.
    ///
    /// A document without any certificate is rejected.
    pub fn add_pem(&mut self, pem: &[u8]) -> Result<(), CertificateError> {
        self.add_pem_from(pem, "PEM input")
    }

    /// Append every certificate in a PEM file.
    pub fn add_pem_file(&mut self, path: &Path) -> Result<(), CertificateError> {
        let pem = std::fs::read(path).map_err(|source| CertificateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_pem_from(&pem, &path.display().to_string())
    }

    fn add_pem_from(&mut self, pem: &[u8], origin: &str) -> Result<(), CertificateError> {
        let certs = X509::stack_from_pem(pem)?;
        if certs.is_empty() {
            return Err(CertificateError::NoCertificates {
                origin: origin.to_string(),
            });
        }
        self.roots.extend(certs);
        Ok(())
    }

    pub fn roots(&self) -> &[X509] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Convert into a BoringSSL certificate store.
    pub fn to_x509_store(&self) -> Result<X509Store, ErrorStack> {
        let mut builder = X509StoreBuilder::new()?;
        for root in &self.roots {
            // Bundles routinely repeat certificates; a rejected duplicate is not fatal.
            if let Err(e) = builder.add_cert(root.clone()) {
                tracing::debug!(error = %e, "skipping trust store certificate");
            }
        }
        Ok(builder.build())
    }
}

fn platform_bundle_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CERT_FILE_ENV).map(PathBuf::from) {
        if path.is_file() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "{CERT_FILE_ENV} does not point to a file");
    }
    PLATFORM_BUNDLES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

/// Where a provider should load its trust store from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustStoreParameters {
    /// Start from the platform CA bundle.
    pub include_platform_roots: bool,
    /// Additional PEM files with trusted roots.
    pub ca_files: Vec<PathBuf>,
}

impl Default for TrustStoreParameters {
    fn default() -> Self {
        Self {
            include_platform_roots: true,
            ca_files: Vec::new(),
        }
    }
}

impl TrustStoreParameters {
    /// Parameters trusting only the given CA files.
    pub fn ca_files_only<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            include_platform_roots: false,
            ca_files: files.into_iter().map(Into::into).collect(),
        }
    }
}

/// Source of baseline trust evaluators.
pub trait TrustStoreProvider: Send + Sync {
    /// (Re)initialize from a trust store; `None` selects platform defaults.
    fn init_with_store(&mut self, store: Option<TrustStore>) -> Result<(), CertificateError>;

    /// (Re)initialize from loading parameters.
    fn init_with_parameters(
        &mut self,
        parameters: &TrustStoreParameters,
    ) -> Result<(), CertificateError>;

    /// Evaluators built from the current initialization.
    fn trust_evaluators(&self) -> Vec<Arc<dyn TrustEvaluator>>;
}

/// Baseline evaluator verifying chains against a certificate store.
pub struct StoreTrustEvaluator {
    store: X509Store,
    issuers: Vec<X509>,
}

impl fmt::Debug for StoreTrustEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreTrustEvaluator")
            .field("issuers", &self.issuers.len())
            .finish()
    }
}

impl StoreTrustEvaluator {
    pub fn new(trust_store: &TrustStore) -> Result<Self, CertificateError> {
        Ok(Self {
            store: trust_store.to_x509_store()?,
            issuers: trust_store.roots().to_vec(),
        })
    }

    fn verify(&self, chain: &[X509]) -> Result<(), CertificateError> {
        let (leaf, intermediates) = chain
            .split_first()
            .ok_or_else(|| CertificateError::validation("empty certificate chain"))?;

        let mut untrusted = Stack::new()?;
        for cert in intermediates {
            untrusted.push(cert.clone())?;
        }

        let mut context = X509StoreContext::new()?;
        let failure = context.init(&self.store, leaf, &untrusted, |ctx| {
            Ok(if ctx.verify_cert()? {
                None
            } else {
                Some((ctx.error_depth(), ctx.verify_result().err()))
            })
        })?;

        match failure {
            None => Ok(()),
            Some((depth, Some(err))) => Err(CertificateError::verification(err, depth)),
            Some((depth, None)) => Err(CertificateError::validation(format!(
                "no trusted path to a root at depth {depth}"
            ))),
        }
    }
}

impl TrustEvaluator for StoreTrustEvaluator {
    fn evaluate_server_chain(
        &self,
        chain: &[X509],
        auth_type: &str,
    ) -> Result<(), CertificateError> {
        tracing::trace!(auth_type, "verifying server chain against trust store");
        self.verify(chain)
    }

    fn evaluate_client_chain(
        &self,
        chain: &[X509],
        auth_type: &str,
    ) -> Result<(), CertificateError> {
        tracing::trace!(auth_type, "verifying client chain against trust store");
        self.verify(chain)
    }

    fn accepted_issuers(&self) -> Vec<X509> {
        self.issuers.clone()
    }
}

/// Default provider: one [`StoreTrustEvaluator`] over the platform roots.
#[derive(Default)]
pub struct PlatformTrustStore {
    evaluators: Vec<Arc<dyn TrustEvaluator>>,
}

impl fmt::Debug for PlatformTrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformTrustStore")
            .field("evaluators", &self.evaluators.len())
            .finish()
    }
}

impl PlatformTrustStore {
    /// Create an uninitialized provider with no evaluators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider already initialized from `store`.
    pub fn from_store(store: &TrustStore) -> Result<Self, CertificateError> {
        let mut provider = Self::new();
        provider.install(store)?;
        Ok(provider)
    }

    fn install(&mut self, store: &TrustStore) -> Result<(), CertificateError> {
        let evaluator: Arc<dyn TrustEvaluator> = Arc::new(StoreTrustEvaluator::new(store)?);
        self.evaluators = vec![evaluator];
        Ok(())
    }
}

impl TrustStoreProvider for PlatformTrustStore {
    fn init_with_store(&mut self, store: Option<TrustStore>) -> Result<(), CertificateError> {
        let store = match store {
            Some(store) => store,
            None => TrustStore::platform()?,
        };
        self.install(&store)
    }

    fn init_with_parameters(
        &mut self,
        parameters: &TrustStoreParameters,
    ) -> Result<(), CertificateError> {
        self.install(&TrustStore::from_parameters(parameters)?)
    }

    fn trust_evaluators(&self) -> Vec<Arc<dyn TrustEvaluator>> {
        self.evaluators.clone()
    }
}
