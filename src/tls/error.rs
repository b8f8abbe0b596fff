//! Certificate validation errors.
//!
//! Every failure raised while evaluating a certificate chain is a
//! [`CertificateError`]. The variants keep the category of the failure
//! distinguishable by type: a chain rejected by baseline CA validation, a
//! trusted chain whose leaf key is not pinned, or a trust operation this
//! client never performs.

use crate::base::neterror::NetError;
use boring::error::ErrorStack;
use boring::x509::X509VerifyError;
use std::path::PathBuf;
use thiserror::Error;

/// Message carried by every [`PinningError`].
pub const PINNING_MISMATCH_MESSAGE: &str = "public keys sha do not match";

/// Certificate chain evaluation failure.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// Baseline chain validation rejected the chain.
    ///
    /// `verify_error` is the X.509 verification result when BoringSSL
    /// reported one.
    #[error("certificate chain rejected: {reason}")]
    Validation {
        reason: String,
        verify_error: Option<X509VerifyError>,
    },

    /// BoringSSL failed while processing a certificate.
    #[error("certificate processing failed: {0}")]
    Ssl(#[from] ErrorStack),

    /// A trust store file could not be read.
    #[error("cannot read trust store file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A trust store source held no certificates.
    #[error("no certificates found in {origin}")]
    NoCertificates { origin: String },

    /// The chain is trusted but the leaf public key is not pinned.
    #[error("certificate pinning failed")]
    Pinning(#[source] PinningError),

    /// The requested trust evaluation is not supported.
    #[error("certificate evaluation not supported")]
    Unsupported(#[source] UnsupportedOperation),
}

impl CertificateError {
    /// Create a baseline validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        CertificateError::Validation {
            reason: reason.into(),
            verify_error: None,
        }
    }

    /// Create a validation failure from a BoringSSL verification result.
    pub fn verification(err: X509VerifyError, depth: u32) -> Self {
        CertificateError::Validation {
            reason: format!("{} (code {}) at depth {depth}", err.error_string(), err.as_raw()),
            verify_error: Some(err),
        }
    }

    /// X.509 verification result behind a validation failure.
    pub fn verify_error(&self) -> Option<X509VerifyError> {
        match self {
            CertificateError::Validation { verify_error, .. } => *verify_error,
            _ => None,
        }
    }

    /// Whether this is a pinning mismatch rather than a CA validation failure.
    pub fn is_pinning_mismatch(&self) -> bool {
        matches!(self, CertificateError::Pinning(_))
    }

    /// Whether this error was raised by an unsupported trust operation.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, CertificateError::Unsupported(_))
    }

    /// Chromium error code for this failure.
    pub fn net_error(&self) -> NetError {
        match self {
            CertificateError::Validation {
                verify_error: Some(err),
                ..
            } => match *err {
                X509VerifyError::HOSTNAME_MISMATCH
                | X509VerifyError::IP_ADDRESS_MISMATCH
                | X509VerifyError::EMAIL_MISMATCH => NetError::CertCommonNameInvalid,
                X509VerifyError::CERT_HAS_EXPIRED | X509VerifyError::CERT_NOT_YET_VALID => {
                    NetError::CertDateInvalid
                }
                _ => NetError::CertAuthorityInvalid,
            },
            CertificateError::Validation { .. } => NetError::CertAuthorityInvalid,
            CertificateError::Ssl(_) => NetError::SslServerCertBadFormat,
            CertificateError::Io { .. } | CertificateError::NoCertificates { .. } => {
                NetError::CertInvalid
            }
            CertificateError::Pinning(_) => NetError::SslPinnedKeyNotInCertChain,
            CertificateError::Unsupported(_) => NetError::CertInvalid,
        }
    }
}

impl From<PinningError> for CertificateError {
    fn from(err: PinningError) -> Self {
        CertificateError::Pinning(err)
    }
}

impl From<UnsupportedOperation> for CertificateError {
    fn from(err: UnsupportedOperation) -> Self {
        CertificateError::Unsupported(err)
    }
}

/// The leaf public key fingerprint is not accepted by the pinning spec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}: {fingerprint}")]
pub struct PinningError {
    message: &'static str,
    fingerprint: String,
}

impl PinningError {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            message: PINNING_MISMATCH_MESSAGE,
            fingerprint: fingerprint.into(),
        }
    }

    /// Fingerprint of the rejected leaf public key.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn message(&self) -> &str {
        self.message
    }
}

/// Raised by trust operations that a client-side evaluator never performs.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Default)]
#[error("unsupported operation")]
pub struct UnsupportedOperation;
