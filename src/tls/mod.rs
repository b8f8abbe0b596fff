//! Certificate pinning: fingerprints, pin specs, and trust evaluation.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod factory;
pub mod fingerprint;
pub mod pinning;
pub mod truststore;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{ConfigError, PinningConfig};
pub use error::{CertificateError, PinningError, UnsupportedOperation};
pub use evaluator::{PinningTrustEvaluator, TrustEvaluator};
pub use factory::PinningTrustEvaluatorFactory;
pub use fingerprint::{certificate_fingerprint, fingerprint, public_key_pem_fingerprint};
pub use pinning::{PinningSpec, PinningSpecBuilder};
pub use truststore::{
    PlatformTrustStore, StoreTrustEvaluator, TrustStore, TrustStoreParameters, TrustStoreProvider,
};
