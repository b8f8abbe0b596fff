//! Pinning configuration files.
//!
//! ```json
//! {
//!     "fingerprints": ["7A:5C:EC:...:67:B3"],
//!     "trust_store": { "include_platform_roots": true, "ca_files": [] }
//! }
//! ```

use crate::tls::fingerprint::is_canonical;
use crate::tls::pinning::PinningSpec;
use crate::tls::truststore::TrustStoreParameters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read pinning config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid pinning config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pins and trust store settings for a pinned client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinningConfig {
    /// Accepted public key fingerprints, kept verbatim.
    #[serde(default)]
    pub fingerprints: Vec<String>,
    #[serde(default)]
    pub trust_store: TrustStoreParameters,
}

impl PinningConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.warn_non_canonical();
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build the pinning spec, in listed order.
    pub fn spec(&self) -> PinningSpec {
        self.fingerprints.iter().cloned().collect()
    }

    fn warn_non_canonical(&self) {
        for sha in self.fingerprints.iter().filter(|sha| !is_canonical(sha)) {
            tracing::warn!(fingerprint = %sha, "configured pin is not an uppercase colon-separated SHA-256 fingerprint and will never match");
        }
    }
}
