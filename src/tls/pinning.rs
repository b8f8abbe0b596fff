//! Accepted public key fingerprints and their builder.
//!
//! A [`PinningSpec`] is the immutable list of public key fingerprints a
//! client accepts for its server. It is built through [`PinningSpecBuilder`],
//! where every [`with_sha`](PinningSpecBuilder::with_sha) returns a new
//! builder and leaves the receiver untouched, so partial configurations can
//! be shared and branched.
//!
//! A fingerprint is valid only when it occurs exactly once in the list. A
//! fingerprint listed twice is rejected, and an empty spec rejects
//! everything.

use std::sync::Arc;

/// Immutable list of accepted public key fingerprints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinningSpec {
    /// Accepted fingerprints in insertion order, duplicates kept.
    shas: Arc<[String]>,
}

impl Default for PinningSpec {
    fn default() -> Self {
        PinningSpecBuilder::new().build()
    }
}

impl PinningSpec {
    /// Start an empty builder.
    pub fn builder() -> PinningSpecBuilder {
        PinningSpecBuilder::new()
    }

    /// Spec accepting a single fingerprint.
    pub fn from_fingerprint(sha: impl Into<String>) -> Self {
        PinningSpecBuilder::new().with_sha(sha).build()
    }

    /// Check whether `sha` occurs exactly once in the accepted list.
    pub fn is_valid(&self, sha: &str) -> bool {
        self.shas.iter().filter(|pin| pin.as_str() == sha).count() == 1
    }

    /// Accepted fingerprints in insertion order.
    pub fn fingerprints(&self) -> &[String] {
        &self.shas
    }

    pub fn len(&self) -> usize {
        self.shas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shas.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PinningSpec {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter()
            .fold(PinningSpecBuilder::new(), |builder, sha| builder.with_sha(sha))
            .build()
    }
}

/// Append-only, persistent builder for [`PinningSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct PinningSpecBuilder {
    shas: Vec<String>,
}

impl PinningSpecBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new builder holding the current fingerprints plus `value`.
    pub fn with_sha(&self, value: impl Into<String>) -> Self {
        let mut shas = Vec::with_capacity(self.shas.len() + 1);
        shas.extend(self.shas.iter().cloned());
        shas.push(value.into());
        Self { shas }
    }

    /// Freeze the current fingerprints into a spec.
    pub fn build(&self) -> PinningSpec {
        PinningSpec {
            shas: self.shas.iter().cloned().collect(),
        }
    }

    /// Number of fingerprints added so far.
    pub fn len(&self) -> usize {
        self.shas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shas.is_empty()
    }
}
