//! Trust evaluators.
//!
//! [`TrustEvaluator`] is the capability a TLS stack needs to decide whether a
//! presented certificate chain is trusted. [`PinningTrustEvaluator`] is a
//! decorator over a fixed list of baseline evaluators: the chain must pass
//! every delegate first, then the leaf public key must match the
//! [`PinningSpec`].

use crate::tls::error::{CertificateError, PinningError, UnsupportedOperation};
use crate::tls::fingerprint::certificate_fingerprint;
use crate::tls::pinning::PinningSpec;
use boring::x509::X509;
use std::fmt;
use std::sync::Arc;

/// Certificate chain trust evaluation.
///
/// Chains are ordered leaf first. Implementations must be safe to call from
/// many handshakes at once.
pub trait TrustEvaluator: Send + Sync {
    /// Decide whether a chain presented by a server is trusted.
    fn evaluate_server_chain(&self, chain: &[X509], auth_type: &str)
        -> Result<(), CertificateError>;

    /// Decide whether a chain presented by a client is trusted.
    fn evaluate_client_chain(&self, chain: &[X509], auth_type: &str)
        -> Result<(), CertificateError>;

    /// Issuer certificates this evaluator recognizes.
    fn accepted_issuers(&self) -> Vec<X509>;
}

/// Server chain evaluator enforcing public key pins on top of its delegates.
#[derive(Clone)]
pub struct PinningTrustEvaluator {
    spec: PinningSpec,
    delegates: Arc<[Arc<dyn TrustEvaluator>]>,
}

impl fmt::Debug for PinningTrustEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinningTrustEvaluator")
            .field("spec", &self.spec)
            .field("delegates", &self.delegates.len())
            .finish()
    }
}

impl PinningTrustEvaluator {
    pub fn new(spec: PinningSpec, delegates: Vec<Arc<dyn TrustEvaluator>>) -> Self {
        Self {
            spec,
            delegates: delegates.into(),
        }
    }

    pub fn spec(&self) -> &PinningSpec {
        &self.spec
    }

    pub fn delegates(&self) -> &[Arc<dyn TrustEvaluator>] {
        &self.delegates
    }

    /// Check the leaf public key against the accepted fingerprints.
    fn pin_certificate(&self, leaf: &X509) -> Result<(), CertificateError> {
        let sha = certificate_fingerprint(leaf)?;
        if self.spec.is_valid(&sha) {
            tracing::debug!(fingerprint = %sha, "certificate pin matched");
            Ok(())
        } else {
            tracing::warn!(fingerprint = %sha, pins = self.spec.len(), "certificate pin mismatch");
            Err(PinningError::new(sha).into())
        }
    }
}

impl TrustEvaluator for PinningTrustEvaluator {
    fn evaluate_server_chain(
        &self,
        chain: &[X509],
        auth_type: &str,
    ) -> Result<(), CertificateError> {
        tracing::debug!(
            chain_len = chain.len(),
            auth_type,
            delegates = self.delegates.len(),
            "evaluating server chain"
        );
        for delegate in self.delegates.iter() {
            delegate.evaluate_server_chain(chain, auth_type)?;
        }

        // An empty chain has no leaf to pin; delegates alone decide.
        match chain.first() {
            Some(leaf) => self.pin_certificate(leaf),
            None => Ok(()),
        }
    }

    fn evaluate_client_chain(
        &self,
        _chain: &[X509],
        _auth_type: &str,
    ) -> Result<(), CertificateError> {
        Err(UnsupportedOperation.into())
    }

    fn accepted_issuers(&self) -> Vec<X509> {
        self.delegates
            .iter()
            .flat_map(|delegate| delegate.accepted_issuers())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::testutil::self_signed;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        result: fn() -> Result<(), CertificateError>,
        issuers: Vec<X509>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn accept(issuers: Vec<X509>) -> Arc<Self> {
            Arc::new(Self {
                result: || Ok(()),
                issuers,
                calls: AtomicUsize::new(0),
            })
        }

        fn reject() -> Arc<Self> {
            Arc::new(Self {
                result: || Err(CertificateError::validation("untrusted issuer")),
                issuers: Vec::new(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl TrustEvaluator for Fixed {
        fn evaluate_server_chain(&self, _: &[X509], _: &str) -> Result<(), CertificateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }

        fn evaluate_client_chain(&self, _: &[X509], _: &str) -> Result<(), CertificateError> {
            (self.result)()
        }

        fn accepted_issuers(&self) -> Vec<X509> {
            self.issuers.clone()
        }
    }

    #[test]
    fn test_matching_pin_accepts() {
        let leaf = self_signed("leaf");
        let spec = PinningSpec::from_fingerprint(certificate_fingerprint(&leaf).unwrap());
        let evaluator = PinningTrustEvaluator::new(spec, vec![Fixed::accept(vec![])]);

        assert!(evaluator.evaluate_server_chain(&[leaf], "EC").is_ok());
    }

    #[test]
    fn test_mismatched_pin_rejects() {
        let leaf = self_signed("leaf");
        let other = self_signed("other");
        let spec = PinningSpec::from_fingerprint(certificate_fingerprint(&other).unwrap());
        let evaluator = PinningTrustEvaluator::new(spec, vec![Fixed::accept(vec![])]);

        let err = evaluator.evaluate_server_chain(&[leaf.clone()], "EC").unwrap_err();
        match err {
            CertificateError::Pinning(pinning) => {
                assert_eq!(pinning.fingerprint(), certificate_fingerprint(&leaf).unwrap());
            }
            other => panic!("expected pinning error, got {other:?}"),
        }
    }

    #[test]
    fn test_only_leaf_is_pinned() {
        let leaf = self_signed("leaf");
        let issuer = self_signed("issuer");
        let spec = PinningSpec::from_fingerprint(certificate_fingerprint(&issuer).unwrap());
        let evaluator = PinningTrustEvaluator::new(spec, vec![Fixed::accept(vec![])]);

        let err = evaluator.evaluate_server_chain(&[leaf, issuer], "EC").unwrap_err();
        assert!(err.is_pinning_mismatch());
    }

    #[test]
    fn test_delegate_failure_skips_pinning() {
        let leaf = self_signed("leaf");
        let spec = PinningSpec::from_fingerprint(certificate_fingerprint(&leaf).unwrap());
        let rejecting = Fixed::reject();
        let after = Fixed::accept(vec![]);
        let evaluator =
            PinningTrustEvaluator::new(spec, vec![rejecting.clone(), after.clone()]);

        let err = evaluator.evaluate_server_chain(&[leaf], "EC").unwrap_err();
        assert!(matches!(err, CertificateError::Validation { .. }));
        assert_eq!(rejecting.calls.load(Ordering::SeqCst), 1);
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_chain_accepted_when_delegates_accept() {
        let delegate = Fixed::accept(vec![]);
        let evaluator = PinningTrustEvaluator::new(PinningSpec::default(), vec![delegate.clone()]);

        assert!(evaluator.evaluate_server_chain(&[], "RSA").is_ok());
        assert_eq!(delegate.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_chain_ignores_populated_pins() {
        let pinned = certificate_fingerprint(&self_signed("leaf")).unwrap();
        let specs = [
            PinningSpec::from_fingerprint(pinned.clone()),
            PinningSpec::builder()
                .with_sha(pinned.clone())
                .with_sha(pinned.clone())
                .with_sha("AA:BB")
                .build(),
        ];
        for spec in specs {
            let delegate = Fixed::accept(vec![]);
            let evaluator = PinningTrustEvaluator::new(spec.clone(), vec![delegate.clone()]);

            assert!(evaluator.evaluate_server_chain(&[], "EC").is_ok(), "{spec:?}");
            assert_eq!(delegate.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_empty_chain_with_pins_still_fails_on_delegate() {
        let spec = PinningSpec::builder().with_sha("AA").with_sha("AA").build();
        let evaluator = PinningTrustEvaluator::new(spec, vec![Fixed::reject()]);

        let err = evaluator.evaluate_server_chain(&[], "EC").unwrap_err();
        assert!(!err.is_pinning_mismatch());
    }

    #[test]
    fn test_empty_chain_still_runs_delegates() {
        let evaluator = PinningTrustEvaluator::new(PinningSpec::default(), vec![Fixed::reject()]);
        assert!(evaluator.evaluate_server_chain(&[], "RSA").is_err());
    }

    #[test]
    fn test_client_chain_always_unsupported() {
        let leaf = self_signed("leaf");
        let spec = PinningSpec::from_fingerprint(certificate_fingerprint(&leaf).unwrap());
        let evaluator = PinningTrustEvaluator::new(spec, vec![Fixed::accept(vec![])]);

        assert!(evaluator.evaluate_client_chain(&[], "").unwrap_err().is_unsupported());
        assert!(evaluator
            .evaluate_client_chain(&[leaf], "EC")
            .unwrap_err()
            .is_unsupported());
    }

    #[test]
    fn test_accepted_issuers_concatenated_in_delegate_order() {
        let a = self_signed("a");
        let b = self_signed("b");
        let c = self_signed("c");
        let evaluator = PinningTrustEvaluator::new(
            PinningSpec::default(),
            vec![
                Fixed::accept(vec![a.clone(), b.clone()]),
                Fixed::accept(vec![]),
                Fixed::accept(vec![c.clone(), a.clone()]),
            ],
        );

        let issuers = evaluator.accepted_issuers();
        let names: Vec<_> = issuers
            .iter()
            .map(|cert| certificate_fingerprint(cert).unwrap())
            .collect();
        let expected: Vec<_> = [&a, &b, &c, &a]
            .iter()
            .map(|cert| certificate_fingerprint(cert).unwrap())
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_no_delegates_pins_only() {
        let leaf = self_signed("leaf");
        let spec = PinningSpec::from_fingerprint(certificate_fingerprint(&leaf).unwrap());
        let evaluator = PinningTrustEvaluator::new(spec, Vec::new());

        assert!(evaluator.evaluate_server_chain(&[leaf], "EC").is_ok());
        assert!(evaluator.accepted_issuers().is_empty());
    }
}
