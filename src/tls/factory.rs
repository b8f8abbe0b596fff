//! Factory producing the pinning evaluator.
//!
//! [`PinningTrustEvaluatorFactory`] stands where an unpinned trust store
//! provider would: it forwards store initialization to its delegate source
//! and hands out exactly one evaluator, the [`PinningTrustEvaluator`] wrapping
//! the source's baseline evaluators.

use crate::tls::error::CertificateError;
use crate::tls::evaluator::{PinningTrustEvaluator, TrustEvaluator};
use crate::tls::pinning::PinningSpec;
use crate::tls::truststore::{
    PlatformTrustStore, TrustStore, TrustStoreParameters, TrustStoreProvider,
};
use std::fmt;
use std::sync::Arc;

pub struct PinningTrustEvaluatorFactory {
    spec: PinningSpec,
    delegate_source: Box<dyn TrustStoreProvider>,
    evaluator: Arc<PinningTrustEvaluator>,
}

impl fmt::Debug for PinningTrustEvaluatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinningTrustEvaluatorFactory")
            .field("spec", &self.spec)
            .field("evaluator", &self.evaluator)
            .finish()
    }
}

impl PinningTrustEvaluatorFactory {
    /// Factory over the platform trust store.
    pub fn new(spec: PinningSpec) -> Result<Self, CertificateError> {
        let mut source = PlatformTrustStore::new();
        source.init_with_store(None)?;
        Ok(Self::with_delegate_source(spec, Box::new(source)))
    }

    /// Factory pinning a single fingerprint over the platform trust store.
    pub fn from_fingerprint(sha: impl Into<String>) -> Result<Self, CertificateError> {
        Self::new(PinningSpec::from_fingerprint(sha))
    }

    /// Factory over an already initialized delegate source.
    pub fn with_delegate_source(
        spec: PinningSpec,
        delegate_source: Box<dyn TrustStoreProvider>,
    ) -> Self {
        let evaluator = Arc::new(PinningTrustEvaluator::new(
            spec.clone(),
            delegate_source.trust_evaluators(),
        ));
        Self {
            spec,
            delegate_source,
            evaluator,
        }
    }

    /// Forward store initialization to the delegate source.
    pub fn init_with_store(&mut self, store: Option<TrustStore>) -> Result<(), CertificateError> {
        self.delegate_source.init_with_store(store)?;
        self.rebuild();
        Ok(())
    }

    /// Forward parameter initialization to the delegate source.
    pub fn init_with_parameters(
        &mut self,
        parameters: &TrustStoreParameters,
    ) -> Result<(), CertificateError> {
        self.delegate_source.init_with_parameters(parameters)?;
        self.rebuild();
        Ok(())
    }

    /// The single evaluator this factory produces.
    pub fn trust_evaluators(&self) -> Vec<Arc<dyn TrustEvaluator>> {
        let evaluator: Arc<dyn TrustEvaluator> = self.evaluator.clone();
        vec![evaluator]
    }

    pub fn pinning_evaluator(&self) -> Arc<PinningTrustEvaluator> {
        self.evaluator.clone()
    }

    pub fn spec(&self) -> &PinningSpec {
        &self.spec
    }

    fn rebuild(&mut self) {
        self.evaluator = Arc::new(PinningTrustEvaluator::new(
            self.spec.clone(),
            self.delegate_source.trust_evaluators(),
        ));
    }
}
