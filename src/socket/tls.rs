use crate::base::neterror::NetError;
use crate::tls::error::CertificateError;
use crate::tls::evaluator::TrustEvaluator;
use crate::tls::truststore::TrustStore;
use boring::pkey::Id;
use boring::ssl::{SslConnectorBuilder, SslVerifyMode, SslVersion};
use boring::x509::{X509Ref, X509StoreContextRef, X509};
use std::sync::{Arc, Mutex};

/// Auth type reported for leaf keys that are neither RSA nor EC.
pub const UNKNOWN_AUTH_TYPE: &str = "UNKNOWN";

/// Client TLS configuration.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub cipher_list: String,
    pub alpn_protos: Vec<String>,
    pub curves: Vec<String>, // Curve names like "X25519", "P-256"
    pub sigalgs: String,     // OpenSSL sigalgs string
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self::default_client()
    }
}

impl TlsConfig {
    /// Modern browser-like defaults, offering HTTP/1.1 only over ALPN.
    pub fn default_client() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            cipher_list: "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
                ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
                ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305"
                .to_string(),
            alpn_protos: vec!["http/1.1".to_string()],
            curves: vec!["X25519".to_string(), "P-256".to_string(), "P-384".to_string()],
            sigalgs: "ECDSA+SHA256:RSA-PSS+SHA256:RSA+SHA256:\
                ECDSA+SHA384:RSA-PSS+SHA384:RSA+SHA384:\
                RSA-PSS+SHA512:RSA+SHA512"
                .to_string(),
        }
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder
                .set_min_proto_version(Some(min))
                .map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder
                .set_max_proto_version(Some(max))
                .map_err(|_| NetError::SslProtocolError)?;
        }

        // TLS 1.3 suites are fixed in BoringSSL; this only affects TLS 1.2.
        builder
            .set_cipher_list(&self.cipher_list)
            .map_err(|_| NetError::SslProtocolError)?;

        if !self.alpn_protos.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protos {
                if proto.is_empty() || proto.len() > 255 {
                    return Err(NetError::SslProtocolError);
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder
                .set_alpn_protos(&alpn_wire)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.sigalgs.is_empty() {
            builder
                .set_sigalgs_list(&self.sigalgs)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.curves.is_empty() {
            let curves_str = self.curves.join(":");
            builder
                .set_curves_list(&curves_str)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        builder.set_verify(SslVerifyMode::PEER);

        Ok(())
    }

    /// Replace the connector's root store with `store`.
    pub fn apply_trust_store(
        &self,
        builder: &mut SslConnectorBuilder,
        store: &TrustStore,
    ) -> Result<(), NetError> {
        let x509_store = store
            .to_x509_store()
            .map_err(|_| NetError::SslProtocolError)?;
        builder.set_cert_store(x509_store);
        Ok(())
    }

    /// Check if SNI should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}

/// Auth type string for a leaf certificate's key algorithm.
pub fn auth_type(leaf: &X509Ref) -> &'static str {
    match leaf.public_key().map(|key| key.id()) {
        Ok(id) if id == Id::RSA => "RSA",
        Ok(id) if id == Id::EC => "EC",
        _ => UNKNOWN_AUTH_TYPE,
    }
}

/// First certificate failure seen during one handshake.
pub(crate) type Verdict = Arc<Mutex<Option<CertificateError>>>;

/// Verify callback handing the presented chain to `evaluator`.
///
/// Failures BoringSSL already detected (chain building, hostname) abort the
/// handshake with their X.509 verification code. Once the leaf is reached the
/// whole chain goes to the evaluator, whose error is stored in `verdict`.
pub(crate) fn verify_callback(
    evaluator: Arc<dyn TrustEvaluator>,
    verdict: Verdict,
) -> impl Fn(bool, &mut X509StoreContextRef) -> bool + Send + Sync + 'static {
    move |preverify_ok, ctx| {
        let depth = ctx.error_depth();
        if !preverify_ok {
            let err = match ctx.verify_result() {
                Err(err) => CertificateError::verification(err, depth),
                Ok(()) => {
                    CertificateError::validation(format!("rejected by TLS stack at depth {depth}"))
                }
            };
            record(&verdict, err);
            return false;
        }
        if depth != 0 {
            return true;
        }

        let chain: Vec<X509> = ctx
            .chain()
            .map(|chain| chain.iter().map(ToOwned::to_owned).collect())
            .unwrap_or_default();
        let auth = chain.first().map_or(UNKNOWN_AUTH_TYPE, |leaf| auth_type(leaf));

        match evaluator.evaluate_server_chain(&chain, auth) {
            Ok(()) => true,
            Err(err) => {
                record(&verdict, err);
                false
            }
        }
    }
}

fn record(verdict: &Verdict, err: CertificateError) {
    if let Ok(mut slot) = verdict.lock() {
        slot.get_or_insert(err);
    }
}

pub(crate) fn take_verdict(verdict: &Verdict) -> Option<CertificateError> {
    verdict.lock().ok().and_then(|mut slot| slot.take())
}
