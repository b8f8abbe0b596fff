//! Shared fixtures: a throwaway PKI and a local TLS server.
#![allow(dead_code)]

use boring::asn1::Asn1Time;
use boring::bn::BigNum;
use boring::ec::{EcGroup, EcKey};
use boring::hash::MessageDigest;
use boring::nid::Nid;
use boring::pkey::{PKey, Private};
use boring::ssl::{SslAcceptor, SslMethod};
use boring::x509::extension::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
};
use boring::x509::{X509Builder, X509Name, X509NameBuilder, X509};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const RESPONSE_BODY: &str = "pinned-ok";

static SERIAL: AtomicU32 = AtomicU32::new(1);

pub fn generate_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn name(cn: &str) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    name.build()
}

fn base_builder(subject: &X509Name, key: &PKey<Private>) -> X509Builder {
    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(SERIAL.fetch_add(1, Ordering::Relaxed))
        .unwrap()
        .to_asn1_integer()
        .unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(subject).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(2).unwrap())
        .unwrap();
    builder
}

/// Names and validity of an issued server certificate.
#[derive(Clone, Copy)]
pub struct LeafProfile {
    pub dns: &'static str,
    pub ip: Option<&'static str>,
    pub expired: bool,
}

impl Default for LeafProfile {
    fn default() -> Self {
        Self {
            dns: "localhost",
            ip: Some("127.0.0.1"),
            expired: false,
        }
    }
}

/// A CA and a server certificate it issued.
pub struct TestPki {
    pub ca: X509,
    pub ca_key: PKey<Private>,
    pub leaf: X509,
    pub leaf_key: PKey<Private>,
}

impl TestPki {
    /// CA with a valid `localhost` / `127.0.0.1` leaf.
    pub fn new(ca_cn: &str) -> Self {
        Self::with_leaf(ca_cn, LeafProfile::default())
    }

    pub fn with_leaf(ca_cn: &str, profile: LeafProfile) -> Self {
        let ca_key = generate_key();
        let ca_name = name(ca_cn);
        let mut builder = base_builder(&ca_name, &ca_key);
        builder.set_issuer_name(&ca_name).unwrap();
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder.sign(&ca_key, MessageDigest::sha256()).unwrap();
        let ca = builder.build();

        let leaf_key = generate_key();
        let leaf = issue_leaf(&ca, &ca_key, &leaf_key, profile);
        Self {
            ca,
            ca_key,
            leaf,
            leaf_key,
        }
    }

    /// Leaf first, as a server presents it.
    pub fn chain(&self) -> Vec<X509> {
        vec![self.leaf.clone(), self.ca.clone()]
    }

    pub fn ca_pem(&self) -> Vec<u8> {
        self.ca.to_pem().unwrap()
    }
}

fn issue_leaf(
    ca: &X509,
    ca_key: &PKey<Private>,
    leaf_key: &PKey<Private>,
    profile: LeafProfile,
) -> X509 {
    let mut builder = base_builder(&name(profile.dns), leaf_key);
    if profile.expired {
        builder
            .set_not_before(&Asn1Time::from_unix(1_000_000_000).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_unix(1_100_000_000).unwrap())
            .unwrap();
    }
    builder.set_issuer_name(ca.subject_name()).unwrap();
    builder
        .append_extension(BasicConstraints::new().build().unwrap())
        .unwrap();
    builder
        .append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .key_encipherment()
                .build()
                .unwrap(),
        )
        .unwrap();
    builder
        .append_extension(ExtendedKeyUsage::new().server_auth().build().unwrap())
        .unwrap();
    let mut san = SubjectAlternativeName::new();
    san.dns(profile.dns);
    if let Some(ip) = profile.ip {
        san.ip(ip);
    }
    let san = san
        .build(&builder.x509v3_context(Some(&**ca), None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(ca_key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// Serve a fixed HTTP/1.1 response over TLS on an ephemeral local port.
pub async fn spawn_server(pki: &TestPki) -> SocketAddr {
    serve_tls(pki, true).await
}

/// Read each request, then close the TLS session without answering.
pub async fn spawn_closing_server(pki: &TestPki) -> SocketAddr {
    serve_tls(pki, false).await
}

async fn serve_tls(pki: &TestPki, respond: bool) -> SocketAddr {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pki.leaf_key).unwrap();
    acceptor.set_certificate(&pki.leaf).unwrap();
    acceptor.add_extra_chain_cert(pki.ca.clone()).unwrap();
    let acceptor = Arc::new(acceptor.build());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // Handshakes rejected by the client end here.
                let Ok(mut stream) = tokio_boring::accept(&acceptor, socket).await else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head_len = request
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                    .map_or(request.len(), |i| i + 4);
                let body_len = content_length(&request[..head_len]);
                while request.len() < head_len + body_len {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                if respond {
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        RESPONSE_BODY.len(),
                        RESPONSE_BODY
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                }
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

pub fn server_url(addr: SocketAddr) -> String {
    format!("https://localhost:{}/", addr.port())
}

/// URL reaching the same server by loopback IP instead of name.
pub fn server_ip_url(addr: SocketAddr) -> String {
    format!("https://127.0.0.1:{}/", addr.port())
}

/// First [`certpin::PinningError`] in an error's source chain.
pub fn find_pinning_error<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> Option<&'a certpin::PinningError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(pinning) = e.downcast_ref::<certpin::PinningError>() {
            return Some(pinning);
        }
        current = e.source();
    }
    None
}
