//! # certpin
//!
//! TLS certificate public-key pinning on top of BoringSSL.
//!
//! A connection is accepted only when the server chain passes the platform
//! trust evaluation and the leaf certificate's public key hashes to one of a
//! configured set of SHA-256 fingerprints.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use certpin::PinnedClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = PinnedClient::builder()
//!         .fingerprint("7A:5C:EC:...:67:B3")
//!         .build()
//!         .unwrap();
//!     let response = client.get("https://example.com/").send().await.unwrap();
//!     println!("Status: {}", response.status());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Chromium-style network error codes
//! - [`client`] - Pinned HTTP/1.1 client
//! - [`http`] - Response type
//! - [`socket`] - TCP connect, TLS configuration, and the secure connector
//! - [`tls`] - Fingerprints, pin specs, trust stores, and trust evaluators

pub mod base;
pub mod client;
pub mod http;
pub mod socket;
pub mod tls;

pub use base::neterror::NetError;
pub use client::{ClientError, PinnedClient, PinnedClientBuilder, RequestBuilder};
pub use http::HttpResponse;
pub use socket::connector::{fetch_server_certificate, ConnectError, SecureConnector};
pub use socket::tls::TlsConfig;
pub use tls::{
    CertificateError, PinningError, PinningSpec, PinningSpecBuilder, PinningTrustEvaluator,
    PinningTrustEvaluatorFactory, TrustEvaluator, TrustStore,
};
