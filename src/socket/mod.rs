//! Socket and connection management.
//!
//! - [`connectjob`]: DNS → TCP connection flow
//! - [`connector`]: pinned TLS handshakes over BoringSSL
//! - [`tls`]: TLS configuration and the trust evaluator verify callback

pub mod connectjob;
pub mod connector;
pub mod tls;
