//! HTTP response types.

pub mod response;

pub use response::HttpResponse;
