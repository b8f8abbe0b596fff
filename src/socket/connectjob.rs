use crate::base::neterror::NetError;
use tokio::net::TcpStream;
use url::Url;

/// Host and port a URL connects to.
pub fn target_of(url: &Url) -> Result<(&str, u16), NetError> {
    let host = url.host_str().ok_or(NetError::InvalidUrl)?;
    let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;
    Ok((host, port))
}

/// Host name without IPv6 brackets, as used for SNI and hostname checks.
pub fn bare_host(host: &str) -> &str {
    host.trim_start_matches('[').trim_end_matches(']')
}

/// Require an `https` URL.
pub fn require_https(url: &Url) -> Result<(), NetError> {
    match url.scheme() {
        "https" => Ok(()),
        "http" | "ws" | "wss" => Err(NetError::DisallowedUrlScheme),
        _ => Err(NetError::UnknownUrlScheme),
    }
}

/// Chromium error code for a socket error.
pub fn map_io_error(err: &std::io::Error) -> NetError {
    match err.kind() {
        std::io::ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
        std::io::ErrorKind::ConnectionReset => NetError::ConnectionReset,
        std::io::ErrorKind::ConnectionAborted | std::io::ErrorKind::UnexpectedEof => {
            NetError::ConnectionClosed
        }
        std::io::ErrorKind::TimedOut => NetError::ConnectionTimedOut,
        _ => NetError::ConnectionFailed,
    }
}

/// Manages the transport part of a connection: DNS -> TCP.
/// Roughly equivalent to net::ConnectJob.
pub struct ConnectJob;

impl ConnectJob {
    pub async fn connect(url: &Url) -> Result<TcpStream, NetError> {
        let (host, port) = target_of(url)?;

        // 1. DNS Resolution
        let addrs = tokio::net::lookup_host((bare_host(host), port))
            .await
            .map_err(|_| NetError::NameNotResolved)?;

        // 2. TCP Connect, first address that answers wins
        let mut last_error = NetError::NameNotResolved;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    tracing::debug!(%addr, "tcp connected");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "tcp connect failed");
                    last_error = map_io_error(&e);
                }
            }
        }

        Err(last_error)
    }
}
