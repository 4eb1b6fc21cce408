//! TCP connect and TLS handshake.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

/// Opens a TCP connection to an SMTP server.
///
/// # Errors
///
/// Returns an error if the connection fails or does not complete in time.
pub async fn connect(hostname: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addr = format!("{hostname}:{port}");
    tracing::debug!(%addr, "Connecting");

    tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Timeout(timeout))?
        .map_err(Into::into)
}

/// Performs a TLS handshake over an established TCP connection.
///
/// Used both for implicit TLS and after a STARTTLS upgrade.
///
/// # Errors
///
/// Returns an error if the hostname is invalid or the handshake fails.
pub async fn tls_handshake(
    stream: TcpStream,
    hostname: &str,
    timeout: Duration,
) -> Result<TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

    tokio::time::timeout(timeout, tls_connector().connect(server_name, stream))
        .await
        .map_err(|_| Error::Timeout(timeout))?
        .map_err(Into::into)
}

/// Creates a TLS connector with the webpki root certificates.
fn tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
