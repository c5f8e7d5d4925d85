//! TLS for the proxy's own listener and for connections to `https://` origins.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;

/// Error type for loading TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("certificate file not found: {}", .0.display())]
    CertificateNotFound(PathBuf),

    #[error("private key file not found: {}", .0.display())]
    KeyNotFound(PathBuf),

    #[error("origin CA file not found: {}", .0.display())]
    OriginCaNotFound(PathBuf),

    #[error("no usable certificates in origin CA file {}", .0.display())]
    EmptyOriginCa(PathBuf),

    #[error("failed to load TLS material: {0}")]
    Load(#[from] io::Error),
}

/// Load TLS configuration from certificate and key files (PEM).
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    if !cert_path.exists() {
        return Err(TlsError::CertificateNotFound(cert_path.to_path_buf()));
    }
    if !key_path.exists() {
        return Err(TlsError::KeyNotFound(key_path.to_path_buf()));
    }

    let config = RustlsConfig::from_pem_file(cert_path, key_path).await?;
    tracing::info!(cert = %cert_path.display(), "TLS termination enabled");
    Ok(config)
}

/// Client configuration for origin TLS.
///
/// Trusts the bundled web PKI roots plus every certificate in `extra_ca`.
pub fn origin_client_config(extra_ca: Option<&Path>) -> Result<ClientConfig, TlsError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(path) = extra_ca {
        if !path.exists() {
            return Err(TlsError::OriginCaNotFound(path.to_path_buf()));
        }
        let mut reader = BufReader::new(File::open(path)?);
        let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
        let (added, ignored) = roots.add_parsable_certificates(certs);
        if added == 0 {
            return Err(TlsError::EmptyOriginCa(path.to_path_buf()));
        }
        tracing::info!(ca = %path.display(), added, ignored, "Trusting extra origin roots");
    }

    Ok(ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth())
}
