//! TLS client configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Certificate file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("No certificates in {0:?}")]
    NoCertificates(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Rustls(#[from] rustls::Error),
}

/// Read every PEM certificate in `path` into a root store.
pub fn load_roots(path: &Path) -> Result<RootCertStore, TlsError> {
    if !path.exists() {
        return Err(TlsError::NotFound(path.to_path_buf()));
    }

    let mut reader = BufReader::new(File::open(path)?);
    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert?)?;
    }

    if roots.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(roots)
}

/// Client config trusting `roots`, without client authentication.
pub fn client_config(roots: RootCertStore) -> Result<Arc<ClientConfig>, TlsError> {
    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Load a client config trusting the CA certificates in `ca_path`.
pub fn load_client_config(ca_path: &Path) -> Result<Arc<ClientConfig>, TlsError> {
    client_config(load_roots(ca_path)?)
}
