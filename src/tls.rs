//! TLS client configuration for the control-plane REST API.
//!
//! Three trust modes:
//!   - `ca_file` set            → chain and hostname verified against that bundle
//!   - `allow_unverified_tls`   → any server certificate accepted; handshake
//!     signatures are still checked (appliances often ship self-signed certs)
//!   - neither                  → the HTTP client's built-in web PKI roots
//!
//! Configs are built with the `rustls-post-quantum` provider passed
//! explicitly, so no process-wide default provider is required.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use log::warn;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore, SignatureScheme};
use rustls_pemfile::certs;

use crate::config::ClientConfig as FleetConfig;
use crate::error::{FleetError, Result};

// ── Permissive verifier ───────────────────────────────────────────────────────

/// Accepts any server certificate chain, but still verifies that the peer
/// holds the key for the certificate it presented.
#[derive(Debug)]
struct UnverifiedServer {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for UnverifiedServer {
    fn verify_server_cert(
        &self,
        _end_entity:    &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name:   &ServerName<'_>,
        _ocsp_response: &[u8],
        _now:           UnixTime,
    ) -> std::result::Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert:    &CertificateDer<'_>,
        dss:     &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert:    &CertificateDer<'_>,
        dss:     &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

// ── Config factory ────────────────────────────────────────────────────────────

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls_post_quantum::provider())
}

/// Load every certificate in a PEM bundle into a root store.
fn load_roots(ca_file: &Path) -> Result<RootCertStore> {
    let pem = fs::read(ca_file)?;
    let mut roots = RootCertStore::empty();
    for cert in certs(&mut Cursor::new(pem)) {
        roots.add(cert?)?;
    }
    if roots.is_empty() {
        return Err(FleetError::Config(format!(
            "no certificates found in {}",
            ca_file.display()
        )));
    }
    Ok(roots)
}

/// Build the rustls config for the configured trust mode, or `None` when the
/// HTTP client's defaults should be used.
pub fn build_tls_config(cfg: &FleetConfig) -> Result<Option<ClientConfig>> {
    if let Some(ca_file) = &cfg.ca_file {
        let roots = load_roots(ca_file)?;
        let tls = ClientConfig::builder_with_provider(provider())
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();
        return Ok(Some(tls));
    }

    if cfg.allow_unverified_tls {
        warn!("TLS certificate verification is disabled for {}", cfg.host);
        let provider = provider();
        let verifier = Arc::new(UnverifiedServer { provider: Arc::clone(&provider) });
        let tls = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();
        return Ok(Some(tls));
    }

    Ok(None)
}
