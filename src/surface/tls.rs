//! rustls client configurations handed to the probe's HTTP client.
//!
//! The first request always verifies against the CA bundle. Only after the
//! certificate policy trusted a failed certificate is the second,
//! non-verifying configuration used.

use crate::error::ProbeError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::error::Error as StdError;
use std::path::Path;
use std::sync::Arc;

fn provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
}

fn tls_err(e: rustls::Error) -> ProbeError {
    ProbeError::Tls(e.to_string())
}

/// Verifying configuration rooted in a PEM bundle. A missing or unreadable
/// bundle yields an empty root store, so every certificate goes through the
/// policy.
pub fn verifying_config(ca_bundle: &Path) -> Result<ClientConfig, ProbeError> {
    let mut roots = RootCertStore::empty();
    match CertificateDer::pem_file_iter(ca_bundle) {
        Ok(certs) => {
            let (added, ignored) = roots.add_parsable_certificates(certs.flatten());
            tracing::debug!(added, ignored, "loaded CA bundle {}", ca_bundle.display());
        }
        Err(e) => {
            tracing::warn!("Cannot read CA bundle {}: {}", ca_bundle.display(), e);
        }
    }

    let config = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .map_err(tls_err)?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

/// Configuration that accepts any server certificate.
pub fn trusting_config() -> Result<ClientConfig, ProbeError> {
    let provider = provider();
    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(tls_err)?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
        .with_no_client_auth();
    Ok(config)
}

/// Find the rustls error somewhere in a request failure's source chain.
/// `io::Error` hides its payload from `source()`, so it is unwrapped by hand.
pub fn rustls_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        if let Some(tls) = e
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        {
            return Some(tls);
        }
        current = e.source();
    }
    None
}

/// Pull a certificate failure out of a request error.
pub fn certificate_failure(err: &(dyn StdError + 'static)) -> Option<String> {
    match rustls_error(err)? {
        rustls::Error::InvalidCertificate(reason) => Some(format!("{:?}", reason)),
        _ => None,
    }
}

#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
