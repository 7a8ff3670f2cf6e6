//! Content-addressed identifiers for entities fetched from the control plane.
//!
//! Fetched certificates have no key this client controls, so their identity is
//! a digest over their observed fields. Field order is part of the contract:
//! the same values in a different order give a different fingerprint.

use std::io::{self, Write};

use sha2::{Digest, Sha256};

use crate::api::models::Certificate;
use crate::error::{FleetError, Result};

/// SHA-256 over the fields concatenated in order with no separator, as
/// lowercase hex.
pub fn fingerprint<S: AsRef<str>>(ordered_fields: &[S]) -> Result<String> {
    let mut hasher = Sha256::new();
    for field in ordered_fields {
        hasher
            .write_all(field.as_ref().as_bytes())
            .map_err(|e: io::Error| FleetError::Encoding(format!("digest write failed: {e}")))?;
    }
    Ok(hex::encode(hasher.finalize()))
}

fn text(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

/// The certificate's identity fields in their fixed order. Absent values
/// render as empty strings.
pub fn certificate_fields(cert: &Certificate) -> Vec<String> {
    vec![
        text(&cert.domain),
        text(&cert.certificate_error),
        text(&cert.expiration_status),
        cert.is_installed.map(|b| b.to_string()).unwrap_or_default(),
        text(&cert.issued_by),
        text(&cert.issued_to),
        text(&cert.key_size),
        text(&cert.not_after),
        text(&cert.not_before),
        cert.number_of_days_to_expire.map(|n| n.to_string()).unwrap_or_default(),
        text(&cert.pem_encoded),
        text(&cert.public_key),
        text(&cert.public_key_algorithm),
        text(&cert.serial_number),
        text(&cert.signature_algorithm),
        text(&cert.subject),
        text(&cert.thumbprint),
        text(&cert.thumbprint_algorithm),
        text(&cert.version),
    ]
}

/// Stable identifier for a fetched certificate.
pub fn certificate_id(cert: &Certificate) -> Result<String> {
    fingerprint(&certificate_fields(cert))
}
