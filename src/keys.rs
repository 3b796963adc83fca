//! Algorithm detection and recovery of public-key material from the
//! textual public-key sequence of a certificate.
//!
//! Key material is rebuilt fresh on every verification call and dropped
//! when the call returns; nothing here caches between calls.

use std::fmt;

use base64::{Engine as _, engine::general_purpose};
use openssl::bn::BigNum;
use tracing::trace;

use crate::error::{CertError, Result};
use crate::pattern::{self, fields};

/// Public-key algorithm named by the tag in a public-key sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Rsa,
    Dsa,
    /// Tag family is recognized but no verification path exists for it.
    /// Callers must reject it explicitly rather than skip it.
    Ecdsa,
    /// No known tag matched.
    Unknown,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Rsa => "RSA",
            Algorithm::Dsa => "DSA",
            Algorithm::Ecdsa => "ECDSA",
            Algorithm::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Binary key material decoded from a public-key sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Rsa { modulus: Vec<u8>, exponent: Vec<u8> },
    Dsa {
        p: Vec<u8>,
        q: Vec<u8>,
        g: Vec<u8>,
        y: Vec<u8>,
    },
}

/// Determines the algorithm from the tag embedded in `public_key`.
///
/// The DSA tag is tested before the RSA tag; a tag from the ECDSA family
/// yields [`Algorithm::Ecdsa`] and anything else [`Algorithm::Unknown`].
pub fn detect_algorithm(public_key: &str) -> Result<Algorithm> {
    if pattern::find(fields::DSA_TAG, public_key)?.is_some() {
        Ok(Algorithm::Dsa)
    } else if pattern::find(fields::RSA_TAG, public_key)?.is_some() {
        Ok(Algorithm::Rsa)
    } else if pattern::find(fields::ECDSA_TAG, public_key)?.is_some() {
        Ok(Algorithm::Ecdsa)
    } else {
        Ok(Algorithm::Unknown)
    }
}

/// Recovers the key material for whichever algorithm `public_key` names.
/// Recognized-but-unimplemented and unknown tags are rejected with
/// [`CertError::UnsupportedAlgorithm`].
pub fn decode(public_key: &str) -> Result<KeyMaterial> {
    match detect_algorithm(public_key)? {
        Algorithm::Rsa => decode_rsa(public_key),
        Algorithm::Dsa => decode_dsa(public_key),
        other => Err(CertError::UnsupportedAlgorithm(other)),
    }
}

/// Extracts the RSA exponent (hex between `#` markers) and modulus
/// (base64 between pipes) from `public_key`.
pub fn decode_rsa(public_key: &str) -> Result<KeyMaterial> {
    let m = pattern::find_field(fields::RSA_EXPONENT, public_key, "e")?;
    let span = m.slice(public_key);
    let exponent = BigNum::from_hex_str(&span[1..span.len() - 1])?.to_vec();

    let m = pattern::find_field(fields::BASE64_FIELD, public_key, "n")?;
    let span = m.slice(public_key);
    let mut modulus = decode_base64(&span[1..span.len() - 1], "n")?;
    // Peers that emit the modulus through EVP-style base64 framing round
    // the decoded length up past the key size; trim back to the
    // multiple-of-4 boundary below it.
    if modulus.len() % 4 != 0 {
        modulus.truncate(modulus.len() & !3);
    }
    trace!(
        exponent = exponent.len(),
        modulus = modulus.len(),
        "decoded RSA key material"
    );
    Ok(KeyMaterial::Rsa { modulus, exponent })
}

/// Extracts the DSA p, q, g and y fields from `public_key`, each anchored
/// by its one-letter tag and base64-decoded independently.
pub fn decode_dsa(public_key: &str) -> Result<KeyMaterial> {
    let p = dsa_field(public_key, fields::DSA_P, "p")?;
    let q = dsa_field(public_key, fields::DSA_Q, "q")?;
    let g = dsa_field(public_key, fields::DSA_G, "g")?;
    let y = dsa_field(public_key, fields::DSA_Y, "y")?;
    trace!(
        p = p.len(),
        q = q.len(),
        g = g.len(),
        y = y.len(),
        "decoded DSA key material"
    );
    Ok(KeyMaterial::Dsa { p, q, g, y })
}

fn dsa_field(public_key: &str, field_pattern: &str, field: &'static str) -> Result<Vec<u8>> {
    let m = pattern::find_field(field_pattern, public_key, field)?;
    let span = m.slice(public_key);
    // The matched span carries the `(x |` anchor and the closing pipe.
    decode_base64(&span[4..span.len() - 1], field)
}

pub(crate) fn decode_base64(inner: &str, field: &'static str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(inner)
        .map_err(|source| CertError::MalformedBase64 { field, source })
}
