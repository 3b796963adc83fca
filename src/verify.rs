//! Signature verification over decoded certificate records.
//!
//! Verification is a pure function of the record contents: key material is
//! rebuilt from the public-key sequence, the statement is digested with
//! SHA-1, the embedded hash field is compared against that digest, and the
//! signature is checked with the algorithm the public key names. Nothing is
//! cached and nothing is retried.

use openssl::bn::BigNum;
use openssl::dsa::Dsa;
use openssl::hash::{MessageDigest, hash};
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::sign::Verifier;
use tracing::debug;

use crate::certificate::{CertificateRecord, Verified};
use crate::error::{CertError, Result};
use crate::keys::{self, Algorithm, KeyMaterial};
use crate::pattern::{self, fields};

/// Byte width of each half of a wire DSA signature (the r and s values).
const DSA_SIG_HALF: usize = 20;

/// Verifies the signature sequence of `record` against its statement and
/// public-key sequence.
///
/// `record.verified` is set to `Success` only when the underlying
/// primitive reports success; every other outcome, including backend
/// errors, leaves it at `Failure` and returns the specific cause.
pub fn verify(record: &mut CertificateRecord) -> Result<()> {
    match check(record) {
        Ok(()) => {
            record.verified = Verified::Success;
            Ok(())
        }
        Err(err) => {
            record.verified = Verified::Failure;
            Err(err)
        }
    }
}

fn check(record: &CertificateRecord) -> Result<()> {
    let algorithm = keys::detect_algorithm(&record.public_key)?;
    let material = match algorithm {
        Algorithm::Rsa => keys::decode_rsa(&record.public_key)?,
        Algorithm::Dsa => keys::decode_dsa(&record.public_key)?,
        other => return Err(CertError::UnsupportedAlgorithm(other)),
    };

    let digest = hash(MessageDigest::sha1(), record.statement.as_bytes())?;

    // The embedded hash field detects statement tampering on its own,
    // independent of whether the signature itself holds up.
    let m = pattern::find_field(fields::BASE64_FIELD, &record.signature, "hash")?;
    let span = m.slice(&record.signature);
    let embedded = keys::decode_base64(&span[1..span.len() - 1], "hash")?;
    if embedded != digest.as_ref() {
        return Err(CertError::DigestMismatch);
    }

    let m = pattern::find_field(fields::SIGNATURE, &record.signature, "signature")?;
    let span = m.slice(&record.signature);
    let signature = keys::decode_base64(&span[2..span.len() - 1], "signature")?;

    let ok = match material {
        KeyMaterial::Rsa { modulus, exponent } => verify_rsa(
            &modulus,
            &exponent,
            record.statement.as_bytes(),
            &signature,
        )?,
        KeyMaterial::Dsa { p, q, g, y } => {
            verify_dsa(&p, &q, &g, &y, record.statement.as_bytes(), &signature)?
        }
    };
    debug!(%algorithm, ok, "signature check");
    if ok { Ok(()) } else { Err(CertError::SignatureInvalid) }
}

/// PKCS#1 v1.5 verification with the SHA-1 digest identifier against a key
/// rebuilt from the decoded modulus and exponent.
fn verify_rsa(modulus: &[u8], exponent: &[u8], statement: &[u8], signature: &[u8]) -> Result<bool> {
    let key = Rsa::from_public_components(
        BigNum::from_slice(modulus)?,
        BigNum::from_slice(exponent)?,
    )?;
    let key = PKey::from_rsa(key)?;
    let mut verifier = Verifier::new(MessageDigest::sha1(), &key)?;
    verifier.update(statement)?;
    Ok(verifier.verify(signature)?)
}

/// DSA verification of the fixed-width (r, s) pair against a key rebuilt
/// from the decoded p, q, g and y values.
///
/// The wire signature blob is one format marker byte followed by the two
/// 20-byte halves; the backend wants the pair DER-encoded.
fn verify_dsa(
    p: &[u8],
    q: &[u8],
    g: &[u8],
    y: &[u8],
    statement: &[u8],
    signature: &[u8],
) -> Result<bool> {
    if signature.len() != 1 + 2 * DSA_SIG_HALF {
        return Ok(false);
    }
    // The fixed-width halves may carry leading zero bytes that a DER
    // INTEGER must not.
    let r = strip_leading_zeros(&signature[1..1 + DSA_SIG_HALF]);
    let s = strip_leading_zeros(&signature[1 + DSA_SIG_HALF..]);
    let der = yasna::construct_der(|writer| {
        writer.write_sequence(|writer| {
            writer.next().write_bigint_bytes(r, true);
            writer.next().write_bigint_bytes(s, true);
        });
    });

    let key = Dsa::from_public_components(
        BigNum::from_slice(p)?,
        BigNum::from_slice(q)?,
        BigNum::from_slice(g)?,
        BigNum::from_slice(y)?,
    )?;
    let key = PKey::from_dsa(key)?;
    let mut verifier = Verifier::new(MessageDigest::sha1(), &key)?;
    verifier.update(statement)?;
    Ok(verifier.verify(&der)?)
}

fn strip_leading_zeros(mut bytes: &[u8]) -> &[u8] {
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes = &bytes[1..];
    }
    bytes
}
