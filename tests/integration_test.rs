use base64::{Engine as _, engine::general_purpose};
use chrono::{Local, TimeZone};
use hit_cert::certificate::{self, CertBuilder, CertificateRecord, Verified};
use hit_cert::error::CertError;
use hit_cert::keys::{self, Algorithm};
use hit_cert::verify::verify;
use openssl::dsa::Dsa;
use openssl::hash::{MessageDigest, hash};
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::sign::Signer;

const ISSUER_HIT: [u8; 16] = [
    0x20, 0x01, 0x00, 0x1c, 0x5a, 0x14, 0x26, 0xde, 0xa0, 0x7c, 0x38, 0x5b, 0xde, 0x35, 0x60,
    0xe3,
];
const SUBJECT_HIT: [u8; 16] = [
    0x20, 0x01, 0x00, 0x13, 0x72, 0x4d, 0xf3, 0xc0, 0x6f, 0xf0, 0x33, 0xc2, 0x15, 0xd8, 0x5f,
    0x50,
];

const GOLDEN_STATEMENT: &str = concat!(
    "(cert ",
    "(issuer (hash hit 2001:1c:5a14:26de:a07c:385b:de35:60e3))",
    "(subject (hash hit 2001:13:724d:f3c0:6ff0:33c2:15d8:5f50))",
    "(not-before \"2011-09-25_10:00:00\")",
    "(not-after \"2012-09-25_10:00:00\")",
    ")"
);

fn sample_record() -> CertificateRecord {
    CertBuilder::new()
        .issuer_hit(ISSUER_HIT)
        .subject_hit(SUBJECT_HIT)
        .valid_from(Local.with_ymd_and_hms(2011, 9, 25, 10, 0, 0).single().unwrap())
        .valid_to(Local.with_ymd_and_hms(2012, 9, 25, 10, 0, 0).single().unwrap())
        .assemble()
        .expect("failed to assemble statement")
}

fn b64(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

fn signature_sequence(statement: &[u8], signature: &[u8]) -> String {
    let digest = hash(MessageDigest::sha1(), statement).unwrap();
    format!(
        "(signature (hash sha1 |{}|)|{}|)",
        b64(&digest),
        b64(signature)
    )
}

/// Stands in for the external signing service: populates the public-key
/// and signature sequences of `record` with a fresh RSA key.
fn rsa_sign(record: &mut CertificateRecord) -> Result<(), Box<dyn std::error::Error>> {
    let rsa = Rsa::generate(1024)?;
    record.public_key = format!(
        "(public_key (rsa-pkcs1-sha1 (e #{}#)(n |{}|)))",
        rsa.e().to_hex_str()?,
        b64(&rsa.n().to_vec()),
    );
    let pkey = PKey::from_rsa(rsa)?;
    let mut signer = Signer::new(MessageDigest::sha1(), &pkey)?;
    signer.update(record.statement.as_bytes())?;
    let signature = signer.sign_to_vec()?;
    record.signature = signature_sequence(record.statement.as_bytes(), &signature);
    Ok(())
}

/// Same as [`rsa_sign`] for DSA: the DER (r, s) pair produced by the
/// backend is repacked into the wire blob of one marker byte followed by
/// the two fixed-width halves.
fn dsa_sign(record: &mut CertificateRecord) -> Result<(), Box<dyn std::error::Error>> {
    let dsa = Dsa::generate(1024)?;
    record.public_key = format!(
        "(public_key (dsa-pkcs1-sha1 (p |{}|)(q |{}|)(g |{}|)(y |{}|)))",
        b64(&dsa.p().to_vec()),
        b64(&dsa.q().to_vec()),
        b64(&dsa.g().to_vec()),
        b64(&dsa.pub_key().to_vec()),
    );
    let pkey = PKey::from_dsa(dsa)?;
    let mut signer = Signer::new(MessageDigest::sha1(), &pkey)?;
    signer.update(record.statement.as_bytes())?;
    let der = signer.sign_to_vec()?;
    let (r, s) = yasna::parse_der(&der, |reader| {
        reader.read_sequence(|reader| {
            let (r, _) = reader.next().read_bigint_bytes()?;
            let (s, _) = reader.next().read_bigint_bytes()?;
            Ok((r, s))
        })
    })?;
    let mut blob = vec![0u8];
    blob.extend(fixed_width(&r, 20));
    blob.extend(fixed_width(&s, 20));
    record.signature = signature_sequence(record.statement.as_bytes(), &blob);
    Ok(())
}

fn fixed_width(value: &[u8], width: usize) -> Vec<u8> {
    let mut trimmed = value;
    while trimmed.len() > 1 && trimmed[0] == 0 {
        trimmed = &trimmed[1..];
    }
    assert!(trimmed.len() <= width, "value wider than {width} bytes");
    let mut out = vec![0u8; width - trimmed.len()];
    out.extend_from_slice(trimmed);
    out
}

/// Flips one byte of the base64-decoded signature blob while leaving the
/// embedded hash field untouched.
fn corrupt_signature(record: &mut CertificateRecord) {
    let anchor = record.signature.rfind(")|").unwrap();
    let inner = &record.signature[anchor + 2..record.signature.len() - 2];
    let mut blob = general_purpose::STANDARD.decode(inner).unwrap();
    blob[10] ^= 0x01;
    record.signature = format!("{}|{}|)", &record.signature[..anchor + 1], b64(&blob));
}

#[test]
fn builder_matches_the_golden_statement() {
    let record = sample_record();
    assert_eq!(record.statement, GOLDEN_STATEMENT);
    assert_eq!(record.issuer_hit, ISSUER_HIT);
    assert_eq!(record.verified, Verified::Unknown);
}

#[test]
fn round_trip_preserves_the_statement() -> Result<(), Box<dyn std::error::Error>> {
    let mut record = sample_record();
    rsa_sign(&mut record)?;
    let decoded = certificate::decode(&record.to_wire())?;
    assert_eq!(decoded.statement, record.statement);
    assert_eq!(decoded.public_key, record.public_key);
    assert!(decoded.signature.starts_with(&record.signature));
    Ok(())
}

#[test]
fn valid_rsa_signature_verifies() -> Result<(), Box<dyn std::error::Error>> {
    let mut record = sample_record();
    rsa_sign(&mut record)?;
    let mut decoded = certificate::decode(&record.to_wire())?;
    verify(&mut decoded)?;
    assert_eq!(decoded.verified, Verified::Success);
    Ok(())
}

#[test]
fn valid_dsa_signature_verifies() -> Result<(), Box<dyn std::error::Error>> {
    let mut record = sample_record();
    dsa_sign(&mut record)?;
    let mut decoded = certificate::decode(&record.to_wire())?;
    verify(&mut decoded)?;
    assert_eq!(decoded.verified, Verified::Success);
    Ok(())
}

#[test]
fn tampered_statement_is_a_digest_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    let mut record = sample_record();
    rsa_sign(&mut record)?;
    let mut decoded = certificate::decode(&record.to_wire())?;
    let mut bytes = decoded.statement.into_bytes();
    bytes[30] ^= 0x01;
    decoded.statement = String::from_utf8(bytes)?;
    let err = verify(&mut decoded).unwrap_err();
    assert!(matches!(err, CertError::DigestMismatch));
    assert_eq!(decoded.verified, Verified::Failure);
    Ok(())
}

#[test]
fn corrupted_rsa_signature_is_invalid() -> Result<(), Box<dyn std::error::Error>> {
    let mut record = sample_record();
    rsa_sign(&mut record)?;
    corrupt_signature(&mut record);
    let mut decoded = certificate::decode(&record.to_wire())?;
    let err = verify(&mut decoded).unwrap_err();
    assert!(matches!(err, CertError::SignatureInvalid));
    assert_eq!(decoded.verified, Verified::Failure);
    Ok(())
}

#[test]
fn corrupted_dsa_signature_is_invalid() -> Result<(), Box<dyn std::error::Error>> {
    let mut record = sample_record();
    dsa_sign(&mut record)?;
    corrupt_signature(&mut record);
    let mut decoded = certificate::decode(&record.to_wire())?;
    let err = verify(&mut decoded).unwrap_err();
    assert!(matches!(err, CertError::SignatureInvalid));
    assert_eq!(decoded.verified, Verified::Failure);
    Ok(())
}

#[test]
fn unknown_algorithm_is_rejected() {
    let mut record = sample_record();
    record.public_key = String::from("(public_key (foo-pkcs1-sha1 (n |AAAA|)))");
    record.signature = String::from("(signature (hash sha1 |AAAA|)|AAAA|)");
    assert_eq!(
        keys::detect_algorithm(&record.public_key).unwrap(),
        Algorithm::Unknown
    );
    let err = verify(&mut record).unwrap_err();
    assert!(matches!(
        err,
        CertError::UnsupportedAlgorithm(Algorithm::Unknown)
    ));
    assert_eq!(record.verified, Verified::Failure);
}

#[test]
fn ecdsa_is_recognized_but_rejected() {
    let mut record = sample_record();
    record.public_key = String::from("(public_key (ecdsa-sha256 (n |AAAA|)))");
    record.signature = String::from("(signature (hash sha1 |AAAA|)|AAAA|)");
    assert_eq!(
        keys::detect_algorithm(&record.public_key).unwrap(),
        Algorithm::Ecdsa
    );
    let err = verify(&mut record).unwrap_err();
    assert!(matches!(
        err,
        CertError::UnsupportedAlgorithm(Algorithm::Ecdsa)
    ));
}

#[test]
fn missing_signature_clause_fails_the_whole_decode() -> Result<(), Box<dyn std::error::Error>> {
    let mut record = sample_record();
    rsa_sign(&mut record)?;
    let blob = format!("(sequence {}{})", record.public_key, record.statement);
    let err = certificate::decode(&blob).unwrap_err();
    assert!(matches!(
        err,
        CertError::PatternNotFound { field: "signature" }
    ));
    Ok(())
}

#[test]
fn missing_public_key_clause_fails_the_whole_decode() -> Result<(), Box<dyn std::error::Error>> {
    let mut record = sample_record();
    rsa_sign(&mut record)?;
    let blob = format!("(sequence {}{})", record.statement, record.signature);
    let err = certificate::decode(&blob).unwrap_err();
    assert!(matches!(
        err,
        CertError::PatternNotFound { field: "public_key" }
    ));
    Ok(())
}
