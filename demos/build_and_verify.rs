use base64::{Engine as _, engine::general_purpose};
use hit_cert::certificate::{self, CertBuilder, CertificateRecord};
use hit_cert::verify::verify;
use openssl::hash::{MessageDigest, hash};
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::sign::Signer;

/// Assemble a certificate statement, sign it locally in place of the
/// external signing service, then decode the resulting wire blob and
/// verify it the way a receiving peer would.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Assembling the certificate statement...");
    let mut record = CertBuilder::new()
        .issuer_hit([
            0x20, 0x01, 0x00, 0x1c, 0x5a, 0x14, 0x26, 0xde, 0xa0, 0x7c, 0x38, 0x5b, 0xde, 0x35,
            0x60, 0xe3,
        ])
        .subject_hit([
            0x20, 0x01, 0x00, 0x13, 0x72, 0x4d, 0xf3, 0xc0, 0x6f, 0xf0, 0x33, 0xc2, 0x15, 0xd8,
            0x5f, 0x50,
        ])
        .assemble()?;
    println!("{}", record.statement);

    println!("Signing with a locally generated RSA key...");
    sign_with_fresh_rsa_key(&mut record)?;
    let blob = record.to_wire();
    println!("{blob}");

    println!("Decoding and verifying the received blob...");
    let mut received = certificate::decode(&blob)?;
    match verify(&mut received) {
        Ok(()) => println!("verify ok"),
        Err(err) => println!("failed verify: {err}"),
    }
    Ok(())
}

fn sign_with_fresh_rsa_key(
    record: &mut CertificateRecord,
) -> Result<(), Box<dyn std::error::Error>> {
    let b64 = |data: &[u8]| general_purpose::STANDARD.encode(data);
    let rsa = Rsa::generate(2048)?;
    let exponent = rsa.e().to_hex_str()?;
    record.public_key = format!(
        "(public_key (rsa-pkcs1-sha1 (e #{}#)(n |{}|)))",
        &*exponent,
        b64(&rsa.n().to_vec()),
    );
    let pkey = PKey::from_rsa(rsa)?;
    let mut signer = Signer::new(MessageDigest::sha1(), &pkey)?;
    signer.update(record.statement.as_bytes())?;
    let signature = signer.sign_to_vec()?;
    let digest = hash(MessageDigest::sha1(), record.statement.as_bytes())?;
    record.signature = format!(
        "(signature (hash sha1 |{}|)|{}|)",
        b64(&digest),
        b64(&signature)
    );
    Ok(())
}
