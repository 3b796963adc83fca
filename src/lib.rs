//! # Hit-Cert
//!
//! ## Description
//!
//! A small library for building, decoding and verifying the compact
//! text-encoded authorization certificates used by host-identity
//! security protocols. A certificate is a nested, delimiter-based
//! sequence (SPKI style) that binds an issuer identity to a subject over
//! a validity window; it carries a public-key sequence, a signed
//! statement and a signature sequence.
//!
//! The package has not been reviewed for any security issues and is
//! intended for testing purposes only.
//!
//! This library provides:
//! - Assembling the signed statement of a certificate from issuer and
//!   subject identities and a validity window
//! - Splitting a received certificate blob into its public-key,
//!   statement and signature sequences
//! - Recovering RSA or DSA key material from the textual public-key
//!   sequence
//! - Verifying the embedded statement digest and the signature
//!   (RSA PKCS#1 v1.5 or DSA, both over SHA-1; ECDSA tags are recognized
//!   and rejected explicitly)
//!
//! Signing itself is performed by an external service; this crate only
//! produces the statement text the signer consumes and checks the result
//! it returns.
//!
//! ## Basic example: assembling a statement
//! ```rust
//! use hit_cert::certificate::CertBuilder;
//!
//! let record = CertBuilder::new()
//!     .issuer_hit([
//!         0x20, 0x01, 0x00, 0x1c, 0x5a, 0x14, 0x26, 0xde,
//!         0xa0, 0x7c, 0x38, 0x5b, 0xde, 0x35, 0x60, 0xe3,
//!     ])
//!     .subject_hit([
//!         0x20, 0x01, 0x00, 0x13, 0x72, 0x4d, 0xf3, 0xc0,
//!         0x6f, 0xf0, 0x33, 0xc2, 0x15, 0xd8, 0x5f, 0x50,
//!     ])
//!     .assemble()
//!     .expect("failed to assemble statement");
//! assert!(record.statement.starts_with("(cert (issuer (hash hit "));
//! ```
//!
//! ## Basic example: decoding and verifying a received certificate
//! ```rust,no_run
//! use hit_cert::{certificate, verify};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let blob = std::fs::read_to_string("peer.cert")?;
//! let mut record = certificate::decode(&blob)?;
//! verify::verify(&mut record)?;
//! println!("verified: {:?}", record.verified);
//! # Ok(())
//! # }
//! ```
//!
//! ## Wire format
//!
//! The outer blob holds three independently anchored clauses:
//!
//! ```text
//! (sequence (public_key <pk-seq>)(cert <statement>)(signature <sig-seq>))
//! ```
//!
//! | clause | content |
//! | ---------- | ------------------------------------------------------------------ |
//! | public_key | `(rsa-pkcs1-sha1 (e #hex#)(n \|b64\|))` or `(dsa-pkcs1-sha1 (p \|b64\|)(q \|b64\|)(g \|b64\|)(y \|b64\|))` |
//! | cert       | `(issuer (hash hit <hit>))(subject (hash hit <hit>))(not-before "<t>")(not-after "<t>")` |
//! | signature  | `(hash sha1 \|b64 digest\|)\|b64 signature\|` |
//!
//! Host identities are 128-bit values presented in the standard
//! colon-hex form; validity bounds are local time rendered as
//! `YYYY-MM-DD_HH:MM:SS`. The statement sequence is the exact byte range
//! the SHA-1 digest and the signature are computed over, so it must reach
//! the signer and the verifier unchanged.

pub mod certificate;
pub mod error;
pub mod keys;
pub mod pattern;
pub mod verify;
