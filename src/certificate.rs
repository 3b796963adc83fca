//! Building and decoding of host-identity certificates.
//!
//! A certificate binds an issuer identity to a subject over a validity
//! window. On the wire it is a nested, delimiter-based text sequence made
//! of three clauses: a public-key sequence, the signed statement and a
//! signature sequence. [`CertBuilder`] assembles the unsigned statement
//! that is handed to a signer; [`decode`] splits a received blob back into
//! its clauses for verification.

use std::net::Ipv6Addr;

use chrono::{DateTime, Duration, Local};
use regex::escape;
use tracing::debug;

use crate::error::{CertError, Result};
use crate::pattern::{self, fields};

/// Maximum accepted size of an encoded certificate blob. Certificates
/// travel inside protocol packets, so anything larger cannot be genuine.
pub const MAX_CERT_LEN: usize = 2048;

/// The minimal signed statement every certificate grows from.
const STATEMENT_SKELETON: &str = "(cert )";

/// Rendering of the validity bounds inside the statement, local time.
const TIME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Outcome of the last verification pass over a record. Only
/// [`crate::verify::verify`] moves this off `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verified {
    #[default]
    Unknown,
    Success,
    Failure,
}

/// A certificate split into its three wire sequences.
///
/// `statement` holds the exact bytes the digest is computed over.
/// `public_key` and `signature` stay empty until a signer has populated
/// them or [`decode`] has extracted them from a received blob.
#[derive(Debug, Clone, Default)]
pub struct CertificateRecord {
    pub public_key: String,
    pub statement: String,
    pub signature: String,
    /// 128-bit identity of the issuer, copied in by the builder.
    pub issuer_hit: [u8; 16],
    pub verified: Verified,
}

impl CertificateRecord {
    /// Renders the outer wire blob once the signer has populated the
    /// public-key and signature sequences. The result is what peers
    /// receive and what [`decode`] takes apart again.
    pub fn to_wire(&self) -> String {
        format!(
            "(sequence {}{}{})",
            self.public_key, self.statement, self.signature
        )
    }
}

/// Returns the statement skeleton that all injections build on.
pub fn skeleton() -> String {
    STATEMENT_SKELETON.to_string()
}

/// Inserts `fragment` immediately after the first occurrence of `anchor`
/// in `statement`, leaving everything past the insertion point unchanged.
pub fn inject(statement: &str, anchor: &str, fragment: &str) -> Result<String> {
    let m = pattern::find(&escape(anchor), statement)?
        .ok_or_else(|| CertError::AnchorNotFound(anchor.trim_end().to_string()))?;
    let mut out = String::with_capacity(statement.len() + fragment.len());
    out.push_str(&statement[..m.end]);
    out.push_str(fragment);
    out.push_str(&statement[m.end..]);
    Ok(out)
}

/// Builder for the signed statement of a certificate.
///
/// Follows the usual chain of consuming setters; [`CertBuilder::assemble`]
/// produces a [`CertificateRecord`] whose statement is ready for signing.
pub struct CertBuilder {
    issuer_hit: Ipv6Addr,
    subject_hit: Ipv6Addr,
    identity_type: String,
    valid_from: DateTime<Local>,
    valid_to: DateTime<Local>,
}

impl Default for CertBuilder {
    /// Validity defaults to the current time through one year from now.
    fn default() -> Self {
        Self {
            issuer_hit: Ipv6Addr::UNSPECIFIED,
            subject_hit: Ipv6Addr::UNSPECIFIED,
            identity_type: String::from("hit"),
            valid_from: Local::now(),
            valid_to: Local::now() + Duration::days(365),
        }
    }
}

impl CertBuilder {
    /// Creates a builder with default validity bounds.
    pub fn new() -> Self {
        Self::default()
    }
    /// 128-bit identity of the issuer.
    pub fn issuer_hit(mut self, hit: [u8; 16]) -> Self {
        self.issuer_hit = Ipv6Addr::from(hit);
        self
    }
    /// 128-bit identity of the subject.
    pub fn subject_hit(mut self, hit: [u8; 16]) -> Self {
        self.subject_hit = Ipv6Addr::from(hit);
        self
    }
    /// Identity presentation type used in the hash clauses.
    pub fn identity_type(mut self, identity_type: &str) -> Self {
        self.identity_type = identity_type.into();
        self
    }
    /// Start of the validity window.
    pub fn valid_from(mut self, valid_from: DateTime<Local>) -> Self {
        self.valid_from = valid_from;
        self
    }
    /// End of the validity window.
    pub fn valid_to(mut self, valid_to: DateTime<Local>) -> Self {
        self.valid_to = valid_to;
        self
    }

    /// Assembles the unsigned statement by injecting the validity bounds
    /// and the subject and issuer identity clauses into the skeleton.
    ///
    /// Each fragment lands immediately after its anchor, so fragments
    /// injected later at the same anchor end up earlier in the rendered
    /// text. The sequence below renders deterministically as
    ///
    /// ```text
    /// (cert (issuer (hash hit <I>))(subject (hash hit <S>))(not-before "<T>")(not-after "<T>"))
    /// ```
    pub fn assemble(&self) -> Result<CertificateRecord> {
        let not_before = format!(r#"(not-before "{}")"#, self.valid_from.format(TIME_FORMAT));
        let not_after = format!(r#"(not-after "{}")"#, self.valid_to.format(TIME_FORMAT));
        let subject = format!("(hash {} {})", self.identity_type, self.subject_hit);
        let issuer = format!("(hash {} {})", self.identity_type, self.issuer_hit);

        let mut statement = skeleton();
        statement = inject(&statement, "cert ", &not_after)?;
        statement = inject(&statement, "cert ", &not_before)?;
        statement = inject(&statement, "cert ", "(subject )")?;
        statement = inject(&statement, "subject ", &subject)?;
        statement = inject(&statement, "cert ", "(issuer )")?;
        statement = inject(&statement, "issuer ", &issuer)?;
        debug!(len = statement.len(), "assembled certificate statement");

        Ok(CertificateRecord {
            statement,
            issuer_hit: self.issuer_hit.octets(),
            ..Default::default()
        })
    }
}

/// Splits a raw certificate blob into its three sequences.
///
/// Extraction is all-or-nothing: the first clause that cannot be located
/// fails the whole decode with the name of the missing field, and no
/// partially filled record is ever returned.
pub fn decode(raw: &str) -> Result<CertificateRecord> {
    if raw.len() > MAX_CERT_LEN {
        return Err(CertError::CertificateTooLarge { len: raw.len() });
    }
    let public_key = pattern::find_field(fields::PUBLIC_KEY_SEQ, raw, "public_key")?
        .slice(raw)
        .to_string();
    let statement = pattern::find_field(fields::CERT_SEQ, raw, "cert")?
        .slice(raw)
        .to_string();
    let signature = pattern::find_field(fields::SIGNATURE_SEQ, raw, "signature")?
        .slice(raw)
        .to_string();
    debug!(
        public_key = public_key.len(),
        statement = statement.len(),
        signature = signature.len(),
        "decoded certificate blob"
    );
    Ok(CertificateRecord {
        public_key,
        statement,
        signature,
        ..Default::default()
    })
}
