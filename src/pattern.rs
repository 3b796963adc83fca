//! Single-field extraction over certificate text.
//!
//! The wire format is a nested delimiter grammar, so no single pattern can
//! take a whole certificate apart. Callers chain one extraction per field
//! against known anchor substrings instead; every call compiles its pattern
//! fresh and reports only the first leftmost match. A miss is a normal
//! outcome for absent or malformed fields and is surfaced as a typed error
//! by [`find_field`].

use regex::Regex;

use crate::error::{CertError, Result};

/// Span of the first match of a pattern, as byte offsets into the source
/// text. Consumed immediately by the caller to slice the matched field;
/// never stored across extraction steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    pub start: usize,
    pub end: usize,
}

impl PatternMatch {
    /// Returns the matched slice of `text`.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Finds the first leftmost match of `pattern` in `text`.
///
/// Returns `Ok(None)` when the pattern does not occur anywhere in `text`.
pub fn find(pattern: &str, text: &str) -> Result<Option<PatternMatch>> {
    let re = Regex::new(pattern)?;
    Ok(re.find(text).map(|m| PatternMatch {
        start: m.start(),
        end: m.end(),
    }))
}

/// Like [`find`], but a miss is reported as [`CertError::PatternNotFound`]
/// carrying the name of the wire field that was expected.
pub fn find_field(pattern: &str, text: &str, field: &'static str) -> Result<PatternMatch> {
    find(pattern, text)?.ok_or(CertError::PatternNotFound { field })
}

/// Field patterns of the certificate wire format.
///
/// Pipe-delimited fields keep `|` out of their character class, so a greedy
/// match can never run past the closing pipe into a neighbouring field.
pub mod fields {
    /// DSA public-key algorithm tag.
    pub const DSA_TAG: &str = "dsa-pkcs1-sha1";
    /// RSA public-key algorithm tag.
    pub const RSA_TAG: &str = "rsa-pkcs1-sha1";
    /// ECDSA algorithm tag family. Recognized so that callers can reject it
    /// explicitly instead of treating it as an unknown tag.
    pub const ECDSA_TAG: &str = "ecdsa[0-9a-z-]*";

    /// RSA public exponent, hex digits between `#` markers.
    pub const RSA_EXPONENT: &str = "#[0-9a-fA-F]*#";
    /// A base64 blob between pipe markers.
    pub const BASE64_FIELD: &str = r"\|[A-Za-z0-9+/()#=-]*\|";
    /// DSA prime modulus, anchored by its one-letter tag.
    pub const DSA_P: &str = r"\(p \|[A-Za-z0-9+/()#=-]*\|";
    /// DSA subprime.
    pub const DSA_Q: &str = r"\(q \|[A-Za-z0-9+/()#=-]*\|";
    /// DSA generator.
    pub const DSA_G: &str = r"\(g \|[A-Za-z0-9+/()#=-]*\|";
    /// DSA public key value.
    pub const DSA_Y: &str = r"\(y \|[A-Za-z0-9+/()#=-]*\|";
    /// Signature blob, anchored by the closing paren of the hash clause
    /// that precedes it. The two anchor characters are not part of the
    /// base64 payload.
    pub const SIGNATURE: &str = r"\)\|[A-Za-z0-9+/()#=-]*\|";

    /// Public-key sequence of a certificate blob.
    pub const PUBLIC_KEY_SEQ: &str = r"\(public_key [ -~]*\|\)\)\)";
    /// Signed-statement sequence of a certificate blob.
    pub const CERT_SEQ: &str = r#"\(cert [ -~]*"\)\)"#;
    /// Signature sequence of a certificate blob.
    pub const SIGNATURE_SEQ: &str = r"\(signature [ -~]*\|\)\)";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_returns_first_leftmost_match() {
        let m = find(fields::BASE64_FIELD, "(n |abc|)(m |def|)")
            .unwrap()
            .unwrap();
        assert_eq!(m.slice("(n |abc|)(m |def|)"), "|abc|");
    }

    #[test]
    fn find_reports_absent_pattern_as_none() {
        assert!(find(fields::RSA_EXPONENT, "no exponent here").unwrap().is_none());
    }

    #[test]
    fn find_field_names_the_missing_field() {
        let err = find_field(fields::DSA_P, "(q |abc|)", "p").unwrap_err();
        assert!(matches!(err, CertError::PatternNotFound { field: "p" }));
    }

    #[test]
    fn pipe_fields_do_not_cross_field_boundaries() {
        let text = "(p |AAAA|)(q |BBBB|)";
        let m = find(fields::DSA_P, text).unwrap().unwrap();
        assert_eq!(m.slice(text), "(p |AAAA|");
    }
}
