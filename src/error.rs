use thiserror::Error;

use crate::keys::Algorithm;

/// Errors produced while building, decoding or verifying a certificate.
///
/// Every fallible step fails fast with the specific kind below; no step
/// substitutes a default or continues with partial data. Malformed wire
/// input always resolves to one of these values, never a panic.
#[derive(Debug, Error)]
pub enum CertError {
    /// A wire field did not occur where the format requires it.
    #[error("certificate has no {field} field")]
    PatternNotFound { field: &'static str },

    /// A builder anchor does not occur in the statement text.
    #[error("anchor `{0}` not present in statement")]
    AnchorNotFound(String),

    /// A field between pipe markers did not decode as base64.
    #[error("{field} field holds invalid base64: {source}")]
    MalformedBase64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// The public-key sequence names an algorithm without a verification
    /// path. Carries `Ecdsa` for the recognized-but-unimplemented tag
    /// family and `Unknown` for tags that match nothing.
    #[error("unsupported public key algorithm: {0}")]
    UnsupportedAlgorithm(Algorithm),

    /// The embedded signed-hash field differs from the digest of the
    /// statement, independent of signature validity.
    #[error("embedded hash does not match statement digest")]
    DigestMismatch,

    /// The signature did not verify against the embedded public key.
    #[error("signature check failed")]
    SignatureInvalid,

    /// The encoded blob exceeds the packet-equivalent size cap.
    #[error("certificate blob of {len} bytes exceeds the maximum encoded size")]
    CertificateTooLarge { len: usize },

    /// An extraction pattern failed to compile.
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The crypto backend reported an error. rust-openssl drains the
    /// library error queue into this value, so no stale state survives
    /// into later calls.
    #[error("crypto backend error: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),
}

pub type Result<T> = std::result::Result<T, CertError>;
