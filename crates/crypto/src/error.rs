//! Error taxonomy for the encryption service.
//!
//! The set of kinds is closed. Callers branch on [`CryptoError::kind`]; the
//! wrapped causes exist for logs only and never reach a client.

use std::fmt;
use thiserror::Error;

/// Errors produced by the randomness source and the cryptographic service.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: {actual} (expected {expected})")]
    InvalidKeyLength { expected: usize, actual: i64 },

    #[error("malformed ciphertext: {actual} bytes is shorter than the nonce")]
    InvalidCiphertext { actual: usize },

    #[error("base64 decoding failed: {0}")]
    Base64DecodingFailed(#[source] base64::DecodeError),

    #[error("failed to create cipher: {0}")]
    CipherCreationFailed(String),

    #[error("failed to create GCM: {0}")]
    GcmCreationFailed(String),

    #[error("insufficient randomness available: {0}")]
    InsufficientRandomness(#[source] rand::Error),

    #[error("encryption failed")]
    EncryptionFailed,

    /// Tag mismatch or truncated body. Wrong key and tampering are indistinguishable.
    #[error("decryption failed")]
    DecryptionFailed,

    #[error("operation cancelled")]
    Cancelled,
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Fieldless discriminant of [`CryptoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidKeyLength,
    InvalidCiphertext,
    Base64DecodingFailed,
    CipherCreationFailed,
    GcmCreationFailed,
    InsufficientRandomness,
    EncryptionFailed,
    DecryptionFailed,
    Cancelled,
}

impl ErrorKind {
    /// Stable name, used as the `x-error-kind` wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidKeyLength => "InvalidKeyLength",
            ErrorKind::InvalidCiphertext => "InvalidCiphertext",
            ErrorKind::Base64DecodingFailed => "Base64DecodingFailed",
            ErrorKind::CipherCreationFailed => "CipherCreationFailed",
            ErrorKind::GcmCreationFailed => "GCMCreationFailed",
            ErrorKind::InsufficientRandomness => "InsufficientRandomness",
            ErrorKind::EncryptionFailed => "EncryptionFailed",
            ErrorKind::DecryptionFailed => "DecryptionFailed",
            ErrorKind::Cancelled => "Cancelled",
        }
    }

    /// Client-facing message. Carries no detail about the underlying cause.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidKeyLength => "invalid key length",
            ErrorKind::InvalidCiphertext => "malformed ciphertext",
            ErrorKind::Base64DecodingFailed => "base64 decoding failed",
            ErrorKind::CipherCreationFailed => "failed to create cipher",
            ErrorKind::GcmCreationFailed => "failed to create GCM",
            ErrorKind::InsufficientRandomness => "insufficient randomness available",
            ErrorKind::EncryptionFailed => "encryption failed",
            ErrorKind::DecryptionFailed => "decryption failed",
            ErrorKind::Cancelled => "operation cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::InvalidKeyLength { .. } => ErrorKind::InvalidKeyLength,
            CryptoError::InvalidCiphertext { .. } => ErrorKind::InvalidCiphertext,
            CryptoError::Base64DecodingFailed(_) => ErrorKind::Base64DecodingFailed,
            CryptoError::CipherCreationFailed(_) => ErrorKind::CipherCreationFailed,
            CryptoError::GcmCreationFailed(_) => ErrorKind::GcmCreationFailed,
            CryptoError::InsufficientRandomness(_) => ErrorKind::InsufficientRandomness,
            CryptoError::EncryptionFailed => ErrorKind::EncryptionFailed,
            CryptoError::DecryptionFailed => ErrorKind::DecryptionFailed,
            CryptoError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn invalid_key_length(actual: i64) -> Self {
        CryptoError::InvalidKeyLength {
            expected: crate::types::KEY_SIZE,
            actual,
        }
    }
}
