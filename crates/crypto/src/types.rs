//! Domain values exchanged with the encryption service.
//!
//! Every value here lives for a single call. Key material zeroizes on drop.

use crate::error::CryptoError;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::Engine as _;
use std::borrow::Cow;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Standard GCM nonce size (96 bits / 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// URL-safe base64 with `=` padding, the only transport encoding on the wire.
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Decoder accepting non-zero spare bits in the final symbol.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Inverse of [`encode_base64url`]. Line breaks are ignored so that text
/// wrapped by mail clients still decodes.
pub fn decode_base64url(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    let input = if encoded.contains(['\r', '\n']) {
        Cow::Owned(encoded.replace(['\r', '\n'], ""))
    } else {
        Cow::Borrowed(encoded)
    };

    URL_SAFE_LENIENT
        .decode(input.as_bytes())
        .map_err(CryptoError::Base64DecodingFailed)
}

/// Opaque 32-byte symmetric key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Canonical URL-safe base64 rendering of the key bytes.
    pub fn to_base64(&self) -> String {
        encode_base64url(&self.0)
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::invalid_key_length(bytes.len() as i64))?;
        Ok(Self(array))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

/// Batch of plaintexts to seal under one key.
#[derive(Clone)]
pub struct EncryptRequest {
    pub plaintext: Vec<String>,
    pub key: Zeroizing<Vec<u8>>,
}

impl EncryptRequest {
    pub fn new(plaintext: Vec<String>, key: Vec<u8>) -> Self {
        Self {
            plaintext,
            key: Zeroizing::new(key),
        }
    }
}

impl fmt::Debug for EncryptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptRequest")
            .field("plaintext_count", &self.plaintext.len())
            .field("key_len", &self.key.len())
            .finish()
    }
}

/// `ciphertext[i]` is `base64url(nonce || sealed)` for `plaintext[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptResponse {
    pub ciphertext: Vec<String>,
}

/// Batch of base64url ciphertexts to open under one key.
#[derive(Clone)]
pub struct DecryptRequest {
    pub ciphertext: Vec<String>,
    pub key: Zeroizing<Vec<u8>>,
}

impl DecryptRequest {
    pub fn new(ciphertext: Vec<String>, key: Vec<u8>) -> Self {
        Self {
            ciphertext,
            key: Zeroizing::new(key),
        }
    }
}

impl fmt::Debug for DecryptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptRequest")
            .field("ciphertext_count", &self.ciphertext.len())
            .field("key_len", &self.key.len())
            .finish()
    }
}

/// `plaintext[i]` is the base64url of the bytes recovered from `ciphertext[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptResponse {
    pub plaintext: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomKeyRequest {
    pub length: i32,
}

/// Fresh key plus its base64url string form.
#[derive(Debug, Clone)]
pub struct RandomKeyResponse {
    pub key: Key,
    pub key_string: String,
}

impl RandomKeyResponse {
    pub fn new(key: Key) -> Self {
        let key_string = key.to_base64();
        Self { key, key_string }
    }
}
