//! Batch AES-256-GCM encryption service.
//!
//! Each plaintext is sealed under a fresh 12-byte nonce which is prepended to
//! the GCM output; the result travels as URL-safe base64. Decryption returns
//! the recovered bytes base64url-encoded as well, so arbitrary binary
//! plaintexts survive the string-typed wire.
//!
//! # Batch semantics
//!
//! A call either produces one output per input, in input order, or fails with
//! the first error encountered. Partial output is never returned.
//!
//! # Call sequence
//!
//! `validate key -> build cipher -> (check cancel -> nonce -> seal/open -> encode)* -> return`

use crate::error::{CryptoError, CryptoResult};
use crate::random::RandomSource;
use crate::types::{
    decode_base64url, encode_base64url, DecryptRequest, DecryptResponse, EncryptRequest,
    EncryptResponse, Key, RandomKeyRequest, RandomKeyResponse, KEY_SIZE, NONCE_SIZE,
};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{Aes256Gcm, Nonce};
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

/// Operations the RPC front end depends on.
pub trait EncryptionPort: Send + Sync {
    /// Seal every plaintext under `request.key`.
    fn encrypt(
        &self,
        request: EncryptRequest,
        cancel: &CancellationToken,
    ) -> CryptoResult<EncryptResponse>;

    /// Open every ciphertext under `request.key`.
    fn decrypt(
        &self,
        request: DecryptRequest,
        cancel: &CancellationToken,
    ) -> CryptoResult<DecryptResponse>;

    /// Issue a fresh key of the requested length (only 32 is accepted).
    fn generate_random_key(&self, request: RandomKeyRequest) -> CryptoResult<RandomKeyResponse>;

    fn generate_id(&self) -> String;
}

/// Stateless encryption service over a [`RandomSource`].
#[derive(Debug, Default)]
pub struct EncryptionService<R> {
    random: R,
}

impl<R: RandomSource> EncryptionService<R> {
    pub fn new(random: R) -> Self {
        Self { random }
    }

    pub fn random_source(&self) -> &R {
        &self.random
    }
}

/// Validate the key and build the AEAD primitive.
fn build_cipher(key: &[u8]) -> CryptoResult<Aes256Gcm> {
    let key = Key::try_from(key).map_err(|e| {
        tracing::error!(key_length = key.len(), "Invalid key length");
        e
    })?;

    let block = Aes256::new_from_slice(key.as_bytes()).map_err(|e| {
        tracing::error!(error = %e, "Failed to create AES cipher");
        CryptoError::CipherCreationFailed(e.to_string())
    })?;

    // Wrapping a 128-bit block cipher in GCM with a 96-bit nonce cannot fail
    Ok(Aes256Gcm::from(block))
}

fn check_cancelled(cancel: &CancellationToken) -> CryptoResult<()> {
    if cancel.is_cancelled() {
        tracing::warn!("Batch cancelled by caller");
        return Err(CryptoError::Cancelled);
    }
    Ok(())
}

impl<R: RandomSource> EncryptionPort for EncryptionService<R> {
    fn encrypt(
        &self,
        request: EncryptRequest,
        cancel: &CancellationToken,
    ) -> CryptoResult<EncryptResponse> {
        let cipher = build_cipher(&request.key)?;
        check_cancelled(cancel)?;

        let mut ciphertext = Vec::with_capacity(request.plaintext.len());
        for plaintext in &request.plaintext {
            check_cancelled(cancel)?;

            let nonce = self.random.random_nonce(NONCE_SIZE)?;
            let sealed = cipher
                .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
                .map_err(|_| {
                    tracing::error!("GCM seal failed");
                    CryptoError::EncryptionFailed
                })?;

            let mut framed = Vec::with_capacity(NONCE_SIZE + sealed.len());
            framed.extend_from_slice(&nonce);
            framed.extend_from_slice(&sealed);
            ciphertext.push(encode_base64url(&framed));
        }

        tracing::debug!(count = ciphertext.len(), "Successfully encrypted messages");
        Ok(EncryptResponse { ciphertext })
    }

    fn decrypt(
        &self,
        request: DecryptRequest,
        cancel: &CancellationToken,
    ) -> CryptoResult<DecryptResponse> {
        let cipher = build_cipher(&request.key)?;
        check_cancelled(cancel)?;

        let mut plaintext = Vec::with_capacity(request.ciphertext.len());
        for (index, encoded) in request.ciphertext.iter().enumerate() {
            check_cancelled(cancel)?;

            let decoded = decode_base64url(encoded).map_err(|e| {
                tracing::error!(index, error = %e, "Failed to decode base64 ciphertext");
                e
            })?;

            if decoded.len() < NONCE_SIZE {
                tracing::error!(
                    index,
                    ciphertext_length = decoded.len(),
                    nonce_size = NONCE_SIZE,
                    "Ciphertext too short"
                );
                return Err(CryptoError::InvalidCiphertext {
                    actual: decoded.len(),
                });
            }

            let (nonce, body) = decoded.split_at(NONCE_SIZE);
            let opened = Zeroizing::new(cipher.decrypt(Nonce::from_slice(nonce), body).map_err(
                |_| {
                    tracing::error!(index, "Failed to decrypt message");
                    CryptoError::DecryptionFailed
                },
            )?);

            plaintext.push(encode_base64url(&opened));
        }

        tracing::debug!(count = plaintext.len(), "Successfully decrypted messages");
        Ok(DecryptResponse { plaintext })
    }

    fn generate_random_key(&self, request: RandomKeyRequest) -> CryptoResult<RandomKeyResponse> {
        if request.length != KEY_SIZE as i32 {
            tracing::error!(length = request.length, "Invalid key length requested");
            return Err(CryptoError::invalid_key_length(request.length.into()));
        }

        let key = self.random.generate_key(request.length)?;
        tracing::debug!("Successfully generated random key");
        Ok(RandomKeyResponse::new(key))
    }

    fn generate_id(&self) -> String {
        self.random.generate_id()
    }
}
