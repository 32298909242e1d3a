//! Batch authenticated encryption for the password-exchange services.
//!
//! This crate provides the cryptographic core behind the `MessageService`
//! RPC: AES-256-GCM sealing and opening of message batches under a
//! caller-supplied key, fresh key issuance, and short unique identifiers.
//!
//! # Layers
//!
//! - **Randomness** ([`random`], [`id`]): the single audit point for CSPRNG use
//! - **Service** ([`service`]): stateless seal/open with base64url transport
//! - **gRPC** (`grpc_server`, feature `grpc-server`): tonic front end with reflection
//!
//! # Wire format
//!
//! Each ciphertext element is `base64url(nonce(12) || ciphertext || tag(16))`.
//! Decrypted plaintexts are returned base64url-encoded as well.
//!
//! # Security Principles
//!
//! - Only AES-256-GCM; keys must be exactly 32 bytes
//! - A fresh random nonce for every element
//! - No associated data
//! - Key material is zeroized after use and never logged

pub mod error;
pub mod id;
pub mod random;
pub mod service;
pub mod types;

#[cfg(feature = "grpc-server")]
pub mod grpc_server;

pub use error::{CryptoError, CryptoResult, ErrorKind};
pub use id::IdGenerator;
pub use random::{OsRandomSource, RandomSource, SeededRandomSource};
pub use service::{EncryptionPort, EncryptionService};
pub use types::{
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, Key, RandomKeyRequest,
    RandomKeyResponse, KEY_SIZE, NONCE_SIZE, TAG_SIZE,
};

#[cfg(feature = "grpc-server")]
pub use grpc_server::{
    bind, serve, serve_with_listener, MessageServiceImpl, ServerError, ERROR_KIND_HEADER,
};
