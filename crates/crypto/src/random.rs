//! Randomness source for keys, nonces and identifiers.
//!
//! All CSPRNG use in the crate goes through [`RandomSource`]. Production code
//! uses [`OsRandomSource`]; tests swap in [`SeededRandomSource`] for
//! reproducible output.

use crate::error::{CryptoError, CryptoResult};
use crate::id::IdGenerator;
use crate::types::{Key, KEY_SIZE};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::sync::Mutex;

/// Capability set the cryptographic service draws randomness from.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely or fail. A short read is an error.
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), rand::Error>;

    /// Short, sortable, collision-resistant identifier.
    fn generate_id(&self) -> String;

    /// Fresh symmetric key. Only 32-byte keys are issued.
    fn generate_key(&self, length: i32) -> CryptoResult<Key> {
        if length != KEY_SIZE as i32 {
            tracing::error!(length, "Invalid key length requested");
            return Err(CryptoError::invalid_key_length(length.into()));
        }

        let mut bytes = [0u8; KEY_SIZE];
        self.try_fill(&mut bytes).map_err(|e| {
            tracing::error!(error = %e, "Failed to generate random key");
            CryptoError::InsufficientRandomness(e)
        })?;

        let key = Key::from_bytes(bytes);
        zeroize::Zeroize::zeroize(&mut bytes);
        Ok(key)
    }

    /// `n` uniformly random bytes for use as a GCM nonce.
    fn random_nonce(&self, n: usize) -> CryptoResult<Vec<u8>> {
        let mut nonce = vec![0u8; n];
        self.try_fill(&mut nonce).map_err(|e| {
            tracing::error!(error = %e, "Failed to generate nonce");
            CryptoError::InsufficientRandomness(e)
        })?;
        Ok(nonce)
    }
}

/// Operating-system CSPRNG.
#[derive(Debug, Default)]
pub struct OsRandomSource {
    ids: IdGenerator,
}

impl OsRandomSource {
    pub fn new() -> Self {
        Self {
            ids: IdGenerator::new(),
        }
    }
}

impl RandomSource for OsRandomSource {
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }

    fn generate_id(&self) -> String {
        let id = self.ids.next_id();
        tracing::trace!(%id, "Generated unique ID");
        id
    }
}

/// Deterministic source for tests. Not for production use.
#[derive(Debug)]
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
    ids: IdGenerator,
}

impl SeededRandomSource {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let machine_id = [rng.next_u32() as u8; 3];
        let counter_seed = rng.next_u32();
        Self {
            rng: Mutex::new(rng),
            ids: IdGenerator::with_parts(machine_id, 0, counter_seed),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.try_fill_bytes(dest)
    }

    fn generate_id(&self) -> String {
        self.ids.next_id()
    }
}
