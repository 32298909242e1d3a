//! Short, sortable, collision-resistant identifiers.
//!
//! Layout (12 bytes, xid-compatible):
//!
//! | bytes | content                                  |
//! |-------|------------------------------------------|
//! | 0..4  | Unix seconds, big-endian                 |
//! | 4..7  | machine id (BLAKE3 of the host name)     |
//! | 7..9  | process id, big-endian                   |
//! | 9..12 | counter, big-endian, randomly seeded     |
//!
//! Rendered as 20 lowercase base32hex characters (`0-9a-v`).

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Raw identifier length in bytes.
pub const RAW_ID_LEN: usize = 12;

/// Encoded identifier length in characters.
pub const ENCODED_ID_LEN: usize = 20;

const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Generator of time-ordered identifiers. Safe to share across threads.
#[derive(Debug)]
pub struct IdGenerator {
    machine_id: [u8; 3],
    pid: u16,
    counter: AtomicU32,
}

impl IdGenerator {
    /// Create a generator for this host and process.
    pub fn new() -> Self {
        Self::with_parts(
            machine_id(),
            std::process::id() as u16,
            rand::random::<u32>(),
        )
    }

    /// Create a generator with explicit machine id, process id and counter seed.
    pub fn with_parts(machine_id: [u8; 3], pid: u16, counter_seed: u32) -> Self {
        Self {
            machine_id,
            pid,
            counter: AtomicU32::new(counter_seed),
        }
    }

    pub fn next_id(&self) -> String {
        encode(&self.next_raw(unix_seconds()))
    }

    pub(crate) fn next_raw(&self, timestamp: u32) -> [u8; RAW_ID_LEN] {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);

        let mut raw = [0u8; RAW_ID_LEN];
        raw[0..4].copy_from_slice(&timestamp.to_be_bytes());
        raw[4..7].copy_from_slice(&self.machine_id);
        raw[7..9].copy_from_slice(&self.pid.to_be_bytes());
        // counter is 24 bits and wraps
        raw[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        raw
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a raw identifier as base32hex, most significant bit first.
pub fn encode(raw: &[u8; RAW_ID_LEN]) -> String {
    let mut out = String::with_capacity(ENCODED_ID_LEN);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for &byte in raw {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

fn machine_id() -> [u8; 3] {
    let hostname = std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());

    match hostname {
        Some(name) => {
            let hash = blake3::hash(name.as_bytes());
            let mut id = [0u8; 3];
            id.copy_from_slice(&hash.as_bytes()[..3]);
            id
        }
        None => rand::random::<[u8; 3]>(),
    }
}

fn unix_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
