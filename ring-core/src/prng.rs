//! Keyed, seekable PRNG (C8): a counter-mode stream built from a keyed
//! BLAKE2b hash of `seed || counter`, so any clock position can be jumped
//! to directly rather than only advanced sequentially. Grounded on the
//! corpus's `hashing.rs` (SHAKE/SHA3 hash-as-PRF pattern), generalized to a
//! keyed, rewindable construction.

use blake2::digest::{FixedOutput, KeyInit, Update};
use blake2::Blake2b512;
use rand::{CryptoRng, RngCore};

use crate::error::{Result, RingError};

const BLOCK_BYTES: usize = 64;

/// A deterministic, seekable byte stream keyed by an optional 32-byte key
/// plus a seed. `next_block` is the index of the block that will be
/// produced on the next refill, and is what `clock()`/`set_clock` expose;
/// `set_clock` may only move it forward, rejecting a rewind with
/// [`RingError::PrngRewind`].
pub struct KeyedPrng {
    key: [u8; 32],
    seed: Vec<u8>,
    next_block: u64,
    buffer: [u8; BLOCK_BYTES],
    buffer_pos: usize,
}

impl KeyedPrng {
    /// Unkeyed mode: the key is the all-zero key, only `seed` distinguishes
    /// streams. Used when callers want reproducibility without a secret.
    pub fn new_unkeyed(seed: &[u8]) -> Self {
        Self::new_keyed([0u8; 32], seed)
    }

    pub fn new_keyed(key: [u8; 32], seed: &[u8]) -> Self {
        let mut prng = KeyedPrng {
            key,
            seed: seed.to_vec(),
            next_block: 0,
            buffer: [0u8; BLOCK_BYTES],
            buffer_pos: BLOCK_BYTES, // forces a block fetch on first read
        };
        prng.refill();
        prng
    }

    /// Seeds from system entropy (`rand::rngs::OsRng`) rather than a fixed
    /// value, for callers that want a fresh unpredictable stream.
    pub fn from_entropy() -> Result<Self> {
        let mut key = [0u8; 32];
        rand::rngs::OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| RingError::Prng(e.to_string()))?;
        Ok(Self::new_keyed(key, b""))
    }

    pub fn clock(&self) -> u64 {
        self.next_block
    }

    /// Jumps so the next byte produced comes from block `clock`. Only
    /// forward moves are permitted; going backward would let a caller
    /// replay already-consumed randomness.
    pub fn set_clock(&mut self, clock: u64) -> Result<()> {
        if clock < self.next_block {
            return Err(RingError::PrngRewind {
                current: self.next_block,
                requested: clock,
            });
        }
        self.next_block = clock;
        self.buffer_pos = BLOCK_BYTES;
        Ok(())
    }

    fn block_hash(&self, counter: u64) -> [u8; BLOCK_BYTES] {
        let mut hasher = <Blake2b512 as KeyInit>::new_from_slice(&self.key).expect("32-byte key is valid for Blake2b512");
        Update::update(&mut hasher, &self.seed);
        Update::update(&mut hasher, &counter.to_le_bytes());
        hasher.finalize_fixed().into()
    }

    fn refill(&mut self) {
        self.buffer = self.block_hash(self.next_block);
        self.next_block += 1;
        self.buffer_pos = 0;
    }
}

impl RngCore for KeyedPrng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut written = 0;
        while written < dest.len() {
            if self.buffer_pos == BLOCK_BYTES {
                self.refill();
            }
            let available = BLOCK_BYTES - self.buffer_pos;
            let take = available.min(dest.len() - written);
            dest[written..written + take].copy_from_slice(&self.buffer[self.buffer_pos..self.buffer_pos + take]);
            self.buffer_pos += take;
            written += take;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for KeyedPrng {}
