//! Fingerprint-to-block index mixing.
//!
//! Each of the `no_of_hash_funcs` hash functions is a multiplicative
//! hash with its own pre-calculated odd-ish multiplier, followed by an
//! xor-shift avalanche that folds the multiply's high bits into the low
//! bits before the block modulus. The final multiply by the block size
//! aligns the result to the interleaved layout, so every returned value
//! is the bit position of a block origin.

use crate::core::geometry::{Geometry, HASH_SHIFT, SEED};

/// Derived per-hash-function multipliers plus the block arithmetic.
///
/// Rebuilt whenever the geometry changes (the multipliers depend only
/// on the k-mer size, the block arithmetic on the layout). The same
/// fingerprint always yields the same block base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashMixer {
    pre_calc: Box<[u64]>,
    no_of_blocks: u64,
    block_bit_size: u64,
}

impl HashMixer {
    /// Derive the multipliers for a layout.
    ///
    /// Multiplier `i` is `i XOR (kmer_size * SEED)`, matching the
    /// fingerprint polynomial's dependence on k so that filters with
    /// different k-mer sizes scatter differently.
    #[must_use]
    pub fn new(geometry: &Geometry) -> Self {
        let salt = (geometry.kmer_size() as u64).wrapping_mul(SEED);
        let pre_calc = (0..geometry.no_of_hash_funcs() as u64)
            .map(|i| i ^ salt)
            .collect();
        Self {
            pre_calc,
            no_of_blocks: geometry.no_of_blocks(),
            block_bit_size: geometry.block_bit_size(),
        }
    }

    /// Base bit position of the block tested by hash function `func`
    /// for `fingerprint`.
    ///
    /// The result is always a multiple of the block size and below the
    /// block region's end.
    #[must_use]
    #[inline]
    pub fn block_base(&self, fingerprint: u64, func: usize) -> u64 {
        let mut v = self.pre_calc[func].wrapping_mul(fingerprint);
        v ^= v >> HASH_SHIFT;
        v %= self.no_of_blocks;
        v * self.block_bit_size
    }

    /// Number of hash functions.
    #[must_use]
    #[inline]
    pub fn functions(&self) -> usize {
        self.pre_calc.len()
    }
}
