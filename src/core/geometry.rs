//! Filter geometry: the derived layout of the interleaved bit vector.
//!
//! Instead of concatenating one Bloom filter per bin, the directory
//! interleaves them. The bit vector is a sequence of blocks, one block
//! per hash slot, and position `i` inside a block belongs to bin `i`.
//! Blocks are padded to a multiple of the 64-bit machine word so that a
//! single aligned read tests one hash slot for 64 bins at once, and so
//! that growing the bin count widens every block in place without
//! invalidating a single hash value.
//!
//! `Geometry` owns the primary parameters and everything derived from
//! them. Derivation is a pure function of the primary fields, which is
//! what allows [`Geometry::resized`] to recompute a grown layout while
//! cloning stays a plain field copy.

use crate::error::{Error, Result};

/// Multiplier seed feeding the per-hash-function constants.
pub(crate) const SEED: u64 = 0x90b4_5d39_fb6d_a1fa;

/// Right-shift distance of the avalanche step in the index mixer.
pub(crate) const HASH_SHIFT: u32 = 27;

/// Size in bits of the metadata block at the tail of the bit vector.
pub(crate) const FILTER_METADATA_BITS: u64 = 256;

/// Smallest supported k-mer size.
pub const MIN_KMER_SIZE: usize = 2;

/// Largest supported k-mer size. A 32-mer over a 4-symbol alphabet
/// exactly fills one 64-bit fingerprint.
pub const MAX_KMER_SIZE: usize = 32;

/// Primary parameters and derived layout of an interleaved filter.
///
/// The derived fields are invariant after construction:
///
/// - `bin_width`: words needed per block, `ceil(no_of_bins / 64)`
/// - `block_bit_size`: bits per block, `bin_width * 64`
/// - `no_of_blocks`: distinct hash slots fitting in front of the
///   256-bit metadata tail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    no_of_bins: usize,
    no_of_hash_funcs: usize,
    kmer_size: usize,
    no_of_bits: u64,
    bin_width: u64,
    block_bit_size: u64,
    no_of_blocks: u64,
}

impl Geometry {
    /// Validate primary parameters and derive the block layout.
    ///
    /// `no_of_bits` is the total bit-vector size including the 256-bit
    /// metadata tail, preferably a power of two plus 256. It must be a
    /// multiple of 8 and large enough for at least one block beyond the
    /// tail.
    pub fn new(
        no_of_bins: usize,
        no_of_hash_funcs: usize,
        kmer_size: usize,
        no_of_bits: u64,
    ) -> Result<Self> {
        if no_of_bins == 0 {
            return Err(Error::precondition("no_of_bins must be at least 1"));
        }
        if no_of_hash_funcs == 0 {
            return Err(Error::precondition("no_of_hash_funcs must be at least 1"));
        }
        if kmer_size < MIN_KMER_SIZE || kmer_size > MAX_KMER_SIZE {
            return Err(Error::precondition(format!(
                "kmer_size {} outside the supported range [{}, {}]",
                kmer_size, MIN_KMER_SIZE, MAX_KMER_SIZE
            )));
        }
        if no_of_bits % 8 != 0 {
            return Err(Error::precondition(format!(
                "no_of_bits {} is not a multiple of 8",
                no_of_bits
            )));
        }

        let bin_width = (no_of_bins as u64).div_ceil(64);
        let block_bit_size = bin_width * 64;
        if no_of_bits < FILTER_METADATA_BITS + block_bit_size {
            return Err(Error::precondition(format!(
                "no_of_bits {} leaves no room for a {}-bit block and the \
                 {}-bit metadata tail",
                no_of_bits, block_bit_size, FILTER_METADATA_BITS
            )));
        }
        let no_of_blocks = (no_of_bits - FILTER_METADATA_BITS) / block_bit_size;

        Ok(Self {
            no_of_bins,
            no_of_hash_funcs,
            kmer_size,
            no_of_bits,
            bin_width,
            block_bit_size,
            no_of_blocks,
        })
    }

    /// Derive the geometry of this layout grown to `new_bins` bins.
    ///
    /// The block count stays fixed and every block widens to the new
    /// bin width, so existing hash values keep addressing the same
    /// blocks. Shrinking is refused.
    pub fn resized(&self, new_bins: usize) -> Result<Self> {
        if new_bins < self.no_of_bins {
            return Err(Error::precondition(format!(
                "cannot shrink from {} to {} bins; rebuild the filter instead",
                self.no_of_bins, new_bins
            )));
        }
        let bin_width = (new_bins as u64).div_ceil(64);
        let block_bit_size = bin_width * 64;
        // An unchanged bin width keeps the existing vector, slack bits
        // and all; only a widening reallocates to the exact new size.
        let no_of_bits = if bin_width == self.bin_width {
            self.no_of_bits
        } else {
            self.no_of_blocks * block_bit_size + FILTER_METADATA_BITS
        };
        Ok(Self {
            no_of_bins: new_bins,
            no_of_hash_funcs: self.no_of_hash_funcs,
            kmer_size: self.kmer_size,
            no_of_bits,
            bin_width,
            block_bit_size,
            no_of_blocks: self.no_of_blocks,
        })
    }

    /// Number of bins multiplexed into the vector.
    #[must_use]
    #[inline]
    pub const fn no_of_bins(&self) -> usize {
        self.no_of_bins
    }

    /// Number of hash functions tested per fingerprint.
    #[must_use]
    #[inline]
    pub const fn no_of_hash_funcs(&self) -> usize {
        self.no_of_hash_funcs
    }

    /// The k in k-mer.
    #[must_use]
    #[inline]
    pub const fn kmer_size(&self) -> usize {
        self.kmer_size
    }

    /// Total bit-vector size, metadata tail included.
    #[must_use]
    #[inline]
    pub const fn no_of_bits(&self) -> u64 {
        self.no_of_bits
    }

    /// Words per block.
    #[must_use]
    #[inline]
    pub const fn bin_width(&self) -> u64 {
        self.bin_width
    }

    /// Bits per block.
    #[must_use]
    #[inline]
    pub const fn block_bit_size(&self) -> u64 {
        self.block_bit_size
    }

    /// Number of distinct hash slots.
    #[must_use]
    #[inline]
    pub const fn no_of_blocks(&self) -> u64 {
        self.no_of_blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_block_layout() {
        let g = Geometry::new(3, 2, 4, 1024).unwrap();
        assert_eq!(g.bin_width(), 1);
        assert_eq!(g.block_bit_size(), 64);
        assert_eq!(g.no_of_blocks(), (1024 - 256) / 64);
    }

    #[test]
    fn pads_bins_to_word_multiples() {
        let g = Geometry::new(65, 3, 20, 1 << 20).unwrap();
        assert_eq!(g.bin_width(), 2);
        assert_eq!(g.block_bit_size(), 128);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(Geometry::new(0, 2, 4, 1024).is_err());
        assert!(Geometry::new(3, 0, 4, 1024).is_err());
        assert!(Geometry::new(3, 2, 1, 1024).is_err());
        assert!(Geometry::new(3, 2, 33, 1024).is_err());
        assert!(Geometry::new(3, 2, 4, 1025).is_err());
        // 256 bits of tail leave no room for a block.
        assert!(Geometry::new(3, 2, 4, 256).is_err());
    }

    #[test]
    fn resize_keeps_block_count_and_widens_blocks() {
        let g = Geometry::new(40, 2, 4, 1024).unwrap();
        let grown = g.resized(73).unwrap();
        assert_eq!(grown.no_of_blocks(), g.no_of_blocks());
        assert_eq!(grown.bin_width(), 2);
        assert_eq!(grown.block_bit_size(), 128);
        assert_eq!(
            grown.no_of_bits(),
            g.no_of_blocks() * 128 + FILTER_METADATA_BITS
        );
    }

    #[test]
    fn resize_refuses_to_shrink() {
        let g = Geometry::new(40, 2, 4, 1024).unwrap();
        assert!(g.resized(39).is_err());
        // Same size is a no-op grow.
        assert!(g.resized(40).is_ok());
    }
}
