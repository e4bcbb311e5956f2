//! Builder for interleaved Bloom filters.
//!
//! The constructor takes four numeric parameters whose order is easy
//! to scramble at a call site; the builder names each one and validates
//! the combination at `build()`.
//!
//! # Examples
//!
//! ```
//! use binbloom::builder::InterleavedBloomFilterBuilder;
//!
//! let filter = InterleavedBloomFilterBuilder::new()
//!     .bins(64)
//!     .hash_functions(3)
//!     .kmer_size(20)
//!     .bit_size((1 << 26) + 256)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(filter.no_of_bins(), 64);
//! ```

use crate::error::{Error, Result};
use crate::filter::interleaved::InterleavedBloomFilter;

/// Default number of hash functions when none is given.
const DEFAULT_HASH_FUNCTIONS: usize = 2;

/// Named-parameter construction of an [`InterleavedBloomFilter`].
///
/// `bins`, `kmer_size` and `bit_size` are required; `hash_functions`
/// defaults to 2 and `chunks` to 1.
#[derive(Debug, Clone, Default)]
pub struct InterleavedBloomFilterBuilder {
    bins: Option<usize>,
    hash_functions: Option<usize>,
    kmer_size: Option<usize>,
    bit_size: Option<u64>,
    chunks: Option<u64>,
}

impl InterleavedBloomFilterBuilder {
    /// Start an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bins to multiplex.
    #[must_use]
    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }

    /// Number of hash functions per fingerprint.
    #[must_use]
    pub fn hash_functions(mut self, hash_functions: usize) -> Self {
        self.hash_functions = Some(hash_functions);
        self
    }

    /// The k in k-mer.
    #[must_use]
    pub fn kmer_size(mut self, kmer_size: usize) -> Self {
        self.kmer_size = Some(kmer_size);
        self
    }

    /// Total bit-vector size including the 256-bit metadata tail.
    #[must_use]
    pub fn bit_size(mut self, bit_size: u64) -> Self {
        self.bit_size = Some(bit_size);
        self
    }

    /// Shard count for distributed construction.
    #[must_use]
    pub fn chunks(mut self, chunks: u64) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// Validate the collected parameters and build the filter.
    ///
    /// # Errors
    ///
    /// [`Error::PreconditionViolated`] when a required parameter is
    /// missing or the combination is rejected by the geometry.
    pub fn build(self) -> Result<InterleavedBloomFilter> {
        let bins = self
            .bins
            .ok_or_else(|| Error::precondition("builder is missing bins()"))?;
        let kmer_size = self
            .kmer_size
            .ok_or_else(|| Error::precondition("builder is missing kmer_size()"))?;
        let bit_size = self
            .bit_size
            .ok_or_else(|| Error::precondition("builder is missing bit_size()"))?;
        let hash_functions = self.hash_functions.unwrap_or(DEFAULT_HASH_FUNCTIONS);
        let chunks = self.chunks.unwrap_or(1);

        InterleavedBloomFilter::with_chunks(bins, hash_functions, kmer_size, bit_size, chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        let filter = InterleavedBloomFilterBuilder::new()
            .bins(3)
            .kmer_size(4)
            .bit_size(1024)
            .build()
            .unwrap();
        assert_eq!(filter.no_of_hash_funcs(), DEFAULT_HASH_FUNCTIONS);
        assert_eq!(filter.chunk_map().chunks(), 1);
    }

    #[test]
    fn missing_required_parameters_are_named() {
        let err = InterleavedBloomFilterBuilder::new()
            .kmer_size(4)
            .bit_size(1024)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("bins()"));
    }

    #[test]
    fn invalid_combinations_propagate_geometry_errors() {
        let result = InterleavedBloomFilterBuilder::new()
            .bins(3)
            .kmer_size(64)
            .bit_size(1024)
            .build();
        assert!(result.is_err());
    }
}
