//! binbloom: an interleaved Bloom filter for k-mer binning.
//!
//! An interleaved Bloom filter (IBF) answers approximate k-mer
//! membership queries across many sequence bins in parallel. Each bin
//! owns an independent Bloom filter, but instead of concatenating them
//! the bins are interleaved: the bit vector is a sequence of blocks,
//! one per hash slot, holding one bit per bin. Testing a hash slot for
//! 64 bins is then a single aligned word read, and growing the bin
//! count widens every block in place without rehashing anything.
//!
//! The filter reports, per bin, how many k-mers of a text are
//! approximately present, or which bins meet a count threshold. False
//! positives are possible by design; false negatives are not.
//!
//! # Quick start
//!
//! ```
//! use binbloom::InterleavedBloomFilter;
//!
//! // 3 bins, 2 hash functions, 4-mers, 1024-bit vector.
//! let filter = InterleavedBloomFilter::new(3, 2, 4, 1024).unwrap();
//!
//! filter.insert_kmer(b"ACGTACGT", 1).unwrap();
//!
//! assert_eq!(filter.count(b"ACGT"), vec![0, 1, 0]);
//! assert_eq!(filter.select(b"ACGTACGT", 3), vec![false, true, false]);
//! ```
//!
//! # Concurrent construction
//!
//! Insertion takes `&self` and sets bits with atomic OR, so builder
//! threads need no locks:
//!
//! ```
//! use binbloom::InterleavedBloomFilter;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let filter = Arc::new(InterleavedBloomFilter::new(4, 2, 4, 1024).unwrap());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|bin| {
//!         let filter = Arc::clone(&filter);
//!         thread::spawn(move || filter.insert_kmer(b"ACGTACGTAC", bin).unwrap())
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! // The joins fence the build phase from the query phase.
//! assert!(filter.select(b"ACGTACGTAC", 1).iter().all(|&hit| hit));
//! ```
//!
//! # Persistence
//!
//! [`InterleavedBloomFilter::save_to_file`] writes the raw bit vector
//! with a 256-bit metadata tail;
//! [`InterleavedBloomFilter::load_from_file`] restores it and
//! re-validates the declared geometry. The optional `serde` feature
//! additionally makes the filter serializable with any serde format.
//!
//! # Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | (default) | the full filter API |
//! | `serde` | `Serialize`/`Deserialize` for the filter |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod core;
pub mod error;
pub mod filter;
pub mod hash;

pub use error::{Error, Result};
pub use filter::chunk::ChunkMap;
pub use filter::interleaved::InterleavedBloomFilter;
pub use hash::kmer::{Alphabet, Dna, Fingerprints};

/// Prelude for convenient imports.
///
/// ```
/// use binbloom::prelude::*;
///
/// let filter = InterleavedBloomFilter::new(3, 2, 4, 1024).unwrap();
/// assert_eq!(filter.no_of_bins(), 3);
/// ```
pub mod prelude {
    pub use crate::builder::InterleavedBloomFilterBuilder;
    pub use crate::error::{Error, Result};
    pub use crate::filter::chunk::ChunkMap;
    pub use crate::filter::interleaved::InterleavedBloomFilter;
    pub use crate::hash::kmer::{Alphabet, Dna, Fingerprints};
}
