//! The interleaved Bloom filter and its collaborators.

pub mod chunk;
pub mod interleaved;
mod persist;

#[cfg(feature = "serde")]
mod serde_support;

pub use chunk::ChunkMap;
pub use interleaved::InterleavedBloomFilter;
