//! Sharding of the fingerprint space for distributed builds.
//!
//! When an index is too large to build in one process, the fingerprint
//! space is partitioned into `chunks` shards. Each builder is handed
//! one active chunk id and inserts only the fingerprints routed to it;
//! the finished chunk bit-vectors are concatenated in physical-chunk
//! order by an external merger. Queries ignore routing entirely and
//! consume every fingerprint.

use crate::error::{Error, Result};

/// Routing table from fingerprints to physical chunk ids.
///
/// A fingerprint is classified by extracting `significant_bits` bits
/// whose lowest bit index is `significant_positions`, little-endian
/// from the fingerprint's low-order end, and passing the extracted
/// value through the logical-to-physical map.
///
/// The default configuration is a single chunk with an identity map, in
/// which every fingerprint routes to chunk 0 and nothing is ever
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMap {
    chunks: u64,
    map: Vec<u8>,
    significant_positions: u32,
    significant_bits: u32,
    effective_chunks: u64,
    chunk_offset: u64,
}

impl ChunkMap {
    /// Build the default routing for `chunks` shards over a layout with
    /// `no_of_blocks` hash slots.
    ///
    /// `chunks` must be a power of two of at least 1. Until
    /// [`set_routing`](ChunkMap::set_routing) is called, every
    /// fingerprint maps to physical chunk 0.
    pub fn identity(chunks: u64, no_of_blocks: u64) -> Result<Self> {
        if chunks == 0 || !chunks.is_power_of_two() {
            return Err(Error::precondition(format!(
                "chunk count {} is not a power of two of at least 1",
                chunks
            )));
        }
        Ok(Self {
            chunks,
            map: vec![0],
            significant_positions: 0,
            significant_bits: 0,
            effective_chunks: 1,
            chunk_offset: no_of_blocks / chunks,
        })
    }

    /// Install a routing table.
    ///
    /// `map` maps each extracted value (there are
    /// `2^significant_bits` of them) to a physical chunk id below the
    /// chunk count. The effective chunk count becomes the number of
    /// distinct physical ids in use.
    pub fn set_routing(
        &mut self,
        map: Vec<u8>,
        significant_positions: u32,
        significant_bits: u32,
    ) -> Result<()> {
        if significant_bits >= 32 {
            return Err(Error::precondition(format!(
                "significant_bits {} is unreasonably large",
                significant_bits
            )));
        }
        let expected = 1usize << significant_bits;
        if map.len() != expected {
            return Err(Error::precondition(format!(
                "chunk map holds {} entries but {} significant bits require {}",
                map.len(),
                significant_bits,
                expected
            )));
        }
        if significant_positions + significant_bits > 64 {
            return Err(Error::precondition(format!(
                "extracting {} bits at position {} runs past the fingerprint",
                significant_bits, significant_positions
            )));
        }
        if let Some(&bad) = map.iter().find(|&&physical| u64::from(physical) >= self.chunks) {
            return Err(Error::precondition(format!(
                "chunk map routes to physical chunk {} but only {} chunks exist",
                bad, self.chunks
            )));
        }

        let mut distinct: Vec<u8> = map.clone();
        distinct.sort_unstable();
        distinct.dedup();
        self.effective_chunks = distinct.len() as u64;
        self.map = map;
        self.significant_positions = significant_positions;
        self.significant_bits = significant_bits;
        Ok(())
    }

    /// Physical chunk id a fingerprint routes to.
    #[must_use]
    #[inline]
    pub fn chunk_of(&self, fingerprint: u64) -> u8 {
        if self.significant_bits == 0 {
            return self.map[0];
        }
        let mask = (1u64 << self.significant_bits) - 1;
        let extracted = (fingerprint >> self.significant_positions) & mask;
        self.map[extracted as usize]
    }

    /// Configured shard count.
    #[must_use]
    #[inline]
    pub const fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Number of distinct physical chunks the map routes to.
    #[must_use]
    #[inline]
    pub const fn effective_chunks(&self) -> u64 {
        self.effective_chunks
    }

    /// Hash slots owned by each chunk in a sharded build.
    #[must_use]
    #[inline]
    pub const fn chunk_offset(&self) -> u64 {
        self.chunk_offset
    }
}
