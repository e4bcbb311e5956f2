//! Serde serialization for filters.
//!
//! The filter serializes through an intermediate snapshot struct so
//! that deserialization re-validates the declared geometry before a
//! bit vector is rebuilt around it. The snapshot carries the same four
//! parameters as the on-disk metadata tail plus the raw words; chunk
//! routing is builder-session state and is not persisted.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::bitvec::BitVector;
use crate::core::geometry::Geometry;
use crate::filter::interleaved::InterleavedBloomFilter;

const FORMAT_VERSION: u16 = 1;

#[derive(Serialize, Deserialize)]
struct FilterSnapshot {
    version: u16,
    no_of_bins: u64,
    no_of_hash_funcs: u64,
    kmer_size: u64,
    no_of_bits: u64,
    words: Vec<u64>,
}

impl Serialize for InterleavedBloomFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        FilterSnapshot {
            version: FORMAT_VERSION,
            no_of_bins: self.no_of_bins() as u64,
            no_of_hash_funcs: self.no_of_hash_funcs() as u64,
            kmer_size: self.kmer_size() as u64,
            no_of_bits: self.no_of_bits(),
            words: self.bitvector().to_raw_words(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InterleavedBloomFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let snapshot = FilterSnapshot::deserialize(deserializer)?;
        if snapshot.version != FORMAT_VERSION {
            return Err(D::Error::custom(format!(
                "unsupported filter snapshot version {}",
                snapshot.version
            )));
        }

        let no_of_bins = usize::try_from(snapshot.no_of_bins)
            .map_err(|_| D::Error::custom("bin count overflows usize"))?;
        let no_of_hash_funcs = usize::try_from(snapshot.no_of_hash_funcs)
            .map_err(|_| D::Error::custom("hash count overflows usize"))?;
        let kmer_size = usize::try_from(snapshot.kmer_size)
            .map_err(|_| D::Error::custom("k-mer size overflows usize"))?;

        let geometry = Geometry::new(no_of_bins, no_of_hash_funcs, kmer_size, snapshot.no_of_bits)
            .map_err(D::Error::custom)?;
        let bitvector = BitVector::from_raw_words(snapshot.words, snapshot.no_of_bits)
            .map_err(D::Error::custom)?;
        InterleavedBloomFilter::from_parts(geometry, bitvector).map_err(D::Error::custom)
    }
}
