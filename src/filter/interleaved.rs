//! The interleaved Bloom filter directory.
//!
//! One `InterleavedBloomFilter` multiplexes an independent Bloom filter
//! per bin into a single shared bit vector. Bits for the same hash slot
//! sit adjacent, one per bin, so a query ANDs one aligned word per hash
//! function and learns the verdict for 64 bins at once. A k-mer occurs
//! in a bin iff every hash function's block has that bin's bit set;
//! false positives are possible, false negatives are not.
//!
//! # Concurrency
//!
//! - [`insert_kmer`](InterleavedBloomFilter::insert_kmer) takes `&self`
//!   and sets bits atomically. Threads building distinct bins run
//!   concurrently without coordination; overlapping bins merely contend
//!   on a cache line.
//! - [`count`](InterleavedBloomFilter::count) and
//!   [`select`](InterleavedBloomFilter::select) are read-only and may
//!   run concurrently with each other, but not with writers. Callers
//!   fence a build phase from a query phase, typically by joining the
//!   builder threads.
//! - [`clear`](InterleavedBloomFilter::clear) fans out over disjoint
//!   block stripes on scoped threads; a worker panic propagates on
//!   join.

use crate::core::bitvec::{BitVector, WORD_BITS};
use crate::core::geometry::Geometry;
use crate::error::{Error, Result};
use crate::filter::chunk::ChunkMap;
use crate::hash::kmer::{Dna, Fingerprints};
use crate::hash::mixer::HashMixer;

/// K-mer directory over many bins, backed by one interleaved bit
/// vector.
///
/// # Examples
///
/// ```
/// use binbloom::InterleavedBloomFilter;
///
/// let filter = InterleavedBloomFilter::new(10, 3, 20, (1 << 24) + 256).unwrap();
/// filter.insert_kmer(b"ACGTACGTACGTACGTACGTACGT", 4).unwrap();
///
/// let counts = filter.count(b"ACGTACGTACGTACGTACGTACGT");
/// assert_eq!(counts[4], 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InterleavedBloomFilter {
    geometry: Geometry,
    mixer: HashMixer,
    chunk_map: ChunkMap,
    bitvector: BitVector,
}

impl InterleavedBloomFilter {
    /// Create an empty filter.
    ///
    /// * `no_of_bins` - bins to multiplex, at least 1.
    /// * `no_of_hash_funcs` - hash functions per fingerprint, at
    ///   least 1 (2 to 4 is typical).
    /// * `kmer_size` - k, in `[2, 32]`.
    /// * `no_of_bits` - total bit-vector size including the 256-bit
    ///   metadata tail, preferably a power of two plus 256.
    pub fn new(
        no_of_bins: usize,
        no_of_hash_funcs: usize,
        kmer_size: usize,
        no_of_bits: u64,
    ) -> Result<Self> {
        Self::with_chunks(no_of_bins, no_of_hash_funcs, kmer_size, no_of_bits, 1)
    }

    /// Create an empty filter whose fingerprint space is partitioned
    /// into `chunks` shards for distributed construction.
    pub fn with_chunks(
        no_of_bins: usize,
        no_of_hash_funcs: usize,
        kmer_size: usize,
        no_of_bits: u64,
        chunks: u64,
    ) -> Result<Self> {
        let geometry = Geometry::new(no_of_bins, no_of_hash_funcs, kmer_size, no_of_bits)?;
        let mixer = HashMixer::new(&geometry);
        let chunk_map = ChunkMap::identity(chunks, geometry.no_of_blocks())?;
        let bitvector = BitVector::new(geometry.no_of_bits())?;
        log::debug!(
            "new interleaved filter: {} bins, {} hash functions, k = {}, \
             {} blocks of {} bits",
            no_of_bins,
            no_of_hash_funcs,
            kmer_size,
            geometry.no_of_blocks(),
            geometry.block_bit_size(),
        );
        Ok(Self {
            geometry,
            mixer,
            chunk_map,
            bitvector,
        })
    }

    /// Rebuild a filter from parts, used by the load and deserialize
    /// paths. The bit vector length must match the geometry.
    pub(crate) fn from_parts(geometry: Geometry, bitvector: BitVector) -> Result<Self> {
        if bitvector.len() != geometry.no_of_bits() {
            return Err(Error::precondition(format!(
                "bit vector of {} bits does not match a geometry of {} bits",
                bitvector.len(),
                geometry.no_of_bits()
            )));
        }
        let mixer = HashMixer::new(&geometry);
        let chunk_map = ChunkMap::identity(1, geometry.no_of_blocks())?;
        Ok(Self {
            geometry,
            mixer,
            chunk_map,
            bitvector,
        })
    }

    /// Insert every k-mer of `text` into `bin_no`.
    ///
    /// Safe to call concurrently with other inserts; all bit writes are
    /// atomic ORs. Texts shorter than the k-mer size insert nothing.
    ///
    /// # Errors
    ///
    /// [`Error::PreconditionViolated`] if the backing is compressed or
    /// `bin_no` is out of range. Validation happens before any write.
    pub fn insert_kmer(&self, text: &[u8], bin_no: usize) -> Result<()> {
        self.require_mutable("insert_kmer")?;
        self.require_bin(bin_no)?;
        self.insert_fingerprints(text, bin_no, None);
        Ok(())
    }

    /// Insert only the k-mers of `text` that route to `chunk_id`.
    ///
    /// This is the sharded-build entry point: each builder owns one
    /// active chunk and skips the rest of the fingerprint stream.
    pub fn insert_kmer_chunked(&self, text: &[u8], bin_no: usize, chunk_id: u8) -> Result<()> {
        self.require_mutable("insert_kmer_chunked")?;
        self.require_bin(bin_no)?;
        if u64::from(chunk_id) >= self.chunk_map.chunks() {
            return Err(Error::precondition(format!(
                "chunk {} out of range for {} chunks",
                chunk_id,
                self.chunk_map.chunks()
            )));
        }
        self.insert_fingerprints(text, bin_no, Some(chunk_id));
        Ok(())
    }

    fn insert_fingerprints(&self, text: &[u8], bin_no: usize, active_chunk: Option<u8>) {
        let k = self.geometry.kmer_size();
        for fingerprint in Fingerprints::<Dna>::new(text, k) {
            if let Some(active) = active_chunk {
                if self.chunk_map.chunk_of(fingerprint) != active {
                    continue;
                }
            }
            for func in 0..self.mixer.functions() {
                let base = self.mixer.block_base(fingerprint, func);
                self.bitvector.set_bit(base + bin_no as u64);
            }
        }
    }

    /// Count, for every bin, how many k-mers of `text` test positive.
    ///
    /// Counts saturate at `u16::MAX`; a `u16` holds the exact count for
    /// any short-read-sized text. A text shorter than the k-mer size
    /// yields all zeros. Chunk routing does not apply to queries: every
    /// fingerprint contributes.
    #[must_use]
    pub fn count(&self, text: &[u8]) -> Vec<u16> {
        let mut counts = vec![0u16; self.geometry.no_of_bins()];
        let funcs = self.mixer.functions();
        let bin_width = self.geometry.bin_width();
        let mut bases = vec![0u64; funcs];

        for fingerprint in Fingerprints::<Dna>::new(text, self.geometry.kmer_size()) {
            for (func, base) in bases.iter_mut().enumerate() {
                *base = self.mixer.block_base(fingerprint, func);
            }

            // Walk the block word by word. Each AND-ed word holds the
            // verdict for 64 adjacent bins under every hash function;
            // clearing the lowest set bit peels the hits off one by
            // one.
            for column in 0..bin_width {
                let mut acc = self.bitvector.get_word(bases[0], WORD_BITS as u32);
                for &base in &bases[1..] {
                    acc &= self.bitvector.get_word(base, WORD_BITS as u32);
                }

                let first_bin = column * WORD_BITS;
                while acc != 0 {
                    let bin = first_bin + u64::from(acc.trailing_zeros());
                    debug_assert!((bin as usize) < counts.len());
                    let slot = &mut counts[bin as usize];
                    *slot = slot.saturating_add(1);
                    acc &= acc - 1;
                }

                for base in &mut bases {
                    *base += WORD_BITS;
                }
            }
        }
        counts
    }

    /// Report the bins whose [`count`](InterleavedBloomFilter::count)
    /// for `text` reaches `threshold`.
    #[must_use]
    pub fn select(&self, text: &[u8], threshold: u16) -> Vec<bool> {
        self.count(text)
            .into_iter()
            .map(|count| count >= threshold)
            .collect()
    }

    /// Reset the listed bins to empty across every hash slot.
    ///
    /// The block range is split into `threads` contiguous stripes, each
    /// cleared by its own scoped thread. Stripes are disjoint, so the
    /// workers need no synchronization; a panicking worker propagates
    /// when the scope joins.
    ///
    /// # Errors
    ///
    /// [`Error::PreconditionViolated`] if the backing is compressed or
    /// any bin index is out of range. Validation happens before any
    /// write.
    pub fn clear(&self, bins: &[usize], threads: usize) -> Result<()> {
        self.require_mutable("clear")?;
        for &bin in bins {
            self.require_bin(bin)?;
        }
        if bins.is_empty() {
            return Ok(());
        }

        let blocks = self.geometry.no_of_blocks();
        let block_bit_size = self.geometry.block_bit_size();
        let threads = threads.clamp(1, blocks as usize);
        let stripe = blocks.div_ceil(threads as u64);
        log::debug!(
            "clearing {} bins over {} blocks on {} threads",
            bins.len(),
            blocks,
            threads
        );

        std::thread::scope(|scope| {
            for task in 0..threads as u64 {
                let lo = task * stripe;
                if lo >= blocks {
                    break;
                }
                let hi = (lo + stripe).min(blocks);
                let bitvector = &self.bitvector;
                scope.spawn(move || {
                    for block in lo..hi {
                        let base = block * block_bit_size;
                        for &bin in bins {
                            bitvector.unset_bit(base + bin as u64);
                        }
                    }
                });
            }
        });
        Ok(())
    }

    /// Grow the directory to `new_bins` bins, keeping every stored
    /// k-mer.
    ///
    /// Every block widens to the new bin width and its existing word
    /// columns move as a unit, so bit `b * old_block + i` lands at
    /// `b * new_block + i` and no fingerprint ever needs rehashing.
    /// The bit vector grows proportionally to the width increase.
    ///
    /// # Errors
    ///
    /// [`Error::PreconditionViolated`] on a compressed backing or when
    /// `new_bins` is smaller than the current bin count.
    pub fn resize_bins(&mut self, new_bins: usize) -> Result<()> {
        self.require_mutable("resize_bins")?;
        let grown = self.geometry.resized(new_bins)?;

        if grown.bin_width() == self.geometry.bin_width() {
            // Same word layout, only the addressable bin range widens.
            self.geometry = grown;
            return Ok(());
        }

        log::debug!(
            "resizing from {} to {} bins: block width {} -> {} bits",
            self.geometry.no_of_bins(),
            new_bins,
            self.geometry.block_bit_size(),
            grown.block_bit_size(),
        );
        let bitvector = self.bitvector.remap_blocks(
            self.geometry.no_of_blocks(),
            self.geometry.block_bit_size(),
            grown.block_bit_size(),
            grown.no_of_bits(),
        )?;
        // The block count is unchanged, so the chunk routing and the
        // per-chunk block offset both stay valid.
        self.mixer = HashMixer::new(&grown);
        self.geometry = grown;
        self.bitvector = bitvector;
        Ok(())
    }

    /// Freeze the filter into a query-only form.
    ///
    /// The compressed backing rejects `insert_kmer`, `clear` and
    /// `resize_bins` with [`Error::PreconditionViolated`] while queries
    /// keep working unchanged.
    #[must_use]
    pub fn freeze(self) -> Self {
        let Self {
            geometry,
            mixer,
            chunk_map,
            bitvector,
        } = self;
        Self {
            geometry,
            mixer,
            chunk_map,
            bitvector: bitvector.freeze(),
        }
    }

    /// Install a chunk routing table; see [`ChunkMap::set_routing`].
    pub fn set_chunk_routing(
        &mut self,
        map: Vec<u8>,
        significant_positions: u32,
        significant_bits: u32,
    ) -> Result<()> {
        self.chunk_map
            .set_routing(map, significant_positions, significant_bits)
    }

    /// The active chunk routing.
    #[must_use]
    pub fn chunk_map(&self) -> &ChunkMap {
        &self.chunk_map
    }

    /// Number of bins.
    #[must_use]
    pub fn no_of_bins(&self) -> usize {
        self.geometry.no_of_bins()
    }

    /// Number of hash functions.
    #[must_use]
    pub fn no_of_hash_funcs(&self) -> usize {
        self.geometry.no_of_hash_funcs()
    }

    /// The k-mer size.
    #[must_use]
    pub fn kmer_size(&self) -> usize {
        self.geometry.kmer_size()
    }

    /// Total bit-vector size in bits, metadata tail included.
    #[must_use]
    pub fn no_of_bits(&self) -> u64 {
        self.geometry.no_of_bits()
    }

    /// Number of hash slots.
    #[must_use]
    pub fn no_of_blocks(&self) -> u64 {
        self.geometry.no_of_blocks()
    }

    /// Bits per hash slot.
    #[must_use]
    pub fn block_bit_size(&self) -> u64 {
        self.geometry.block_bit_size()
    }

    /// Whether the backing accepts writes.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.bitvector.is_mutable()
    }

    /// Number of set bits, an occupancy measure.
    #[must_use]
    pub fn count_ones(&self) -> u64 {
        self.bitvector.count_ones()
    }

    pub(crate) fn bitvector(&self) -> &BitVector {
        &self.bitvector
    }

    fn require_mutable(&self, operation: &str) -> Result<()> {
        if self.bitvector.is_mutable() {
            Ok(())
        } else {
            Err(Error::precondition(format!(
                "{} requires an uncompressed backing",
                operation
            )))
        }
    }

    fn require_bin(&self, bin_no: usize) -> Result<()> {
        if bin_no < self.geometry.no_of_bins() {
            Ok(())
        } else {
            Err(Error::precondition(format!(
                "bin {} out of range for {} bins",
                bin_no,
                self.geometry.no_of_bins()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> InterleavedBloomFilter {
        InterleavedBloomFilter::new(3, 2, 4, 1024).unwrap()
    }

    #[test]
    fn insert_then_count_hits_only_the_target_bin() {
        let filter = small();
        filter.insert_kmer(b"ACGTACGT", 1).unwrap();
        assert_eq!(filter.count(b"ACGT"), vec![0, 1, 0]);
        assert_eq!(filter.count(b"ACGTACGT"), vec![0, 5, 0]);
    }

    #[test]
    fn untouched_bins_stay_at_zero() {
        // Bits of a bin are written only by inserts into that bin, so a
        // never-inserted bin cannot even false-positive.
        let filter = small();
        filter.insert_kmer(b"ACGTACGTACGT", 2).unwrap();
        let counts = filter.count(b"TTTTGGGGCCCCAAAA");
        assert_eq!(counts[0], 0);
        assert_eq!(counts[1], 0);
    }

    #[test]
    fn short_text_counts_to_zero() {
        let filter = InterleavedBloomFilter::new(3, 2, 10, 1024).unwrap();
        assert_eq!(filter.count(b"ACGT"), vec![0, 0, 0]);
    }

    #[test]
    fn select_applies_the_threshold() {
        let filter = small();
        filter.insert_kmer(b"AAAA", 0).unwrap();
        filter.insert_kmer(b"CCCC", 2).unwrap();
        assert_eq!(filter.select(b"AAAACCCC", 1), vec![true, false, true]);
        assert_eq!(filter.select(b"AAAA", 2), vec![false, false, false]);
    }

    #[test]
    fn bins_past_word_boundary_are_addressable() {
        let filter = InterleavedBloomFilter::new(130, 2, 4, (1 << 16) + 256).unwrap();
        filter.insert_kmer(b"ACGTAC", 129).unwrap();
        let counts = filter.count(b"ACGTAC");
        assert_eq!(counts[129], 3);
        assert_eq!(counts[0], 0);
    }

    #[test]
    fn clear_empties_only_the_requested_bins() {
        let filter = small();
        filter.insert_kmer(b"AAAA", 0).unwrap();
        filter.insert_kmer(b"CCCC", 2).unwrap();
        filter.clear(&[0], 2).unwrap();
        assert_eq!(filter.count(b"AAAA"), vec![0, 0, 0]);
        assert_eq!(filter.count(b"CCCC"), vec![0, 0, 1]);
    }

    #[test]
    fn clear_with_more_threads_than_blocks() {
        let filter = small();
        filter.insert_kmer(b"ACGTACGT", 1).unwrap();
        filter.clear(&[1], 1024).unwrap();
        assert_eq!(filter.count(b"ACGTACGT"), vec![0, 0, 0]);
    }

    #[test]
    fn resize_preserves_counts_for_existing_bins() {
        let mut filter = small();
        filter.insert_kmer(b"AAAA", 0).unwrap();
        filter.insert_kmer(b"CCCC", 2).unwrap();
        filter.resize_bins(67).unwrap();

        assert_eq!(filter.no_of_bins(), 67);
        assert_eq!(filter.block_bit_size(), 128);
        let counts = filter.count(b"AAAA");
        assert_eq!(counts.len(), 67);
        assert_eq!(counts[0], 1);
        assert!(counts[1..].iter().all(|&c| c == 0));

        let counts = filter.count(b"CCCC");
        assert_eq!(counts[2], 1);
    }

    #[test]
    fn resize_within_the_same_word_width_is_cheap() {
        let mut filter = small();
        filter.insert_kmer(b"ACGTACGT", 1).unwrap();
        let words_before = filter.bitvector().to_raw_words();
        filter.resize_bins(40).unwrap();
        assert_eq!(filter.no_of_bins(), 40);
        assert_eq!(filter.bitvector().to_raw_words(), words_before);
        assert_eq!(filter.count(b"ACGT")[1], 1);
    }

    #[test]
    fn frozen_filter_rejects_writes_but_answers_queries() {
        let filter = small();
        filter.insert_kmer(b"ACGTACGT", 1).unwrap();
        let mut frozen = filter.freeze();

        assert!(!frozen.is_mutable());
        assert_eq!(frozen.count(b"ACGT"), vec![0, 1, 0]);
        assert!(matches!(
            frozen.insert_kmer(b"ACGT", 0),
            Err(Error::PreconditionViolated { .. })
        ));
        assert!(matches!(
            frozen.clear(&[1], 1),
            Err(Error::PreconditionViolated { .. })
        ));
        assert!(matches!(
            frozen.resize_bins(10),
            Err(Error::PreconditionViolated { .. })
        ));
    }

    #[test]
    fn out_of_range_bin_is_rejected_before_any_write() {
        let filter = small();
        assert!(filter.insert_kmer(b"ACGT", 3).is_err());
        assert!(filter.clear(&[0, 3], 1).is_err());
        assert_eq!(filter.count_ones(), 0);
    }

    #[test]
    fn chunked_inserts_union_to_the_full_stream() {
        let text = b"ACGTACGTTTGCAGCATGACG";
        let mut sharded = InterleavedBloomFilter::with_chunks(3, 2, 4, 1024, 2).unwrap();
        sharded.set_chunk_routing(vec![0, 1], 0, 1).unwrap();
        sharded.insert_kmer_chunked(text, 1, 0).unwrap();
        sharded.insert_kmer_chunked(text, 1, 1).unwrap();

        let plain = small();
        plain.insert_kmer(text, 1).unwrap();
        assert_eq!(sharded.count(text), plain.count(text));
    }

    #[test]
    fn chunked_insert_skips_foreign_fingerprints() {
        let text = b"ACGTACGTTTGCAGCATGACG";
        let mut sharded = InterleavedBloomFilter::with_chunks(3, 2, 4, 1024, 2).unwrap();
        sharded.set_chunk_routing(vec![0, 1], 0, 1).unwrap();
        sharded.insert_kmer_chunked(text, 1, 0).unwrap();

        let plain = small();
        plain.insert_kmer(text, 1).unwrap();
        assert!(sharded.count_ones() < plain.count_ones());
    }

    #[test]
    fn clones_are_independent() {
        let filter = small();
        filter.insert_kmer(b"ACGTACGT", 1).unwrap();
        let copy = filter.clone();
        assert_eq!(copy, filter);

        filter.insert_kmer(b"TTTT", 0).unwrap();
        assert_ne!(copy, filter);
        assert_eq!(copy.count(b"TTTT"), vec![0, 0, 0]);
    }
}
