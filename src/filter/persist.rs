//! On-disk layout of a filter.
//!
//! A saved filter is the raw bit vector, words packed little-endian,
//! `no_of_bits / 8` bytes long. The final 256 bits are the metadata
//! block: four little-endian `u64` values holding `no_of_bins`,
//! `no_of_hash_funcs`, `kmer_size` and `no_of_bits`. Blocks never reach
//! into the tail, so in memory those bits are always zero; loading
//! zeroes them again after decoding, which keeps a save/load round trip
//! bit-identical.

use std::fs;
use std::path::Path;

use crate::core::bitvec::BitVector;
use crate::core::geometry::{Geometry, FILTER_METADATA_BITS};
use crate::error::{Error, Result};
use crate::filter::interleaved::InterleavedBloomFilter;

const METADATA_BYTES: usize = (FILTER_METADATA_BITS / 8) as usize;

fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

impl InterleavedBloomFilter {
    /// Write the filter to `path` in the raw interleaved layout.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] with the offending path on any filesystem failure.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let byte_len = (self.no_of_bits() / 8) as usize;
        let mut bytes = vec![0u8; byte_len];

        for (i, word) in self.bitvector().to_raw_words().into_iter().enumerate() {
            let start = i * 8;
            let end = (start + 8).min(byte_len);
            bytes[start..end].copy_from_slice(&word.to_le_bytes()[..end - start]);
        }

        let tail = byte_len - METADATA_BYTES;
        for (slot, value) in [
            self.no_of_bins() as u64,
            self.no_of_hash_funcs() as u64,
            self.kmer_size() as u64,
            self.no_of_bits(),
        ]
        .into_iter()
        .enumerate()
        {
            let at = tail + slot * 8;
            bytes[at..at + 8].copy_from_slice(&value.to_le_bytes());
        }

        fs::write(path, &bytes).map_err(|source| Error::io(path, &source))?;
        log::debug!("saved {} bytes to {}", byte_len, path.display());
        Ok(())
    }

    /// Load a filter previously written by
    /// [`save_to_file`](InterleavedBloomFilter::save_to_file).
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] when the file cannot be read.
    /// - [`Error::CorruptMetadata`] when the metadata tail declares a
    ///   geometry that the file size or the parameter bounds refute.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut bytes = fs::read(path).map_err(|source| Error::io(path, &source))?;
        if bytes.len() < METADATA_BYTES {
            return Err(Error::corrupt_metadata(format!(
                "file of {} bytes cannot hold the {}-byte metadata tail",
                bytes.len(),
                METADATA_BYTES
            )));
        }

        let tail = bytes.len() - METADATA_BYTES;
        let no_of_bins = read_u64_le(&bytes[tail..]);
        let no_of_hash_funcs = read_u64_le(&bytes[tail + 8..]);
        let kmer_size = read_u64_le(&bytes[tail + 16..]);
        let no_of_bits = read_u64_le(&bytes[tail + 24..]);

        if no_of_bits % 8 != 0 || no_of_bits / 8 != bytes.len() as u64 {
            return Err(Error::corrupt_metadata(format!(
                "declared {} bits but the file holds {} bytes",
                no_of_bits,
                bytes.len()
            )));
        }

        let no_of_bins = usize::try_from(no_of_bins)
            .map_err(|_| Error::corrupt_metadata("declared bin count overflows usize"))?;
        let no_of_hash_funcs = usize::try_from(no_of_hash_funcs)
            .map_err(|_| Error::corrupt_metadata("declared hash count overflows usize"))?;
        let kmer_size = usize::try_from(kmer_size)
            .map_err(|_| Error::corrupt_metadata("declared k-mer size overflows usize"))?;
        let geometry = Geometry::new(no_of_bins, no_of_hash_funcs, kmer_size, no_of_bits)
            .map_err(|err| Error::corrupt_metadata(format!("declared geometry rejected: {}", err)))?;

        // The tail only carries metadata in the file; in memory it is
        // kept zero so that a round trip reproduces the saved filter
        // exactly.
        for byte in &mut bytes[tail..] {
            *byte = 0;
        }
        let words: Vec<u64> = bytes.chunks(8).map(read_padded_word).collect();
        let bitvector = BitVector::from_raw_words(words, no_of_bits)?;

        log::debug!(
            "loaded {} from {}: {} bins, {} hash functions, k = {}",
            no_of_bits,
            path.display(),
            no_of_bins,
            no_of_hash_funcs,
            kmer_size
        );
        Self::from_parts(geometry, bitvector)
    }
}

fn read_padded_word(chunk: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..chunk.len()].copy_from_slice(chunk);
    u64::from_le_bytes(buf)
}
