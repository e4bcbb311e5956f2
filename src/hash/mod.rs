//! K-mer fingerprinting and index mixing.
//!
//! [`Fingerprints`] turns a text into a lazy stream of 64-bit rolling
//! hashes; [`HashMixer`] expands one fingerprint into the block origins
//! tested by each hash function.

pub mod kmer;
pub mod mixer;

pub use kmer::{Alphabet, Dna, Fingerprints};
pub use mixer::HashMixer;
