//! Core storage and layout primitives.
//!
//! The interleaved filter is built on two pieces: [`BitVector`], the
//! packed atomic bit storage, and [`Geometry`], the derived block
//! layout that maps (hash slot, bin) pairs onto bit positions.

pub mod bitvec;
pub mod geometry;

pub use bitvec::BitVector;
pub use geometry::{Geometry, MAX_KMER_SIZE, MIN_KMER_SIZE};
