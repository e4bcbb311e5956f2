//! Error types for binbloom operations.
//!
//! All fallible operations in the crate return [`Result<T>`] with a
//! [`Error`] payload. Errors are structured so that callers can match on
//! the failure kind and still get a human-readable detail string.
//!
//! # Propagation policy
//!
//! The crate never retries and never suppresses a failure. Construction
//! errors prevent the instance from being used at all, and mutating
//! operations validate their preconditions before touching the bit
//! vector, so a failed call leaves the filter in its prior state.

use std::fmt;

/// Result type alias for binbloom operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, mutating or persisting an
/// interleaved Bloom filter.
///
/// `Clone` and `PartialEq` are kept implementable by storing rendered
/// detail strings instead of source errors, which makes the variants
/// easy to assert on in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operation was called with arguments or on a backing that
    /// violate its contract.
    ///
    /// Examples: a write on a compressed backing, an attempt to shrink
    /// the bin count, a k-mer size outside `[2, 32]`, a bin index past
    /// the end of the directory.
    PreconditionViolated {
        /// What was violated, including the offending parameter.
        message: String,
    },

    /// Reading or writing a filter file failed.
    Io {
        /// Path of the file involved.
        path: String,
        /// Rendered I/O error detail.
        message: String,
    },

    /// The bit vector allocation was refused by the allocator.
    OutOfMemory {
        /// Requested size in bits.
        bits: u64,
    },

    /// A loaded file's 256-bit metadata tail declares a geometry that is
    /// inconsistent with the file itself.
    CorruptMetadata {
        /// What was inconsistent.
        message: String,
    },
}

impl Error {
    /// Build a [`Error::PreconditionViolated`] from any displayable detail.
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionViolated {
            message: message.into(),
        }
    }

    /// Build a [`Error::Io`] from a path and a source error.
    pub(crate) fn io(path: &std::path::Path, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: source.to_string(),
        }
    }

    /// Build a [`Error::OutOfMemory`] for a failed allocation.
    pub(crate) fn out_of_memory(bits: u64) -> Self {
        Self::OutOfMemory { bits }
    }

    /// Build a [`Error::CorruptMetadata`] from any displayable detail.
    pub(crate) fn corrupt_metadata(message: impl Into<String>) -> Self {
        Self::CorruptMetadata {
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreconditionViolated { message } => {
                write!(f, "precondition violated: {}", message)
            }
            Self::Io { path, message } => {
                write!(f, "I/O failure on '{}': {}", path, message)
            }
            Self::OutOfMemory { bits } => {
                write!(f, "failed to allocate a bit vector of {} bits", bits)
            }
            Self::CorruptMetadata { message } => {
                write!(f, "corrupt filter metadata: {}", message)
            }
        }
    }
}

impl std::error::Error for Error {}
