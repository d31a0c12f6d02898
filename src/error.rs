//! Error types for the exploration core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by eager parameter validation.
///
/// Generator exhaustion is deliberately not represented here: running out
/// of permutations is a normal end-of-sequence condition and is reported
/// as `None` from `Permuter::next`, never as an `Error`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Growth increment outside the accepted range
    #[error("growth increment out of range: {0} (must be in 1..={max})", max = crate::growth::MAX_INCREMENT)]
    InvalidGrowthIncrement(usize),

    /// Growth factor outside the accepted range
    #[error("growth factor out of range: {0} (must be finite, > 1.0 and <= {max})", max = crate::growth::MAX_FACTOR)]
    InvalidGrowthFactor(f64),

    /// Chunk size exponent too large for a dynamic array
    #[error("dynamic array chunk bits out of range: {0} (must be <= {max})", max = crate::growth::MAX_CHUNK_BITS)]
    InvalidChunkBits(u32),

    /// Requested permutation bound that can never produce an ordering
    #[error("permutation bound must be positive")]
    InvalidPermutationBound,
}
