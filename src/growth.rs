//! Growth policies and chunked dynamic arrays
//!
//! Several run-long structures (the extension snapshot table, fingerprint
//! vectors) are dense, integer-indexed, grow monotonically, and never
//! shrink. [`Growth`] centralizes how their backing storage is resized:
//! either by a constant step or exponentially with a fixed additive slack.
//! Out-of-range parameters are rejected eagerly at construction time
//! instead of being clamped later (§ errors in crate docs).
//!
//! [`DynamicArray`] is a chunked sparse array on top of a growth policy:
//! the chunk directory is resized through the policy and chunks are
//! allocated on first write, so a huge index range costs only the chunks
//! actually touched.

use tracing::debug;

use crate::error::{Error, Result};

/// Largest accepted fixed increment.
pub const MAX_INCREMENT: usize = 1 << 20;

/// Largest accepted exponential factor.
pub const MAX_FACTOR: f64 = 64.0;

/// Largest accepted chunk size exponent (1M entries per chunk).
pub const MAX_CHUNK_BITS: u32 = 20;

/// Resizing policy for dynamic arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Growth {
    factor: f64,
    increment: usize,
}

impl Growth {
    /// Constant-step growth: every resize adds exactly `increment` slots.
    pub fn constant(increment: usize) -> Result<Self> {
        if increment == 0 || increment > MAX_INCREMENT {
            return Err(Error::InvalidGrowthIncrement(increment));
        }
        Ok(Growth {
            factor: 1.0,
            increment,
        })
    }

    /// Exponential growth: resize to `factor * old + increment`.
    pub fn exponential(factor: f64, increment: usize) -> Result<Self> {
        if !factor.is_finite() || factor <= 1.0 || factor > MAX_FACTOR {
            return Err(Error::InvalidGrowthFactor(factor));
        }
        if increment == 0 || increment > MAX_INCREMENT {
            return Err(Error::InvalidGrowthIncrement(increment));
        }
        Ok(Growth { factor, increment })
    }

    /// Compute the new capacity for a structure of `old_size` that must be
    /// able to hold at least `min_new_size` entries.
    ///
    /// If the policy step falls short of the minimum (a sudden index jump
    /// far beyond the current size), the result is sized from the minimum
    /// itself, with square-root slack so a sequence of such jumps does not
    /// degrade to one reallocation per write.
    pub fn grow(&self, old_size: usize, min_new_size: usize) -> usize {
        let stepped = (self.factor * old_size as f64) as usize + self.increment;
        if stepped >= min_new_size {
            stepped
        } else {
            min_new_size + self.increment + ((min_new_size as f64).sqrt() * (self.factor - 1.0)) as usize
        }
    }
}

impl Default for Growth {
    /// Doubling with a small additive slack; matches the historical default
    /// used for collapse pools and snapshot tables.
    fn default() -> Self {
        Growth {
            factor: 2.0,
            increment: 7,
        }
    }
}

const DEFAULT_CHUNK_BITS: u32 = 8;
const INIT_CHUNKS: usize = 16;

/// Chunked, growth-policy-backed sparse array.
///
/// `get` on an index never written returns `None`; writes allocate the
/// containing chunk on demand and resize the chunk directory through the
/// growth policy.
#[derive(Debug, Clone)]
pub struct DynamicArray<T> {
    growth: Growth,
    chunk_bits: u32,
    chunk_mask: usize,
    chunks: Vec<Option<Box<[Option<T>]>>>,
    max_index: Option<usize>,
}

impl<T> DynamicArray<T> {
    pub fn new() -> Self {
        // default parameters are in range, constructor cannot fail
        Self::with_growth(Growth::default(), DEFAULT_CHUNK_BITS, INIT_CHUNKS)
            .unwrap_or_else(|_| unreachable!())
    }

    /// Create with an explicit policy, `2^chunk_bits` entries per chunk and
    /// `init_chunks` directory slots.
    pub fn with_growth(growth: Growth, chunk_bits: u32, init_chunks: usize) -> Result<Self> {
        if chunk_bits == 0 || chunk_bits > MAX_CHUNK_BITS {
            return Err(Error::InvalidChunkBits(chunk_bits));
        }
        let mut chunks = Vec::new();
        chunks.resize_with(init_chunks, || None);
        Ok(DynamicArray {
            growth,
            chunk_bits,
            chunk_mask: (1 << chunk_bits) - 1,
            chunks,
            max_index: None,
        })
    }

    #[inline]
    fn entries_per_chunk(&self) -> usize {
        1 << self.chunk_bits
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.chunks
            .get(index >> self.chunk_bits)?
            .as_ref()?
            .get(index & self.chunk_mask)?
            .as_ref()
    }

    /// Store `value` at `index`, returning the displaced entry if the slot
    /// was already occupied.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        let ci = index >> self.chunk_bits;
        if ci >= self.chunks.len() {
            let new_len = self.growth.grow(self.chunks.len(), ci + 1);
            debug!(
                old = self.chunks.len(),
                new = new_len,
                "growing chunk directory"
            );
            self.chunks.resize_with(new_len, || None);
        }
        let entries_per_chunk = self.entries_per_chunk();
        let chunk = self.chunks[ci].get_or_insert_with(|| {
            let mut c = Vec::new();
            c.resize_with(entries_per_chunk, || None);
            c.into_boxed_slice()
        });
        if self.max_index.map_or(true, |m| index > m) {
            self.max_index = Some(index);
        }
        chunk[index & self.chunk_mask].replace(value)
    }

    /// Highest index ever written, if any.
    pub fn max_index(&self) -> Option<usize> {
        self.max_index
    }

    pub fn clear(&mut self) {
        for chunk in &mut self.chunks {
            *chunk = None;
        }
        self.max_index = None;
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}
