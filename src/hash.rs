//! Order-sensitive structural hash accumulator
//!
//! State matching folds every component of a global state (pooled indices,
//! bit-set words, thread status words) into one compact fingerprint. The
//! accumulator is a Jenkins-style one-at-a-time avalanche hash over a single
//! signed 32-bit word: each `add` doubles the running value and then mixes
//! the argument in byte by byte, so the order of `add` calls is part of the
//! observable contract.
//!
//! The final code is deliberately narrow (`(m >>> 4) ^ (m & 15)`) to keep
//! stored fingerprints small. It is never trusted on its own: a component
//! that matches on this hash must fall back to full structural equality on
//! a hash hit. The accumulator only cuts down the number of expensive
//! equality checks.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Initial seed, restored by `reset`. Must be negative so the first `add`
/// takes the poly-mixing branch exactly once.
const SEED: i32 = -1;

/// Odd mixing constant XORed into the doubled state while it is negative.
/// Avoids the trivial collision where the first added value alone
/// determines the running state.
const POLY: i32 = 0x8888_8EEF_u32 as i32;

/// Hash constants Java uses for booleans; kept for fingerprint stability
/// with the original serializer format.
const TRUE_HASH: i32 = 1231;
const FALSE_HASH: i32 = 1237;

/// Accumulates 32-bit words into a compact avalanching fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashAccumulator {
    m: i32,
}

impl HashAccumulator {
    pub fn new() -> Self {
        HashAccumulator { m: SEED }
    }

    /// One avalanche round: add byte, shift-add, xor-shift.
    #[inline]
    fn mix_byte(&mut self, b: i32) {
        let mut m = self.m.wrapping_add(b);
        m = m.wrapping_add(m.wrapping_shl(10));
        m ^= ((m as u32) >> 6) as i32;
        self.m = m;
    }

    /// Fold a 32-bit value into the running state.
    pub fn add(&mut self, v: i32) {
        if self.m < 0 {
            self.m = self.m.wrapping_add(self.m) ^ POLY;
        } else {
            self.m = self.m.wrapping_add(self.m);
        }
        self.mix_byte(v & 0xff);
        self.mix_byte((v >> 8) & 0xff);
        self.mix_byte((v >> 16) & 0xff);
        self.mix_byte(((v as u32) >> 24) as i32);
    }

    /// Fold a 64-bit value: low word first, then high word.
    pub fn add_long(&mut self, v: i64) {
        self.add(v as i32);
        self.add((v >> 32) as i32);
    }

    pub fn add_bool(&mut self, v: bool) {
        self.add(if v { TRUE_HASH } else { FALSE_HASH });
    }

    /// Chain an arbitrary value's own hash code into the accumulator.
    ///
    /// The value is hashed with `FxHasher` and the result folded as one
    /// 32-bit word, mirroring how the original chained `hashCode()`.
    pub fn add_hashed<T: Hash + ?Sized>(&mut self, v: &T) {
        let mut h = FxHasher::default();
        v.hash(&mut h);
        self.add(h.finish() as i32);
    }

    /// Finalize into the compact fingerprint code. Does not consume the
    /// accumulator; further `add` calls keep extending the same state.
    #[inline]
    pub fn value(&self) -> i32 {
        (((self.m as u32) >> 4) as i32) ^ (self.m & 15)
    }

    /// Restore the initial seed so the accumulator can be reused.
    pub fn reset(&mut self) {
        self.m = SEED;
    }
}

impl Default for HashAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
