//! Compact canonical bit-sets
//!
//! Dense state bitmaps (enabled-thread sets, reference maps) are stored in a
//! minimal-length byte representation: all trailing all-zero bytes are
//! trimmed, so two bit-sets with the same logical bit pattern always have
//! byte-identical storage. That makes plain array equality/hash correct and
//! lets canonical instances flow through the hash-consing [`Pool`] so
//! structurally identical bitmaps across different global states share one
//! representative.
//!
//! [`WorkingBitSet`] is the mutable builder used while a state is being
//! assembled; [`CanonicalBitSet`] is the trimmed immutable form that gets
//! pooled and hashed.
//!
//! [`Pool`]: crate::pool::Pool

use crate::hash::HashAccumulator;

/// Immutable, trailing-zero-trimmed bit-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBitSet {
    bytes: Box<[u8]>,
}

impl CanonicalBitSet {
    /// Build from a byte buffer, trimming trailing all-zero bytes so equal
    /// bit patterns get identical storage regardless of the buffer length
    /// they arrived in.
    pub fn from_bytes(buf: &[u8]) -> Self {
        let len = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        CanonicalBitSet {
            bytes: buf[..len].into(),
        }
    }

    /// Bounds-tolerant bit test: any index beyond the stored length reads
    /// as false, never fails.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        match self.bytes.get(i >> 3) {
            Some(&b) => b & (1 << (i & 7)) != 0,
            None => false,
        }
    }

    /// Trimmed storage length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn cardinality(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Fold the storage into a structural hash, in 32-bit word chunks.
    /// A short tail chunk is zero-padded, which is safe because trimming
    /// guarantees equal bit patterns have equal storage.
    pub fn hash_into(&self, hd: &mut HashAccumulator) {
        for chunk in self.bytes.chunks(4) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            hd.add(i32::from_le_bytes(word));
        }
    }
}

/// Mutable working bit-set with cardinality tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingBitSet {
    bytes: Vec<u8>,
    cardinality: usize,
}

impl WorkingBitSet {
    pub fn new() -> Self {
        WorkingBitSet::default()
    }

    pub fn with_capacity(n_bits: usize) -> Self {
        WorkingBitSet {
            bytes: Vec::with_capacity(n_bits.div_ceil(8)),
            cardinality: 0,
        }
    }

    /// Set bit `i`. Returns true if the set changed.
    pub fn add(&mut self, i: usize) -> bool {
        let byte = i >> 3;
        if byte >= self.bytes.len() {
            self.bytes.resize(byte + 1, 0);
        }
        let mask = 1u8 << (i & 7);
        if self.bytes[byte] & mask == 0 {
            self.bytes[byte] |= mask;
            self.cardinality += 1;
            true
        } else {
            false
        }
    }

    /// Clear bit `i`. Returns true if the set changed.
    pub fn remove(&mut self, i: usize) -> bool {
        let byte = i >> 3;
        let mask = 1u8 << (i & 7);
        match self.bytes.get_mut(byte) {
            Some(b) if *b & mask != 0 => {
                *b &= !mask;
                self.cardinality -= 1;
                true
            }
            _ => false,
        }
    }

    /// Bounds-tolerant membership test.
    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        match self.bytes.get(i >> 3) {
            Some(&b) => b & (1 << (i & 7)) != 0,
            None => false,
        }
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.cardinality = 0;
    }

    /// One-shot ascending cursor over the set bits, bounded by the current
    /// cardinality. Not restartable; create a new cursor to iterate again.
    pub fn bits(&mut self) -> SetBits<'_> {
        let remaining = self.cardinality;
        SetBits {
            set: self,
            next_index: 0,
            remaining,
            last: None,
        }
    }

    /// Snapshot into the trimmed immutable form, ready for pooling.
    pub fn to_canonical(&self) -> CanonicalBitSet {
        CanonicalBitSet::from_bytes(&self.bytes)
    }
}

/// Forward-only set-bit cursor handed out by [`WorkingBitSet::bits`].
pub struct SetBits<'a> {
    set: &'a mut WorkingBitSet,
    next_index: usize,
    remaining: usize,
    last: Option<usize>,
}

impl SetBits<'_> {
    /// Clear the most recently yielded bit in the underlying set.
    /// Returns false if nothing has been yielded since the last removal.
    pub fn remove_last(&mut self) -> bool {
        match self.last.take() {
            Some(i) => self.set.remove(i),
            None => false,
        }
    }
}

impl Iterator for SetBits<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let n_bits = self.set.bytes.len() * 8;
        let mut i = self.next_index;
        while i < n_bits {
            if self.set.contains(i) {
                self.next_index = i + 1;
                self.remaining -= 1;
                self.last = Some(i);
                return Some(i);
            }
            i += 1;
        }
        self.remaining = 0;
        None
    }
}
