//! Visited-state set over 64-bit Jenkins fingerprints
//!
//! Once a global state has been serialized into a vector of pooled indices
//! and canonical bit-set words, revisit detection reduces to a set
//! membership query on that vector. The set stores only a 64-bit lookup3
//! fingerprint per state, in an open-addressed, double-hashed table with a
//! dense id per distinct fingerprint.
//!
//! Matching is on the fingerprint alone; two distinct state vectors that
//! collide in 64 bits are treated as the same state. That trade is
//! deliberate: storing full vectors for the fallback equality check would
//! multiply memory by the state size, and 64-bit collisions are vanishingly
//! rare at realistic state counts.

use tracing::debug;

/// Table load threshold before doubling.
const MAX_LOAD: f64 = 0.7;
const INIT_SIZE: usize = 1 << 16;

/// Jenkins' lookup3 hash over a word vector, folded to 64 bits.
pub fn lookup3_hash(val: &[i32]) -> u64 {
    let mut a: i32 = 0x510f_b60d_u32 as i32;
    let mut b: i32 = (0xa4cb_30d9_u32 as i32).wrapping_add(val.len() as i32);
    let mut c: i32 = 0x9e37_79b9_u32 as i32;

    #[inline]
    fn ls(x: i32, s: u32) -> i32 {
        x.wrapping_shl(s)
    }
    #[inline]
    fn rs(x: i32, s: u32) -> i32 {
        ((x as u32) >> s) as i32
    }

    let len = val.len() as isize;
    let mut i: isize = 0;
    while i < len - 2 {
        let k = i as usize;
        a = a.wrapping_add(val[k]);
        b = b.wrapping_add(val[k + 1]);
        c = c.wrapping_add(val[k + 2]);
        a = a.wrapping_sub(c); a ^= ls(c, 4) ^ rs(c, 28); c = c.wrapping_add(b);
        b = b.wrapping_sub(a); b ^= ls(a, 6) ^ rs(a, 26); a = a.wrapping_add(c);
        c = c.wrapping_sub(b); c ^= ls(b, 8) ^ rs(b, 24); b = b.wrapping_add(a);
        a = a.wrapping_sub(c); a ^= ls(c, 16) ^ rs(c, 16); c = c.wrapping_add(b);
        b = b.wrapping_sub(a); b ^= ls(a, 19) ^ rs(a, 13); a = a.wrapping_add(c);
        c = c.wrapping_sub(b); c ^= ls(b, 4) ^ rs(b, 28); b = b.wrapping_add(a);
        i += 3;
    }
    match len - i {
        2 => {
            c = c.wrapping_add(val[val.len() - 2]);
            b = b.wrapping_add(val[val.len() - 1]);
        }
        1 => {
            b = b.wrapping_add(val[val.len() - 1]);
        }
        _ => {}
    }
    c ^= b; c = c.wrapping_sub(ls(b, 14) ^ rs(b, 18));
    a ^= c; a = a.wrapping_sub(ls(c, 11) ^ rs(c, 21));
    b ^= a; b = b.wrapping_sub(ls(a, 25) ^ rs(a, 7));
    c ^= b; c = c.wrapping_sub(ls(b, 16) ^ rs(b, 16));
    a ^= c; a = a.wrapping_sub(ls(c, 4) ^ rs(c, 28));
    b ^= a; b = b.wrapping_sub(ls(a, 14) ^ rs(a, 18));
    c ^= b; c = c.wrapping_sub(ls(b, 24) ^ rs(b, 8));

    (((c as i64) << 32) ^ (b as i64) ^ (a as i64)) as u64
}

/// Fingerprint-based visited-state set assigning dense state ids.
pub struct StateSet {
    /// fingerprint per state id, insertion order
    fingerprints: Vec<u64>,
    /// open-addressed slots holding id + 1; 0 means empty
    table: Vec<u32>,
    next_rehash: usize,
}

impl StateSet {
    pub fn new() -> Self {
        StateSet {
            fingerprints: Vec::with_capacity((MAX_LOAD * INIT_SIZE as f64) as usize / 2),
            table: vec![0; INIT_SIZE],
            next_rehash: (MAX_LOAD * INIT_SIZE as f64) as usize,
        }
    }

    /// Number of distinct states recorded so far.
    pub fn size(&self) -> usize {
        self.fingerprints.len()
    }

    fn probe_start(hash: u64, mask: usize) -> (usize, usize) {
        let idx = (hash >> 32) as usize & mask;
        let delta = (hash as u32 | 1) as usize; // must be odd
        (idx, delta)
    }

    /// Record the serialized state vector, returning its dense id and
    /// whether it was new. Equal vectors always map to the same id.
    pub fn add(&mut self, val: &[i32]) -> (u32, bool) {
        let hash = lookup3_hash(val);
        let mut mask = self.table.len() - 1;
        let (mut idx, delta) = Self::probe_start(hash, mask);
        let first_idx = idx;

        while self.table[idx] != 0 {
            let id = self.table[idx] - 1;
            if self.fingerprints[id as usize] == hash {
                return (id, false);
            }
            idx = (idx + delta) & mask;
            debug_assert_ne!(idx, first_idx, "state set probe wrapped around");
        }

        if self.fingerprints.len() >= self.next_rehash {
            let new_size = self.table.len() << 1;
            debug!(new_size, states = self.fingerprints.len(), "rehashing state set");
            self.table = vec![0; new_size];
            mask = new_size - 1;
            self.next_rehash = (MAX_LOAD * new_size as f64) as usize;

            for (id, &fp) in self.fingerprints.iter().enumerate() {
                let (mut j, d) = Self::probe_start(fp, mask);
                while self.table[j] != 0 {
                    j = (j + d) & mask;
                }
                self.table[j] = id as u32 + 1;
            }
            // state is known new; re-find an empty slot in the new table
            let (mut j, d) = Self::probe_start(hash, mask);
            while self.table[j] != 0 {
                j = (j + d) & mask;
            }
            idx = j;
        }

        let id = self.fingerprints.len() as u32;
        self.table[idx] = id + 1;
        self.fingerprints.push(hash);
        (id, true)
    }

    /// Forget all recorded states between verification runs.
    pub fn clear(&mut self) {
        self.fingerprints.clear();
        self.table = vec![0; INIT_SIZE];
        self.next_rehash = (MAX_LOAD * INIT_SIZE as f64) as usize;
    }
}

impl Default for StateSet {
    fn default() -> Self {
        Self::new()
    }
}
