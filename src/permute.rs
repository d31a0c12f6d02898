//! Bounded interleaving-order generators
//!
//! At every choice point the search has `n` pending choices (typically the
//! runnable threads) and some order must be picked to try them in. Trying
//! every ordering is `n!` and intractable past roughly eight concurrent
//! entities, so a generator produces a bounded, strategy-specific sequence
//! of orderings instead:
//!
//! - [`Permuter::total`] — all `n!` orderings (baseline, small `n` only)
//! - [`Permuter::pairwise`] — the identity plus one ordering per unordered
//!   index pair, `1 + n(n-1)/2` total; enough to expose most
//!   ordering-sensitive defects between two concurrent entities
//! - [`Permuter::random`] — a fixed count of seeded Fisher-Yates shuffles,
//!   repeats allowed
//! - [`Permuter::unique_random`] — seeded shuffles de-duplicated on their
//!   structural hash, clamped to `min(n!, requested)`
//!
//! All sequences are fully deterministic for a fixed seed, which is what
//! lets a recorded defect be replayed. `next` hands out a borrow of the
//! generator's single live permutation buffer; `None` means the strategy's
//! predetermined count is exhausted (a normal condition, not an error).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::trace;

use crate::error::{Error, Result};
use crate::hash::HashAccumulator;

/// Seed used when the configuration surface does not supply one.
pub const DEFAULT_SEED: u64 = 42;

/// `n!`, saturating at `u64::MAX` (n >= 21 overflows, and any such count
/// is unreachable in practice anyway).
pub fn factorial_saturating(n: usize) -> u64 {
    let mut f: u64 = 1;
    for k in 2..=n as u64 {
        f = f.saturating_mul(k);
    }
    f
}

/// Cursor state shared by every strategy: the single live permutation
/// buffer, the generation counter and the precomputed total count.
#[derive(Debug, Clone)]
struct Cursor {
    permutation: Vec<u32>,
    n_generated: u64,
    total: u64,
}

impl Cursor {
    fn new(n_elements: usize, total: u64) -> Self {
        Cursor {
            permutation: (0..n_elements as u32).collect(),
            n_generated: 0,
            total,
        }
    }

    fn reset_identity(&mut self) {
        for (i, p) in self.permutation.iter_mut().enumerate() {
            *p = i as u32;
        }
        self.n_generated = 0;
    }

    #[inline]
    fn exhausted(&self) -> bool {
        self.n_generated >= self.total
    }
}

/// Exhaustive enumeration in lexicographic order.
#[derive(Debug, Clone)]
pub struct TotalPermuter {
    cur: Cursor,
}

impl TotalPermuter {
    fn new(n_elements: usize) -> Self {
        TotalPermuter {
            cur: Cursor::new(n_elements, factorial_saturating(n_elements)),
        }
    }

    /// Standard lexicographic successor. Only called while a successor is
    /// known to exist (the generation counter is below `n!`).
    fn advance(&mut self) {
        let p = &mut self.cur.permutation;
        let Some(pivot) = p.windows(2).rposition(|w| w[0] < w[1]) else {
            debug_assert!(false, "advance called on the last permutation");
            return;
        };
        let successor = p.iter().rposition(|&x| x > p[pivot]).unwrap_or(pivot);
        p.swap(pivot, successor);
        p[pivot + 1..].reverse();
    }

    fn next(&mut self) -> Option<&[u32]> {
        if self.cur.exhausted() {
            return None;
        }
        if self.cur.n_generated > 0 {
            self.advance();
        }
        self.cur.n_generated += 1;
        Some(&self.cur.permutation)
    }
}

/// Identity plus every single-pair swap of the identity.
#[derive(Debug, Clone)]
pub struct PairwisePermuter {
    cur: Cursor,
    i: usize,
    j: usize,
    swapped: bool,
}

impl PairwisePermuter {
    fn new(n_elements: usize) -> Self {
        let n = n_elements as u64;
        let total = 1 + if n < 2 { 0 } else { n * (n - 1) / 2 };
        PairwisePermuter {
            cur: Cursor::new(n_elements, total),
            i: 0,
            j: 0,
            swapped: false,
        }
    }

    fn next(&mut self) -> Option<&[u32]> {
        if self.cur.exhausted() {
            return None;
        }
        if self.cur.n_generated > 0 {
            let n = self.cur.permutation.len();
            if self.swapped {
                // undo the previous swap before applying the next one
                self.cur.permutation.swap(self.i, self.j);
                self.j += 1;
                if self.j == n {
                    self.i += 1;
                    self.j = self.i + 1;
                }
            } else {
                self.i = 0;
                self.j = 1;
                self.swapped = true;
            }
            self.cur.permutation.swap(self.i, self.j);
        }
        self.cur.n_generated += 1;
        Some(&self.cur.permutation)
    }

    fn reset(&mut self) {
        self.cur.reset_identity();
        self.i = 0;
        self.j = 0;
        self.swapped = false;
    }
}

/// Fixed count of seeded Fisher-Yates shuffles; repeats allowed.
#[derive(Debug, Clone)]
pub struct RandomPermuter {
    cur: Cursor,
    seed: u64,
    rng: StdRng,
}

impl RandomPermuter {
    fn new(n_elements: usize, seed: u64, count: u64) -> Self {
        RandomPermuter {
            cur: Cursor::new(n_elements, count),
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn next(&mut self) -> Option<&[u32]> {
        if self.cur.exhausted() {
            return None;
        }
        self.cur.permutation.shuffle(&mut self.rng);
        self.cur.n_generated += 1;
        Some(&self.cur.permutation)
    }

    /// Reseeding identically is what makes the sequence replayable.
    fn reset(&mut self) {
        self.cur.reset_identity();
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}

/// Seeded shuffles with duplicates rejected on their structural hash.
///
/// De-duplication keys on the 32-bit structural hash of the permutation
/// buffer, not the buffer itself, so a hash collision can reject a truly
/// novel ordering. The risk is probabilistic by design and inherited from
/// the original; the clamp to `min(n!, requested)` bounds the sequence.
#[derive(Debug, Clone)]
pub struct UniqueRandomPermuter {
    cur: Cursor,
    seed: u64,
    rng: StdRng,
    seen: Vec<i32>,
}

impl UniqueRandomPermuter {
    fn new(n_elements: usize, seed: u64, requested: u64) -> Self {
        let total = factorial_saturating(n_elements).min(requested);
        UniqueRandomPermuter {
            cur: Cursor::new(n_elements, total),
            seed,
            rng: StdRng::seed_from_u64(seed),
            seen: Vec::new(),
        }
    }

    fn permutation_hash(permutation: &[u32]) -> i32 {
        let mut hd = HashAccumulator::new();
        for &e in permutation {
            hd.add(e as i32);
        }
        hd.value()
    }

    fn next(&mut self) -> Option<&[u32]> {
        if self.cur.exhausted() {
            return None;
        }
        loop {
            self.cur.permutation.shuffle(&mut self.rng);
            let h = Self::permutation_hash(&self.cur.permutation);
            match self.seen.binary_search(&h) {
                Err(pos) => {
                    self.seen.insert(pos, h);
                    self.cur.n_generated += 1;
                    return Some(&self.cur.permutation);
                }
                Ok(_) => {
                    trace!(hash = h, "duplicate shuffle rejected");
                }
            }
        }
    }

    fn reset(&mut self) {
        self.cur.reset_identity();
        self.rng = StdRng::seed_from_u64(self.seed);
        self.seen.clear();
    }
}

/// Closed family of interleaving-order strategies.
///
/// One generator owns exactly one live permutation buffer; `next` returns
/// a borrow of it, so callers that need to keep an ordering across calls
/// must copy it out.
#[derive(Debug, Clone)]
pub enum Permuter {
    Total(TotalPermuter),
    Pairwise(PairwisePermuter),
    Random(RandomPermuter),
    UniqueRandom(UniqueRandomPermuter),
}

impl Permuter {
    /// All `n!` orderings.
    pub fn total(n_elements: usize) -> Self {
        Permuter::Total(TotalPermuter::new(n_elements))
    }

    /// Identity plus one ordering per unordered index pair.
    pub fn pairwise(n_elements: usize) -> Self {
        Permuter::Pairwise(PairwisePermuter::new(n_elements))
    }

    /// `count` seeded shuffles, repeats allowed.
    pub fn random(n_elements: usize, seed: u64, count: u64) -> Self {
        Permuter::Random(RandomPermuter::new(n_elements, seed, count))
    }

    /// Up to `min(n!, requested)` distinct seeded shuffles.
    pub fn unique_random(n_elements: usize, seed: u64, requested: u64) -> Self {
        Permuter::UniqueRandom(UniqueRandomPermuter::new(n_elements, seed, requested))
    }

    /// Next ordering to try, or `None` once the strategy's predetermined
    /// count has been produced.
    pub fn next(&mut self) -> Option<&[u32]> {
        match self {
            Permuter::Total(p) => p.next(),
            Permuter::Pairwise(p) => p.next(),
            Permuter::Random(p) => p.next(),
            Permuter::UniqueRandom(p) => p.next(),
        }
    }

    /// Reinitialize to the identity ordering and replay the sequence from
    /// the start (reseeding identically for the random strategies).
    pub fn reset(&mut self) {
        match self {
            Permuter::Total(p) => p.cur.reset_identity(),
            Permuter::Pairwise(p) => p.reset(),
            Permuter::Random(p) => p.reset(),
            Permuter::UniqueRandom(p) => p.reset(),
        }
    }

    /// Exact, strategy-specific total count.
    pub fn number_of_permutations(&self) -> u64 {
        self.cursor().total
    }

    /// Orderings produced since construction or the last reset.
    pub fn n_generated(&self) -> u64 {
        self.cursor().n_generated
    }

    pub fn n_elements(&self) -> usize {
        self.cursor().permutation.len()
    }

    fn cursor(&self) -> &Cursor {
        match self {
            Permuter::Total(p) => &p.cur,
            Permuter::Pairwise(p) => &p.cur,
            Permuter::Random(p) => &p.cur,
            Permuter::UniqueRandom(p) => &p.cur,
        }
    }
}

/// Strategy selector for the configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermuterKind {
    Total,
    Pairwise,
    Random,
    UniqueRandom,
}

/// Builder-style generator configuration: strategy, element count,
/// optional seed and optional count bound.
#[derive(Debug, Clone)]
pub struct PermuterConfig {
    kind: PermuterKind,
    n_elements: usize,
    seed: u64,
    max_permutations: Option<u64>,
}

impl PermuterConfig {
    pub fn new(kind: PermuterKind, n_elements: usize) -> Self {
        PermuterConfig {
            kind,
            n_elements,
            seed: DEFAULT_SEED,
            max_permutations: None,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_permutations(mut self, bound: u64) -> Self {
        self.max_permutations = Some(bound);
        self
    }

    /// Validate and build the generator. For the random strategies the
    /// count bound defaults to `n!` (saturating) when not given.
    pub fn build(&self) -> Result<Permuter> {
        if self.max_permutations == Some(0) {
            return Err(Error::InvalidPermutationBound);
        }
        let bound = || {
            self.max_permutations
                .unwrap_or_else(|| factorial_saturating(self.n_elements))
        };
        Ok(match self.kind {
            PermuterKind::Total => Permuter::total(self.n_elements),
            PermuterKind::Pairwise => Permuter::pairwise(self.n_elements),
            PermuterKind::Random => Permuter::random(self.n_elements, self.seed, bound()),
            PermuterKind::UniqueRandom => {
                Permuter::unique_random(self.n_elements, self.seed, bound())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(p: &mut Permuter) -> Vec<Vec<u32>> {
        let mut all = Vec::new();
        while let Some(perm) = p.next() {
            all.push(perm.to_vec());
        }
        all
    }

    fn is_permutation(perm: &[u32]) -> bool {
        let mut seen = vec![false; perm.len()];
        perm.iter().all(|&e| {
            let i = e as usize;
            i < seen.len() && !std::mem::replace(&mut seen[i], true)
        })
    }

    #[test]
    fn test_total_enumerates_factorial() {
        let mut p = Permuter::total(4);
        assert_eq!(p.number_of_permutations(), 24);
        let all = drain(&mut p);
        assert_eq!(all.len(), 24);
        assert_eq!(all[0], vec![0, 1, 2, 3]);
        assert!(all.iter().all(|perm| is_permutation(perm)));

        let mut distinct = all.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 24);
        assert!(p.next().is_none());
    }

    #[test]
    fn test_pairwise_counts() {
        assert_eq!(Permuter::pairwise(3).number_of_permutations(), 4);
        assert_eq!(Permuter::pairwise(4).number_of_permutations(), 7);
        assert_eq!(Permuter::pairwise(1).number_of_permutations(), 1);
        assert_eq!(Permuter::pairwise(0).number_of_permutations(), 1);
    }

    #[test]
    fn test_pairwise_identity_then_single_swaps() {
        let n = 4;
        let mut p = Permuter::pairwise(n);
        let all = drain(&mut p);
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], vec![0, 1, 2, 3]);

        // every later ordering differs from the identity in exactly one
        // transposed pair, and each unordered pair appears exactly once
        let mut pairs_seen = Vec::new();
        for perm in &all[1..] {
            let moved: Vec<usize> = (0..n)
                .filter(|&k| perm[k] != k as u32)
                .collect();
            assert_eq!(moved.len(), 2);
            let (i, j) = (moved[0], moved[1]);
            assert_eq!(perm[i], j as u32);
            assert_eq!(perm[j], i as u32);
            pairs_seen.push((i, j));
        }
        pairs_seen.sort();
        pairs_seen.dedup();
        assert_eq!(pairs_seen.len(), 6);
        assert!(p.next().is_none());
    }

    #[test]
    fn test_pairwise_reset_replays() {
        let mut p = Permuter::pairwise(5);
        let first = drain(&mut p);
        p.reset();
        let second = drain(&mut p);
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_seed_determinism() {
        let mut a = Permuter::random(6, 7, 20);
        let mut b = Permuter::random(6, 7, 20);
        assert_eq!(drain(&mut a), drain(&mut b));
    }

    #[test]
    fn test_random_reset_reseeds() {
        let mut p = Permuter::random(5, 99, 10);
        let first = drain(&mut p);
        assert_eq!(first.len(), 10);
        p.reset();
        assert_eq!(drain(&mut p), first);
    }

    #[test]
    fn test_random_different_seeds_diverge() {
        let mut a = Permuter::random(8, 1, 5);
        let mut b = Permuter::random(8, 2, 5);
        assert_ne!(drain(&mut a), drain(&mut b));
    }

    #[test]
    fn test_unique_random_no_repeats() {
        let mut p = Permuter::unique_random(4, 11, 1000);
        assert_eq!(p.number_of_permutations(), 24);
        let all = drain(&mut p);
        assert_eq!(all.len(), 24);
        let mut distinct = all.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), all.len());
    }

    #[test]
    fn test_unique_random_respects_requested_bound() {
        let mut p = Permuter::unique_random(6, 3, 10);
        assert_eq!(p.number_of_permutations(), 10);
        assert_eq!(drain(&mut p).len(), 10);
    }

    #[test]
    fn test_degenerate_element_counts() {
        for n in [0, 1] {
            let mut p = Permuter::total(n);
            assert_eq!(p.number_of_permutations(), 1);
            assert_eq!(p.next().map(<[u32]>::len), Some(n));
            assert!(p.next().is_none());
        }
    }

    #[test]
    fn test_config_builds_each_kind() {
        let kinds = [
            (PermuterKind::Total, 6u64),
            (PermuterKind::Pairwise, 4),
            (PermuterKind::Random, 5),
            (PermuterKind::UniqueRandom, 5),
        ];
        for (kind, expected_total) in kinds {
            let p = PermuterConfig::new(kind, 3)
                .seed(17)
                .max_permutations(5)
                .build()
                .unwrap();
            assert_eq!(p.number_of_permutations(), expected_total);
        }
    }

    #[test]
    fn test_config_rejects_zero_bound() {
        let err = PermuterConfig::new(PermuterKind::Random, 3)
            .max_permutations(0)
            .build()
            .unwrap_err();
        assert_eq!(err, Error::InvalidPermutationBound);
    }
}
