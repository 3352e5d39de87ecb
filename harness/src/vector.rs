//! Generators of error vectors over the linear bit indices `[0, N)`.
//!
//! Every generator emits distinct positions in increasing order. Positions are linear
//! indices: [crate::linear::linearize] converts them to bit addresses before they touch a
//! buffer.

use crate::Error;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Exhaustive runs with more cases than this are skipped.
pub const DEFAULT_MAX_CASES: u128 = 15_000_000_000;

/// Feasibility bound on exhaustive enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ceiling {
    pub max_cases: u128,
}

impl Default for Ceiling {
    fn default() -> Self {
        Self {
            max_cases: DEFAULT_MAX_CASES,
        }
    }
}

impl Ceiling {
    /// Returns the number of `k`-subsets of `[0, n)` if enumerating them over `GF(2^m)` is
    /// within bounds.
    pub fn admit(&self, m: u32, n: u32, k: u32) -> Option<u64> {
        if m as u64 * k as u64 >= 64 {
            return None;
        }
        combinations(n, k)
            .filter(|cases| *cases <= self.max_cases)
            .and_then(|cases| u64::try_from(cases).ok())
    }
}

/// Returns `C(n, k)`, or `None` if it overflows.
pub fn combinations(n: u32, k: u32) -> Option<u128> {
    if k > n {
        return Some(0);
    }
    let mut cases: u128 = 1;
    for i in 0..k as u128 {
        // C(n, i + 1) = C(n, i) * (n - i) / (i + 1) is exact at every step.
        cases = cases.checked_mul(n as u128 - i)? / (i + 1);
    }
    Some(cases)
}

/// Call `f` with every `k`-subset of `[0, n)`, in lexicographic order.
///
/// Stops at (and returns) the first error `f` returns.
pub fn for_each_combination<E, F>(n: u32, k: usize, mut f: F) -> Result<(), E>
where
    F: FnMut(&[u32]) -> Result<(), E>,
{
    let mut vec = vec![0; k];
    descend(n, &mut vec, 0, &mut f)
}

fn descend<E, F>(n: u32, vec: &mut [u32], depth: usize, f: &mut F) -> Result<(), E>
where
    F: FnMut(&[u32]) -> Result<(), E>,
{
    let k = vec.len();
    if depth == k {
        return f(vec);
    }
    let start = if depth == 0 { 0 } else { vec[depth - 1] + 1 };
    // Leave room for the positions still to be chosen.
    let end = n.saturating_sub((k - depth - 1) as u32);
    for i in start..end {
        vec[depth] = i;
        descend(n, vec, depth + 1, f)?;
    }
    Ok(())
}

/// Returns every run of `k` consecutive positions in `[0, n)`, or nothing when `k` is zero.
pub fn bursts(n: u32, k: u32) -> impl Iterator<Item = Vec<u32>> {
    let starts = if k == 0 { 0 } else { (n + 1).saturating_sub(k) };
    (0..starts).map(move |start| (start..start + k).collect())
}

/// Ensure every position of an externally supplied vector lies in `[0, n)` and none repeats.
pub fn validate(positions: &[u32], n: u32) -> Result<(), Error> {
    if let Some(p) = positions.iter().find(|p| **p >= n) {
        return Err(Error::Config(format!("position {p} outside of {n} bits")));
    }
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(Error::Config(format!("position {} repeated", w[0])));
    }
    Ok(())
}

/// Seeded sampler of error vectors.
///
/// The same seed always reproduces the same sequence of vectors.
pub struct Sampler {
    rng: ChaCha8Rng,
    n: u32,
}

impl Sampler {
    pub fn new(n: u32, seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            n,
        }
    }

    /// Draw a vector size uniformly from `1..=t`.
    pub fn size(&mut self, t: u32) -> usize {
        self.rng.gen_range(1..=t) as usize
    }

    /// Draw `k` distinct positions, redrawing any position that collides with an earlier one.
    ///
    /// # Panics
    ///
    /// Panics if `k` exceeds the number of positions.
    pub fn sample(&mut self, k: usize) -> Vec<u32> {
        assert!(k <= self.n as usize, "cannot draw {k} of {} positions", self.n);
        let mut vec: Vec<u32> = Vec::with_capacity(k);
        while vec.len() < k {
            let position = self.rng.gen_range(0..self.n);
            if !vec.contains(&position) {
                vec.push(position);
            }
        }
        vec.sort_unstable();
        vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case(10, 0, 1; "empty")]
    #[test_case(10, 1, 10; "single")]
    #[test_case(10, 3, 120; "triple")]
    #[test_case(92, 2, 4186; "pair")]
    #[test_case(3, 5, 0; "too many")]
    fn test_combinations(n: u32, k: u32, expected: u128) {
        assert_eq!(combinations(n, k), Some(expected));
    }

    #[test]
    fn test_combinations_overflow() {
        assert_eq!(combinations(u32::MAX, 64), None);
    }

    #[test_case(20, 0; "empty")]
    #[test_case(20, 1; "single")]
    #[test_case(20, 3; "triple")]
    #[test_case(12, 12; "full")]
    fn test_enumeration_visits_each_once(n: u32, k: usize) {
        let mut seen = HashSet::new();
        let mut previous: Option<Vec<u32>> = None;
        for_each_combination(n, k, |vec| {
            assert_eq!(vec.len(), k);
            assert!(vec.windows(2).all(|w| w[0] < w[1]));
            assert!(vec.iter().all(|p| *p < n));
            if let Some(previous) = &previous {
                assert!(previous.as_slice() < vec);
            }
            previous = Some(vec.to_vec());
            assert!(seen.insert(vec.to_vec()));
            Ok::<_, ()>(())
        })
        .unwrap();
        assert_eq!(seen.len() as u128, combinations(n, k as u32).unwrap());
    }

    #[test]
    fn test_enumeration_stops_on_error() {
        let mut visited = 0;
        let result = for_each_combination(10, 2, |_| {
            visited += 1;
            if visited == 5 {
                return Err(visited);
            }
            Ok(())
        });
        assert_eq!(result, Err(5));
        assert_eq!(visited, 5);
    }

    #[test]
    fn test_ceiling() {
        let ceiling = Ceiling::default();
        assert_eq!(ceiling.admit(7, 92, 2), Some(4186));
        // Too many cases.
        assert_eq!(ceiling.admit(13, 4148, 4), None);
        // m * k reaches 64.
        assert_eq!(ceiling.admit(16, 100, 4), None);

        let tight = Ceiling { max_cases: 100 };
        assert_eq!(tight.admit(7, 92, 1), Some(92));
        assert_eq!(tight.admit(7, 92, 2), None);
    }

    #[test]
    fn test_bursts() {
        let bursts: Vec<_> = bursts(6, 3).collect();
        assert_eq!(bursts.len(), 4);
        assert_eq!(bursts[0], vec![0, 1, 2]);
        assert_eq!(bursts[3], vec![3, 4, 5]);
        assert_eq!(super::bursts(2, 3).count(), 0);
        assert_eq!(super::bursts(6, 0).count(), 0);
    }

    #[test]
    fn test_validate() {
        validate(&[], 10).unwrap();
        validate(&[9, 0, 4], 10).unwrap();
        assert!(matches!(validate(&[10], 10), Err(Error::Config(_))));
        assert!(matches!(validate(&[1, 5, 1], 10), Err(Error::Config(_))));
    }

    #[test]
    fn test_sampler_is_deterministic() {
        let mut a = Sampler::new(100, 42);
        let mut b = Sampler::new(100, 42);
        for k in 1..=8 {
            assert_eq!(a.sample(k), b.sample(k));
        }
        let mut c = Sampler::new(100, 43);
        let drawn: Vec<_> = (0..8).map(|_| a.sample(4)).collect();
        let other: Vec<_> = (0..8).map(|_| c.sample(4)).collect();
        assert_ne!(drawn, other);
    }

    #[test]
    fn test_sampler_distinct_in_range() {
        // Drawing every position forces collisions to be redrawn.
        let mut sampler = Sampler::new(16, 7);
        let vec = sampler.sample(16);
        assert_eq!(vec, (0..16).collect::<Vec<_>>());
        for _ in 0..100 {
            let k = sampler.size(5);
            assert!((1..=5).contains(&k));
            let vec = sampler.sample(k);
            assert!(vec.windows(2).all(|w| w[0] < w[1]));
            assert!(vec.iter().all(|p| *p < 16));
        }
    }
}
