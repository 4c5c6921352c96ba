//! Seeded, reproducible randomness.
//!
//! Every draw in the engine goes through a [`SimRng`]. Generators are PCG-64,
//! so the same seed and the same sequence of calls give bit-identical output
//! on every platform. [`RngService`] hands out call-local scoped generators
//! and guards one shared process-wide generator.

use parking_lot::{Mutex, MutexGuard};
use rand::{RngCore, SeedableRng};
use rand_distr::{Beta, Distribution};
use rand_pcg::Pcg64;

/// A deterministic random source with the sampling primitives the engine needs.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: Pcg64,
}

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Pcg64::seed_from_u64(seed),
        }
    }

    /// A generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            inner: Pcg64::from_os_rng(),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Float in [0, 1) built from the top 53 bits of one draw.
    pub fn uniform(&mut self) -> f64 {
        (self.inner.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Float in [lo, hi).
    pub fn uniform_in(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.uniform()
    }

    /// Unbiased integer in [0, n). Returns 0 when `n == 0`.
    pub fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        // Lemire's multiply-and-reject.
        let threshold = n.wrapping_neg() % n;
        loop {
            let m = (self.inner.next_u64() as u128) * (n as u128);
            if (m as u64) >= threshold {
                return (m >> 64) as u64;
            }
        }
    }

    /// Integer in the half-open range [lo, hi). Returns `lo` for an empty range.
    pub fn range(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        lo + self.below((hi - lo) as u64) as usize
    }

    /// Integer in the closed range [lo, hi].
    pub fn inclusive(&mut self, lo: usize, hi: usize) -> usize {
        self.range(lo, hi.saturating_add(1))
    }

    /// Bernoulli trial: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range(0, items.len());
        items.get(idx)
    }

    /// Index drawn by inversion over the normalized cumulative weights.
    ///
    /// Negative and non-finite weights count as zero. Returns `None` when no
    /// weight is positive.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut total = 0.0;
        for &w in weights {
            total += clean_weight(w);
            cumulative.push(total);
        }
        if total <= 0.0 {
            return None;
        }
        let target = self.uniform() * total;
        let idx = cumulative.partition_point(|&c| c <= target);
        // Guard against rounding at the top end landing past a trailing zero weight.
        Some(last_positive_at_or_before(weights, idx.min(weights.len() - 1)))
    }

    /// `k` distinct indices drawn by weight, renormalizing after each pick.
    ///
    /// Falls back to uniform over the remaining indices once no positive
    /// weight is left. Returns `min(k, weights.len())` indices.
    pub fn sample_weighted_without_replacement(&mut self, weights: &[f64], k: usize) -> Vec<usize> {
        let mut remaining: Vec<f64> = weights.iter().copied().map(clean_weight).collect();
        let mut taken = vec![false; weights.len()];
        let mut picked = Vec::with_capacity(k.min(weights.len()));

        while picked.len() < k.min(weights.len()) {
            let idx = match self.weighted_index(&remaining) {
                Some(idx) => idx,
                None => {
                    let open: Vec<usize> = (0..taken.len()).filter(|&i| !taken[i]).collect();
                    match self.choose(&open) {
                        Some(&idx) => idx,
                        None => break,
                    }
                }
            };
            taken[idx] = true;
            remaining[idx] = 0.0;
            picked.push(idx);
        }
        picked
    }

    /// `k` distinct indices out of `0..n`, uniformly (partial Fisher-Yates).
    pub fn sample_without_replacement(&mut self, n: usize, k: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..n).collect();
        let k = k.min(n);
        for i in 0..k {
            let j = self.range(i, n);
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range(0, i + 1);
            items.swap(i, j);
        }
    }

    /// Beta(a, b) sample. Returns the distribution mean for invalid shapes.
    pub fn beta(&mut self, a: f64, b: f64) -> f64 {
        match Beta::new(a, b) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => a / (a + b),
        }
    }

    /// Exponential sample with the given mean, by inversion.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        let u = self.uniform();
        -mean * (1.0 - u).ln()
    }

    /// Sixteen raw bytes, e.g. for deterministic UUIDs.
    pub fn random_bytes(&mut self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.inner.fill_bytes(&mut bytes);
        bytes
    }
}

fn clean_weight(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 { w } else { 0.0 }
}

fn last_positive_at_or_before(weights: &[f64], idx: usize) -> usize {
    (0..=idx)
        .rev()
        .find(|&i| clean_weight(weights[i]) > 0.0)
        .unwrap_or(idx)
}

/// Process-wide seed management.
///
/// The shared generator is only reached through [`RngService::global`];
/// everything on the generation path uses [`RngService::scoped`] instead.
#[derive(Debug)]
pub struct RngService {
    global: Mutex<SimRng>,
    global_seed: Mutex<Option<u64>>,
}

impl RngService {
    /// Seeded service when `seed` is given, OS-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SimRng::seeded(seed),
            None => SimRng::from_entropy(),
        };
        Self {
            global: Mutex::new(rng),
            global_seed: Mutex::new(seed),
        }
    }

    /// Replace the shared generator with one seeded from `seed`.
    pub fn reseed(&self, seed: u64) {
        let mut global = self.global.lock();
        *global = SimRng::seeded(seed);
        *self.global_seed.lock() = Some(seed);
        tracing::info!(seed, "rng reseeded");
    }

    /// An independent generator. Never touches the shared one.
    pub fn scoped(&self, seed: u64) -> SimRng {
        SimRng::seeded(seed)
    }

    /// Exclusive access to the shared generator. Not reentrant.
    pub fn global(&self) -> MutexGuard<'_, SimRng> {
        self.global.lock()
    }

    pub fn global_seed(&self) -> Option<u64> {
        *self.global_seed.lock()
    }
}

impl Default for RngService {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SimRng::seeded(42);
        let mut b = SimRng::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        assert_eq!(a.beta(2.0, 5.0).to_bits(), b.beta(2.0, 5.0).to_bits());
        assert_eq!(a.exponential(10.0).to_bits(), b.exponential(10.0).to_bits());
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SimRng::seeded(1);
        let mut b = SimRng::seeded(2);
        let xs: Vec<u64> = (0..8).map(|_| a.next_u64()).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.next_u64()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_uniform_in_unit_interval() {
        let mut rng = SimRng::seeded(7);
        for _ in 0..10_000 {
            let u = rng.uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = SimRng::seeded(7);
        for _ in 0..1000 {
            let v = rng.range(3, 6);
            assert!((3..6).contains(&v));
            let w = rng.inclusive(1, 2);
            assert!(w == 1 || w == 2);
        }
        assert_eq!(rng.range(5, 5), 5);
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut rng = SimRng::seeded(3);
        for _ in 0..1000 {
            let idx = rng.weighted_index(&[0.0, 1.0, 0.0, 2.0, 0.0]).unwrap();
            assert!(idx == 1 || idx == 3);
        }
    }

    #[test]
    fn test_weighted_index_none_when_all_zero() {
        let mut rng = SimRng::seeded(3);
        assert_eq!(rng.weighted_index(&[0.0, 0.0]), None);
        assert_eq!(rng.weighted_index(&[f64::NAN, -1.0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
    }

    #[test]
    fn test_weighted_index_follows_weights() {
        let mut rng = SimRng::seeded(11);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[rng.weighted_index(&[1.0, 3.0]).unwrap()] += 1;
        }
        let ratio = counts[1] as f64 / 10_000.0;
        assert!((ratio - 0.75).abs() < 0.03, "ratio {ratio}");
    }

    #[test]
    fn test_weighted_without_replacement_distinct() {
        let mut rng = SimRng::seeded(5);
        let picked = rng.sample_weighted_without_replacement(&[0.5, 0.0, 0.2, 0.0], 4);
        assert_eq!(picked.len(), 4);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
        // Positive weights are exhausted before the uniform fallback.
        let mut head = picked[..2].to_vec();
        head.sort_unstable();
        assert_eq!(head, vec![0, 2]);
    }

    #[test]
    fn test_uniform_without_replacement() {
        let mut rng = SimRng::seeded(5);
        let picked = rng.sample_without_replacement(10, 4);
        assert_eq!(picked.len(), 4);
        assert!(picked.iter().all(|&i| i < 10));
        assert_eq!(rng.sample_without_replacement(2, 5).len(), 2);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = SimRng::seeded(9);
        let mut items: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_beta_and_exponential_ranges() {
        let mut rng = SimRng::seeded(13);
        for _ in 0..1000 {
            let b = rng.beta(2.0, 10.0);
            assert!((0.0..=1.0).contains(&b));
            assert!(rng.exponential(50.0) >= 0.0);
        }
    }

    #[test]
    fn test_reseed_is_reproducible() {
        let service = RngService::new(None);
        service.reseed(99);
        let first = service.global().next_u64();
        service.reseed(99);
        let second = service.global().next_u64();
        assert_eq!(first, second);
        assert_eq!(service.global_seed(), Some(99));
    }

    #[test]
    fn test_scoped_leaves_global_alone() {
        let service = RngService::new(Some(1));
        let mut expected = SimRng::seeded(1);
        let mut scoped = service.scoped(1);
        scoped.next_u64();
        scoped.next_u64();
        assert_eq!(service.global().next_u64(), expected.next_u64());
    }
}
