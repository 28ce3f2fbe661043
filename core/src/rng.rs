//! Deterministic random number generation.
//!
//! RULE: Nothing in the scorer may call any platform RNG.
//! All randomness flows through TreeRng instances derived
//! from the single master seed in the forest config.
//!
//! Each tree gets its own stream, seeded from
//! (master_seed XOR mixed tree_index). Growing the ensemble
//! therefore never changes the streams of existing trees.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG for a single isolation tree.
pub struct TreeRng {
    pub tree_index: u64,
    inner: Pcg64Mcg,
}

impl TreeRng {
    /// Create a tree RNG from the master seed and the tree's position
    /// in the ensemble.
    pub fn new(master_seed: u64, tree_index: u64) -> Self {
        let derived_seed = master_seed ^ (tree_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            tree_index,
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a usize in [0, n).
    pub fn next_below(&mut self, n: usize) -> usize {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        (self.inner.next_u64() % n as u64) as usize
    }

    /// Uniform draw in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Draw `k` distinct indices from `0..n` (partial Fisher-Yates).
    /// The result is in draw order.
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        let k = k.min(n);
        let mut pool: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = i + self.next_below(n - i);
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }
}

/// All tree RNGs for a single fit.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_tree(&self, tree_index: usize) -> TreeRng {
        TreeRng::new(self.master_seed, tree_index as u64)
    }
}
