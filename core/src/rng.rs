//! Deterministic random number generation for the reference engine.
//!
//! RULE: No transformation step may call any platform RNG.
//! All randomness flows through StepRng instances derived from the
//! run's `random_seed`.
//!
//! Each step gets its own stream per simulation year, seeded from
//! (seed, step slot, year). This means:
//!   - Re-running a single year reproduces that year exactly.
//!   - Adding a new step never changes existing steps' streams.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::types::SimYear;

/// A named, deterministic RNG for a single step in a single year.
pub struct StepRng {
    pub name: &'static str,
    inner:    Pcg64Mcg,
}

impl StepRng {
    pub fn new(seed: u64, slot_index: u64, year: SimYear) -> Self {
        let derived_seed = seed
            ^ slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ (year as u64).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        Self {
            name:  "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick `k` distinct indices from `0..n` (partial Fisher-Yates).
    /// Returned indices are sorted so callers iterate in input order.
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        let k = k.min(n);
        let mut pool: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = i + self.next_u64_below((n - i) as u64) as usize;
            pool.swap(i, j);
        }
        let mut picked = pool[..k].to_vec();
        picked.sort_unstable();
        picked
    }
}

/// All step RNGs for a single run.
pub struct RngBank {
    seed: u64,
}

impl RngBank {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn for_step(&self, slot: StepSlot, year: SimYear) -> StepRng {
        StepRng::new(self.seed, slot as u64, year).with_name(slot.name())
    }
}

/// Stable step slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every step's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StepSlot {
    Baseline            = 0,
    Termination         = 1,
    Promotion           = 2,
    Merit               = 3,
    Hiring              = 4,
    NewHireTermination  = 5,
}

impl StepSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Baseline           => "baseline",
            Self::Termination        => "termination",
            Self::Promotion          => "promotion",
            Self::Merit              => "merit",
            Self::Hiring             => "hiring",
            Self::NewHireTermination => "new_hire_termination",
        }
    }
}
