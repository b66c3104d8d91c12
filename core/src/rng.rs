//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call a platform RNG. All model
//! randomness flows through ModelRng streams derived from the single
//! master seed in the config.
//!
//! Each component gets its own stream, seeded deterministically from
//! (master_seed XOR component_slot). This means:
//!   - Adding a new component never perturbs existing streams.
//!   - Bootstrap data, tree sampling, and synthetic profiles are fully
//!     reproducible per seed, which is what makes re-evaluation of the
//!     same transaction idempotent.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// Stable stream identifiers. Slot values must never change once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentSlot {
    BootstrapData = 1,
    OutlierForest = 2,
    FraudClassifier = 3,
    CreditModel = 4,
    FraudRiskModel = 5,
    Runner = 6,
}

/// A named, deterministic RNG stream for one engine component.
pub struct ModelRng {
    inner: Pcg64Mcg,
}

impl ModelRng {
    pub fn for_component(master_seed: u64, slot: ComponentSlot) -> Self {
        let derived = master_seed ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Roll a usize in [0, n).
    pub fn next_below(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        (self.next_u64() % n as u64) as usize
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform draw in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Standard-normal draw via Box-Muller.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + std_dev * z
    }

    /// Lognormal draw: exp(N(mu, sigma)).
    pub fn lognormal(&mut self, mu: f64, sigma: f64) -> f64 {
        self.normal(mu, sigma).exp()
    }

    /// Pick one element of a non-empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_below(items.len())]
    }
}
