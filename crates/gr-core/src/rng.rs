//! Seeded randomness.
//!
//! The traffic controller is the only consumer of randomness in the core, so
//! one `SmallRng` seeded from `SimConfig::seed` makes a run reproducible.
//! Demo oracles derive their own streams through [`SimRng::child`] so they
//! never perturb traffic draws.

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Golden-ratio increment used to spread child stream ids.
const STREAM_SPREAD: u64 = 0x9e37_79b9_7f4a_7c15;

pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// An independent generator for `stream`.  Advances `self` by one draw.
    pub fn child(&mut self, stream: u64) -> SimRng {
        let base: u64 = self.0.r#gen();
        SimRng::new(base ^ stream.wrapping_mul(STREAM_SPREAD))
    }

    #[inline]
    pub fn gen_range<T: SampleUniform, R: SampleRange<T>>(&mut self, range: R) -> T {
        self.0.gen_range(range)
    }

    /// `true` with probability `p`; `p` outside [0, 1] is clamped.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform pick from `items`; `None` if empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.0)
    }
}
