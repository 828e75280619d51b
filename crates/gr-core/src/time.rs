//! Simulation time.
//!
//! One tick is one controller step: traffic decays and spawns, the snapshot
//! is broadcast, and every agent advances at most one cell.  Tick 1 is the
//! first step; `Tick::ZERO` is "before the run".

use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }

    /// Ticks elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}
