//! Run-level simulation configuration.

use crate::{CoreError, CoreResult};

/// Top-level simulation configuration.
///
/// Built by the application (CLI flags, test fixtures) and handed to the
/// simulation driver at construction.  Nothing here is process-global; a new
/// run gets a new `SimConfig`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Upper bound on controller steps.  The run may stop earlier when every
    /// agent is terminal or the global stall detector fires.
    pub max_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical traffic.
    pub seed: u64,

    /// Consecutive ticks with every agent position unchanged before the
    /// driver declares a global stall.
    pub stuck_limit: u32,

    /// A-B-A oscillations in a row before an agent is declared incapable.
    pub ping_limit: u32,
}

impl SimConfig {
    /// # Errors
    ///
    /// [`CoreError::Config`] if `stuck_limit` or `ping_limit` is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.stuck_limit == 0 {
            return Err(CoreError::Config("stuck_limit must be at least 1".into()));
        }
        if self.ping_limit == 0 {
            return Err(CoreError::Config("ping_limit must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_ticks:   100,
            seed:        42,
            stuck_limit: 10,
            ping_limit:  4,
        }
    }
}
