//! A seeded stand-in for a chat-model oracle.

use std::sync::Mutex;
use std::time::Duration;

use gr_agent::{Oracle, OracleError, OracleState};
use gr_core::SimRng;

/// Mixed into the run seed for the oracle RNG root.
pub const SEED_SALT: u64 = 0x6f72_6163_6c65;

/// Answers like a well-meaning but unreliable model.
///
/// With probability `reliability` it names the free neighbor closest to the
/// goal (ties broken at random).  Otherwise it misbehaves in one of four
/// ways: prose with no coordinates, a jump straight to the goal, a
/// transport error, or a permanently blocked cell.
pub struct NoisyOracle {
    rng:         Mutex<SimRng>,
    reliability: f64,
    latency:     Duration,
}

impl NoisyOracle {
    pub fn new(rng: SimRng, reliability: f64, latency: Duration) -> Self {
        Self { rng: Mutex::new(rng), reliability, latency }
    }
}

impl Oracle for NoisyOracle {
    fn propose(&self, state: &OracleState) -> Result<String, OracleError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        let mut rng = self.rng.lock().map_err(|_| OracleError::Unavailable)?;

        if !rng.gen_bool(self.reliability) {
            return match rng.gen_range(0..4u8) {
                0 => Ok("I would head towards the destination.".to_owned()),
                1 => Ok(format!("({}, {})", state.goal.row, state.goal.col)),
                2 => Err(OracleError::Transport("connection reset by peer".to_owned())),
                _ => match rng.choose(&state.permanent_blocks) {
                    Some(cell) => Ok(format!("Move to ({}, {}).", cell.row, cell.col)),
                    None => Ok("Stay where you are.".to_owned()),
                },
            };
        }

        let best = state
            .free_neighbors
            .iter()
            .map(|c| c.manhattan(state.goal))
            .min();
        let candidates: Vec<_> = state
            .free_neighbors
            .iter()
            .filter(|c| Some(c.manhattan(state.goal)) == best)
            .collect();
        match rng.choose(&candidates) {
            Some(cell) => Ok(format!("Move to ({}, {}).", cell.row, cell.col)),
            None => Ok("Every neighbor is blocked.".to_owned()),
        }
    }
}
