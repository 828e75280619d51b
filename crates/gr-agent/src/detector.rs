//! A-B-A oscillation detection.

use std::collections::VecDeque;

use gr_core::NodeId;

const WINDOW: usize = 4;

/// Watches the last few positions of one agent for back-and-forth moves.
///
/// Each observation where the newest position equals the one two steps back
/// while the middle one differs (A-B-A) adds a ping; any other pattern
/// resets the count.  The detector trips when the count reaches `limit`.
#[derive(Clone, Debug)]
pub struct LoopDetector {
    recent: VecDeque<NodeId>,
    pings:  u32,
    limit:  u32,
}

impl LoopDetector {
    pub fn new(limit: u32) -> Self {
        Self { recent: VecDeque::with_capacity(WINDOW + 1), pings: 0, limit }
    }

    /// Record the position after a tick.  Returns `true` if the ping limit is
    /// reached.
    pub fn observe(&mut self, position: NodeId) -> bool {
        self.recent.push_back(position);
        let n = self.recent.len();
        if n >= 3 {
            let (a, b, c) = (self.recent[n - 3], self.recent[n - 2], self.recent[n - 1]);
            if c == a && b != c {
                self.pings += 1;
            } else {
                self.pings = 0;
            }
        }
        if self.recent.len() > WINDOW {
            self.recent.pop_front();
        }
        self.pings >= self.limit
    }

    pub fn pings(&self) -> u32 {
        self.pings
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
