//! Per-agent planning and movement counters.

use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentMetrics {
    /// Searches run, including the first.
    pub plans: u32,
    /// Wall time of the first search.
    pub initial_plan_time: Option<Duration>,
    /// Wall time of every search.
    pub total_plan_time: Duration,
    /// Moves in the first plan (zero if it found no route).
    pub planned_path_length: usize,
    /// Moves actually made.
    pub steps: usize,
}

impl AgentMetrics {
    /// Record one search and, for the first, its length in moves.
    pub fn record_plan(&mut self, elapsed: Duration, route_steps: usize) {
        self.plans += 1;
        self.total_plan_time += elapsed;
        if self.initial_plan_time.is_none() {
            self.initial_plan_time = Some(elapsed);
            self.planned_path_length = route_steps;
        }
    }

    /// Searches after the first.
    pub fn replan_count(&self) -> u32 {
        self.plans.saturating_sub(1)
    }
}
