//! Plain data row types written by output backends.

use gr_agent::{AgentEvent, DeliveryAgent};
use gr_traffic::TickReport;

/// Where one agent stood at the end of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRow {
    pub agent_id: u32,
    pub tick:     u64,
    pub row:      i32,
    pub col:      i32,
    /// `true` if the agent changed cell this tick.
    pub moved:    bool,
}

impl PositionRow {
    /// The row for a movement event; `None` for events that carry no new
    /// position (arrival and incapacity repeat the cell of the same tick's
    /// move or hold).
    pub fn from_event(event: &AgentEvent) -> Option<Self> {
        let moved = match event {
            AgentEvent::Moved { .. } => true,
            AgentEvent::Held { .. } => false,
            AgentEvent::Arrived { .. } | AgentEvent::Incapacitated { .. } => return None,
        };
        let at = event.position();
        Some(Self {
            agent_id: event.agent().0,
            tick:     event.tick().0,
            row:      at.row,
            col:      at.col,
            moved,
        })
    }
}

/// Traffic and movement totals for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummaryRow {
    pub tick:         u64,
    pub obstructions: u64,
    pub spawned:      u64,
    pub expired:      u64,
    pub moves:        u64,
}

impl TickSummaryRow {
    pub fn from_report(report: &TickReport<AgentEvent>) -> Self {
        let moves = report
            .events
            .iter()
            .filter(|e| matches!(e, AgentEvent::Moved { .. }))
            .count();
        Self {
            tick:         report.tick.0,
            obstructions: report.obstructions as u64,
            spawned:      report.spawned.len() as u64,
            expired:      report.expired.len() as u64,
            moves:        moves as u64,
        }
    }
}

/// End-of-run metrics for one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMetricsRow {
    pub agent_id:            u32,
    pub name:                String,
    pub pilot:               String,
    pub status:              String,
    /// Tick of arrival or incapacity; `None` while still running.
    pub final_tick:          Option<u64>,
    pub initial_plan_time_s: f64,
    pub total_plan_time_s:   f64,
    pub replan_count:        u32,
    pub planned_path_len:    usize,
    pub actual_steps:        usize,
}

impl AgentMetricsRow {
    pub fn from_agent(agent: &DeliveryAgent) -> Self {
        let metrics = agent.metrics();
        Self {
            agent_id:            agent.id().0,
            name:                agent.name().to_owned(),
            pilot:               agent.pilot_label(),
            status:              agent.status().to_string(),
            final_tick:          agent.status().finish_tick().map(|t| t.0),
            initial_plan_time_s: metrics.initial_plan_time.unwrap_or_default().as_secs_f64(),
            total_plan_time_s:   metrics.total_plan_time.as_secs_f64(),
            replan_count:        metrics.replan_count(),
            planned_path_len:    metrics.planned_path_length,
            actual_steps:        metrics.steps,
        }
    }
}
