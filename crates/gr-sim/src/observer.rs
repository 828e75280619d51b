//! Hooks into the tick loop.

use gr_agent::{AgentEvent, DeliveryAgent};
use gr_core::Tick;
use gr_traffic::TickReport;

use crate::SimSummary;

/// Receives progress from [`Sim::run`][crate::Sim::run] and
/// [`Sim::run_ticks`][crate::Sim::run_ticks].
///
/// Every hook defaults to doing nothing.
///
/// ```rust,ignore
/// struct ArrivalLog;
///
/// impl SimObserver for ArrivalLog {
///     fn on_agent_event(&mut self, event: &AgentEvent) {
///         if let AgentEvent::Arrived { agent, tick, .. } = event {
///             println!("{agent} arrived at {tick}");
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Before the controller steps.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Once per event of the tick, in the order the agents emitted them.
    /// Incapacity forced by the stall detector comes last.
    fn on_agent_event(&mut self, _event: &AgentEvent) {}

    /// After all of the tick's events were delivered.
    fn on_tick_end(&mut self, _report: &TickReport<AgentEvent>) {}

    /// Once, when [`Sim::run`][crate::Sim::run] returns.
    fn on_sim_end(&mut self, _summary: &SimSummary, _agents: &[DeliveryAgent]) {}
}

/// Ignores everything.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
