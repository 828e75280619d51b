//! The `OutputWriter` trait implemented by all backend writers.

use crate::{AgentMetricsRow, OutputResult, PositionRow, TickSummaryRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors are not surfaced to the simulation; [`SimOutputObserver`]
/// stores the first one for [`take_error`].
///
/// [`SimOutputObserver`]: crate::SimOutputObserver
/// [`take_error`]: crate::SimOutputObserver::take_error
pub trait OutputWriter {
    /// Write one tick's worth of agent positions.
    fn write_positions(&mut self, rows: &[PositionRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Write the end-of-run metrics, one row per agent.
    fn write_agent_metrics(&mut self, rows: &[AgentMetricsRow]) -> OutputResult<()>;

    /// Flush and close all underlying handles.  Safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
