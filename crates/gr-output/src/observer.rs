//! Adapter from the tick loop's observer hooks to an [`OutputWriter`].

use gr_agent::{AgentEvent, DeliveryAgent};
use gr_sim::{SimObserver, SimSummary};
use gr_traffic::TickReport;
use tracing::warn;

use crate::row::{AgentMetricsRow, PositionRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Writes each tick's positions and summary, then the final agent metrics.
///
/// Observer hooks cannot fail, so the first write error is parked and later
/// writes are still attempted.  Call [`take_error`](Self::take_error) once
/// the run returns.
pub struct SimOutputObserver<W: OutputWriter> {
    writer: W,
    error:  Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, error: None }
    }

    /// The first write error of the run, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.error.take()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn record(&mut self, result: OutputResult<()>) {
        match result {
            Err(e) if self.error.is_none() => {
                warn!(error = %e, "output write failed");
                self.error = Some(e);
            }
            _ => {}
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, report: &TickReport<AgentEvent>) {
        let positions: Vec<PositionRow> = report.events.iter().filter_map(PositionRow::from_event).collect();
        if !positions.is_empty() {
            let result = self.writer.write_positions(&positions);
            self.record(result);
        }
        let result = self.writer.write_tick_summary(&TickSummaryRow::from_report(report));
        self.record(result);
    }

    fn on_sim_end(&mut self, _summary: &SimSummary, agents: &[DeliveryAgent]) {
        let metrics: Vec<AgentMetricsRow> = agents.iter().map(AgentMetricsRow::from_agent).collect();
        let result = self.writer.write_agent_metrics(&metrics);
        self.record(result);
        let result = self.writer.finish();
        self.record(result);
    }
}
