//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `positions.csv`
//! - `tick_summaries.csv`
//! - `agent_metrics.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;
use tracing::debug;

use crate::writer::OutputWriter;
use crate::{AgentMetricsRow, OutputResult, PositionRow, TickSummaryRow};

pub const POSITIONS_FILE: &str = "positions.csv";
pub const TICK_SUMMARIES_FILE: &str = "tick_summaries.csv";
pub const AGENT_METRICS_FILE: &str = "agent_metrics.csv";

/// Writes run output to three CSV files.
pub struct CsvWriter {
    positions: Writer<File>,
    summaries: Writer<File>,
    metrics:   Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the three CSV files and write their
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut positions = Writer::from_path(dir.join(POSITIONS_FILE))?;
        positions.write_record(["agent_id", "tick", "row", "col", "moved"])?;

        let mut summaries = Writer::from_path(dir.join(TICK_SUMMARIES_FILE))?;
        summaries.write_record(["tick", "obstructions", "spawned", "expired", "moves"])?;

        let mut metrics = Writer::from_path(dir.join(AGENT_METRICS_FILE))?;
        metrics.write_record([
            "agent_id",
            "name",
            "pilot",
            "status",
            "final_tick",
            "initial_plan_time_s",
            "total_plan_time_s",
            "replan_count",
            "planned_path_len",
            "actual_steps",
        ])?;

        debug!(dir = %dir.display(), "csv output opened");
        Ok(Self { positions, summaries, metrics, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_positions(&mut self, rows: &[PositionRow]) -> OutputResult<()> {
        for row in rows {
            self.positions.write_record(&[
                row.agent_id.to_string(),
                row.tick.to_string(),
                row.row.to_string(),
                row.col.to_string(),
                (row.moved as u8).to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.obstructions.to_string(),
            row.spawned.to_string(),
            row.expired.to_string(),
            row.moves.to_string(),
        ])?;
        Ok(())
    }

    fn write_agent_metrics(&mut self, rows: &[AgentMetricsRow]) -> OutputResult<()> {
        for row in rows {
            self.metrics.write_record(&[
                row.agent_id.to_string(),
                row.name.clone(),
                row.pilot.clone(),
                row.status.clone(),
                row.final_tick.map(|t| t.to_string()).unwrap_or_default(),
                format!("{:.6}", row.initial_plan_time_s),
                format!("{:.6}", row.total_plan_time_s),
                row.replan_count.to_string(),
                row.planned_path_len.to_string(),
                row.actual_steps.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.positions.flush()?;
        self.summaries.flush()?;
        self.metrics.flush()?;
        Ok(())
    }
}
