//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `positions`, `tick_summaries` and `agent_metrics`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{AgentMetricsRow, OutputResult, PositionRow, TickSummaryRow};

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous  = NORMAL;
    CREATE TABLE IF NOT EXISTS positions (
        agent_id INTEGER NOT NULL,
        tick     INTEGER NOT NULL,
        row      INTEGER NOT NULL,
        col      INTEGER NOT NULL,
        moved    INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS tick_summaries (
        tick         INTEGER PRIMARY KEY,
        obstructions INTEGER NOT NULL,
        spawned      INTEGER NOT NULL,
        expired      INTEGER NOT NULL,
        moves        INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS agent_metrics (
        agent_id            INTEGER PRIMARY KEY,
        name                TEXT    NOT NULL,
        pilot               TEXT    NOT NULL,
        status              TEXT    NOT NULL,
        final_tick          INTEGER,
        initial_plan_time_s REAL    NOT NULL,
        total_plan_time_s   REAL    NOT NULL,
        replan_count        INTEGER NOT NULL,
        planned_path_len    INTEGER NOT NULL,
        actual_steps        INTEGER NOT NULL
    );
";

pub const DATABASE_FILE: &str = "output.db";

/// One SQLite database per run; batches are written in a transaction each.
pub struct SqliteWriter {
    conn: Connection,
    done: bool,
}

impl SqliteWriter {
    /// Create `dir` if needed and open `output.db` in it with the schema in
    /// place.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(DATABASE_FILE))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, done: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_positions(&mut self, rows: &[PositionRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO positions (agent_id, tick, row, col, moved) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.agent_id,
                    row.tick as i64,
                    row.row,
                    row.col,
                    row.moved as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries (tick, obstructions, spawned, expired, moves) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                row.tick as i64,
                row.obstructions as i64,
                row.spawned as i64,
                row.expired as i64,
                row.moves as i64,
            ],
        )?;
        Ok(())
    }

    fn write_agent_metrics(&mut self, rows: &[AgentMetricsRow]) -> OutputResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO agent_metrics \
                 (agent_id, name, pilot, status, final_tick, initial_plan_time_s, \
                  total_plan_time_s, replan_count, planned_path_len, actual_steps) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.agent_id,
                    row.name,
                    row.pilot,
                    row.status,
                    row.final_tick.map(|t| t as i64),
                    row.initial_plan_time_s,
                    row.total_plan_time_s,
                    row.replan_count,
                    row.planned_path_len as i64,
                    row.actual_steps as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.done {
            self.done = true;
            self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        }
        Ok(())
    }
}
