//! Oracle-driven pilot with reference-route fallback.
//!
//! An [`Oracle`] is an external move source that answers in free text, for
//! example a chat model.  Its answers are never trusted: [`OraclePilot`]
//! parses the first two integers as `(row, col)` and accepts the move only
//! if it is a free road neighbor.  Anything else, including transport errors
//! and timeouts, makes the agent take one step along a precomputed reference
//! route instead.  Every call is bounded by a deadline
//! ([`DEFAULT_ORACLE_DEADLINE`] unless set with [`OraclePilot::deadline`]).

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError};
use tracing::{debug, warn};

use gr_core::{AgentId, Cell, NodeId};
use gr_spatial::Strategy;

use crate::pilot::{Navigation, Pilot, StepDecision};
use crate::{AgentMetrics, HoldReason, OracleError};

// ── Oracle ────────────────────────────────────────────────────────────────────

/// Everything an oracle is told about the agent's situation.
#[derive(Clone, Debug, PartialEq)]
pub struct OracleState {
    pub agent:            AgentId,
    pub rows:             u32,
    pub cols:             u32,
    pub position:         Cell,
    pub goal:             Cell,
    /// Road neighbors that are neither blocked nor obstructed, N/S/W/E order.
    pub free_neighbors:   Vec<Cell>,
    pub permanent_blocks: Vec<Cell>,
    pub obstructions:     Vec<Cell>,
    /// Most recent blocked cell the agent bumped into, if any.
    pub last_block:       Option<Cell>,
}

/// External move-suggestion source.
pub trait Oracle: Send + Sync {
    /// Propose the next cell as free text.
    fn propose(&self, state: &OracleState) -> Result<String, OracleError>;
}

impl<F> Oracle for F
where
    F: Fn(&OracleState) -> Result<String, OracleError> + Send + Sync,
{
    fn propose(&self, state: &OracleState) -> Result<String, OracleError> {
        self(state)
    }
}

/// First two unsigned integers in `answer`, as `(row, col)`.
///
/// Accepts `"(14,3)"`, `"14_3"`, `"row 14 col 3"`, `{"row":14,"col":3}` and
/// so on.  `None` if fewer than two integers are present or one overflows.
pub fn parse_move(answer: &str) -> Option<Cell> {
    let mut numbers = answer
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(str::parse::<i32>);
    let row = numbers.next()?.ok()?;
    let col = numbers.next()?.ok()?;
    Some(Cell::new(row, col))
}

// ── TimeoutOracle ─────────────────────────────────────────────────────────────

/// Deadline an [`OraclePilot`] gives each call unless told otherwise.
pub const DEFAULT_ORACLE_DEADLINE: Duration = Duration::from_secs(10);

/// Bounds every call to `inner` by `deadline`.
///
/// The call runs on a detached worker thread; a call that never returns only
/// leaks that thread.
pub struct TimeoutOracle<O> {
    inner:    Arc<O>,
    deadline: Duration,
}

impl<O: Oracle + 'static> TimeoutOracle<O> {
    pub fn new(inner: O, deadline: Duration) -> Self {
        Self { inner: Arc::new(inner), deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl<O: Oracle + 'static> Oracle for TimeoutOracle<O> {
    fn propose(&self, state: &OracleState) -> Result<String, OracleError> {
        let (tx, rx) = channel::bounded(1);
        let inner = Arc::clone(&self.inner);
        let state = state.clone();
        std::thread::Builder::new()
            .name(format!("oracle-{}", state.agent.0))
            .spawn(move || {
                // The receiver may have given up already.
                let _ = tx.send(inner.propose(&state));
            })
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        match rx.recv_timeout(self.deadline) {
            Ok(answer)                           => answer,
            Err(RecvTimeoutError::Timeout)       => Err(OracleError::Timeout(self.deadline)),
            Err(RecvTimeoutError::Disconnected)  => Err(OracleError::Unavailable),
        }
    }
}

// ── PromptOracle ──────────────────────────────────────────────────────────────

/// A free-text model: prompt in, answer out.
pub trait TextModel: Send + Sync {
    fn ask(&self, prompt: &str) -> Result<String, OracleError>;
}

impl<F> TextModel for F
where
    F: Fn(&str) -> Result<String, OracleError> + Send + Sync,
{
    fn ask(&self, prompt: &str) -> Result<String, OracleError> {
        self(prompt)
    }
}

/// Oracle that renders the agent's state as a natural-language prompt and
/// forwards it to a [`TextModel`].
pub struct PromptOracle<M> {
    model: M,
}

impl<M: TextModel> PromptOracle<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// The prompt sent for `state`.
    pub fn render(state: &OracleState) -> String {
        let mut p = String::new();
        let _ = writeln!(p, "You are steering delivery agent {} on a {}x{} grid.", state.agent.0, state.rows, state.cols);
        let _ = writeln!(p, "Current position: {}.  Final goal: {}.", coord(state.position), coord(state.goal));
        let _ = writeln!(p, "Permanently blocked cells: {}.", coord_list(&state.permanent_blocks));
        if !state.obstructions.is_empty() {
            let _ = writeln!(p, "Cells with traffic right now: {}.", coord_list(&state.obstructions));
        }
        if let Some(cell) = state.last_block {
            let _ = writeln!(p, "Warning: cell {} is blocked. Choose one of the FREE adjacent cells listed below.", coord(cell));
        }
        let _ = writeln!(p, "Free adjacent cells: {}.", coord_list(&state.free_neighbors));
        p.push_str("Answer only with the next cell (row,col) to move the agent to.");
        p
    }
}

impl<M: TextModel> Oracle for PromptOracle<M> {
    fn propose(&self, state: &OracleState) -> Result<String, OracleError> {
        self.model.ask(&Self::render(state))
    }
}

fn coord(c: Cell) -> String {
    format!("({}, {})", c.row, c.col)
}

fn coord_list(cells: &[Cell]) -> String {
    let inner: Vec<String> = cells.iter().map(|&c| coord(c)).collect();
    format!("[{}]", inner.join(", "))
}

// ── OraclePilot ───────────────────────────────────────────────────────────────

enum Reference {
    /// Plan the reference route with this strategy on the first update.
    Planned(Strategy),
    Fixed,
}

/// Pilot that asks an [`Oracle`] for every move and falls back to a
/// reference route when the answer is unusable.
///
/// Validation of a parsed proposal:
///
/// - permanently blocked: hold, and mention the cell in the next prompt;
/// - a free road neighbor: move there;
/// - anything else: fallback.
///
/// Fallback advances along the reference route past permanently blocked
/// nodes and the current position, then jumps to the next remaining node.
/// With no node left the agent holds.
///
/// The oracle runs behind a [`TimeoutOracle`], so a call that hangs costs
/// one deadline and then counts as a failed answer.
pub struct OraclePilot<O> {
    oracle:     TimeoutOracle<O>,
    source:     Reference,
    reference:  Vec<NodeId>,
    cursor:     usize,
    last_block: Option<Cell>,
}

impl<O: Oracle + 'static> OraclePilot<O> {
    /// Reference route planned with `strategy` from the start position,
    /// under the traffic at construction time.
    pub fn new(oracle: O, strategy: Strategy) -> Self {
        Self::with_source(oracle, Reference::Planned(strategy), Vec::new())
    }

    /// Use `reference` (starting at the agent's start node) as the fallback.
    pub fn with_reference(oracle: O, reference: Vec<NodeId>) -> Self {
        Self::with_source(oracle, Reference::Fixed, reference)
    }

    fn with_source(oracle: O, source: Reference, reference: Vec<NodeId>) -> Self {
        Self {
            oracle: TimeoutOracle::new(oracle, DEFAULT_ORACLE_DEADLINE),
            source,
            reference,
            cursor: 0,
            last_block: None,
        }
    }

    /// Longest wait for a single answer.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.oracle.deadline = deadline;
        self
    }

    pub fn oracle_deadline(&self) -> Duration {
        self.oracle.deadline()
    }

    pub fn reference(&self) -> &[NodeId] {
        &self.reference
    }

    pub fn last_block(&self) -> Option<Cell> {
        self.last_block
    }

    fn state(&self, nav: &Navigation<'_>) -> OracleState {
        let position = nav.cell(nav.position);
        let free_neighbors = position
            .neighbors4()
            .into_iter()
            .filter(|&c| nav.graph.node_at(c).is_some_and(|n| nav.is_free(n)))
            .collect();
        OracleState {
            agent: nav.agent,
            rows: nav.graph.rows(),
            cols: nav.graph.cols(),
            position,
            goal: nav.cell(nav.goal),
            free_neighbors,
            permanent_blocks: nav.blocks.sorted(),
            obstructions: nav.traffic.cells(),
            last_block: self.last_block,
        }
    }

    fn fallback(&mut self, nav: &Navigation<'_>) -> StepDecision {
        let mut next = self.cursor + 1;
        while let Some(&node) = self.reference.get(next) {
            let cell = nav.cell(node);
            if nav.blocks.contains(cell) {
                warn!(agent = %nav.agent, %cell, "reference route hits a blocked cell, skipping");
                self.last_block = Some(cell);
            } else if node != nav.position {
                break;
            }
            next += 1;
        }
        match self.reference.get(next) {
            Some(&node) => {
                self.cursor = next;
                StepDecision::Move(node)
            }
            None => {
                self.cursor = self.reference.len().saturating_sub(1);
                StepDecision::Hold(HoldReason::RouteExhausted)
            }
        }
    }
}

impl<O: Oracle + 'static> Pilot for OraclePilot<O> {
    fn label(&self) -> String {
        match self.source {
            Reference::Planned(strategy) => format!("oracle[{strategy}]"),
            Reference::Fixed             => "oracle".to_owned(),
        }
    }

    fn on_traffic(&mut self, nav: &Navigation<'_>, metrics: &mut AgentMetrics) {
        if let Reference::Planned(strategy) = self.source {
            if self.reference.is_empty() {
                self.reference = nav.plan(strategy, metrics).map(|r| r.nodes).unwrap_or_default();
            }
        }
    }

    fn next_step(&mut self, nav: &Navigation<'_>, _metrics: &mut AgentMetrics) -> StepDecision {
        let state = self.state(nav);
        let answer = match self.oracle.propose(&state) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(agent = %nav.agent, error = %e, "oracle failed, following reference route");
                return self.fallback(nav);
            }
        };

        let Some(cell) = parse_move(&answer) else {
            warn!(agent = %nav.agent, answer = %answer.trim(), "unparseable oracle answer, following reference route");
            return self.fallback(nav);
        };
        if nav.blocks.contains(cell) {
            debug!(agent = %nav.agent, %cell, "oracle proposed a blocked cell, holding");
            self.last_block = Some(cell);
            return StepDecision::Hold(HoldReason::Blocked(cell));
        }
        if state.free_neighbors.contains(&cell) {
            if let Some(node) = nav.graph.node_at(cell) {
                return StepDecision::Move(node);
            }
        }
        warn!(agent = %nav.agent, %cell, "oracle proposed an invalid move, following reference route");
        self.fallback(nav)
    }
}
