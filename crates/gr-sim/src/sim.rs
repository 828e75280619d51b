//! The `Sim` struct and its tick loop.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use gr_agent::{AgentEvent, DeliveryAgent, IncapableReason};
use gr_core::{AgentId, NodeId, SimConfig, Tick};
use gr_spatial::GridGraph;
use gr_traffic::{TickReport, TrafficController};

use crate::SimObserver;

// ── Outcome & summary ─────────────────────────────────────────────────────────

/// Why a run stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SimOutcome {
    /// Every agent is finished or incapable.
    AllFinished,
    /// No agent moved for `stuck_limit` ticks; the rest were forced incapable.
    Stalled,
    /// `max_ticks` reached with agents still running.
    TickLimit,
}

impl fmt::Display for SimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SimOutcome::AllFinished => "all-finished",
            SimOutcome::Stalled     => "stalled",
            SimOutcome::TickLimit   => "tick-limit",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimSummary {
    pub ticks_run: u64,
    pub outcome:   SimOutcome,
    pub finished:  usize,
    pub incapable: usize,
    pub running:   usize,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Each tick:
///
/// 1. The [`TrafficController`] steps: decay, generation, broadcast to every
///    agent, then each agent's advance, in registration order.
/// 2. **Stall check**: if no agent's position changed since the previous
///    tick, a counter increments; any change resets it.  At `stuck_limit`
///    every unfinished agent is forced `Incapable` and the run halts.
/// 3. The run also halts once every agent is terminal, or after
///    `max_ticks`.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    /// Run-level configuration (tick limit, seed, stuck and ping limits).
    pub config: SimConfig,

    pub(crate) graph: Arc<GridGraph>,

    /// Last completed tick; `Tick::ZERO` before the first.
    pub(crate) tick: Tick,

    /// Owns the obstruction set and the agents (as its subscribers).
    pub(crate) controller: TrafficController<DeliveryAgent>,

    pub(crate) stuck_counter:  u32,
    pub(crate) last_positions: Vec<NodeId>,

    /// Set once the run has halted for good.
    pub(crate) outcome: Option<SimOutcome>,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until every agent is terminal, the stall detector fires, or
    /// `config.max_ticks` is reached.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimSummary {
        info!(agents = self.agents().len(), max_ticks = self.config.max_ticks, seed = self.config.seed, "run started");
        while self.outcome.is_none() {
            if self.tick.0 >= self.config.max_ticks {
                self.outcome = Some(SimOutcome::TickLimit);
                break;
            }
            self.process_tick(observer);
        }
        let summary = self.summary();
        info!(
            ticks = summary.ticks_run,
            outcome = %summary.outcome,
            finished = summary.finished,
            incapable = summary.incapable,
            "run ended"
        );
        observer.on_sim_end(&summary, self.controller.subscribers());
        summary
    }

    /// Run at most `n` more ticks, ignoring `max_ticks`.  Stops early if the
    /// run halts.  Does not call `on_sim_end`.
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> Option<SimOutcome> {
        for _ in 0..n {
            if self.outcome.is_some() {
                break;
            }
            self.process_tick(observer);
        }
        self.outcome
    }

    /// Counts so far.  `outcome` is `TickLimit` while the run is still live.
    pub fn summary(&self) -> SimSummary {
        let agents = self.agents();
        let finished = agents.iter().filter(|a| a.status().is_finished()).count();
        let incapable = agents.iter().filter(|a| a.status().is_incapable()).count();
        SimSummary {
            ticks_run: self.tick.0,
            outcome: self.outcome.unwrap_or(SimOutcome::TickLimit),
            finished,
            incapable,
            running: agents.len() - finished - incapable,
        }
    }

    pub fn agents(&self) -> &[DeliveryAgent] {
        self.controller.subscribers()
    }

    pub fn agent(&self, id: AgentId) -> Option<&DeliveryAgent> {
        self.controller.subscriber(id)
    }

    pub fn graph(&self) -> &Arc<GridGraph> {
        &self.graph
    }

    /// Last completed tick.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn outcome(&self) -> Option<SimOutcome> {
        self.outcome
    }

    pub fn controller(&self) -> &TrafficController<DeliveryAgent> {
        &self.controller
    }

    /// Mutable controller access, e.g. to script obstructions between ticks.
    pub fn controller_mut(&mut self) -> &mut TrafficController<DeliveryAgent> {
        &mut self.controller
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick<O: SimObserver>(&mut self, observer: &mut O) {
        let tick = self.tick.next();
        observer.on_tick_start(tick);

        let mut report = self.controller.step(tick);
        self.tick = tick;
        self.outcome = self.check_progress(tick, &mut report);

        debug!(
            %tick,
            obstructions = report.obstructions,
            events = report.events.len(),
            stuck = self.stuck_counter,
            "tick done"
        );
        for event in &report.events {
            observer.on_agent_event(event);
        }
        observer.on_tick_end(&report);
    }

    fn check_progress(&mut self, tick: Tick, report: &mut TickReport<AgentEvent>) -> Option<SimOutcome> {
        let positions: Vec<NodeId> = self.agents().iter().map(DeliveryAgent::position).collect();
        if positions == self.last_positions {
            self.stuck_counter += 1;
        } else {
            self.stuck_counter = 0;
            self.last_positions = positions;
        }

        if self.agents().iter().all(|a| a.status().is_terminal()) {
            return Some(SimOutcome::AllFinished);
        }
        if self.stuck_counter >= self.config.stuck_limit {
            warn!(%tick, ticks = self.stuck_counter, "no progress, halting");
            for agent in self.controller.subscribers_mut() {
                report.events.extend(agent.mark_incapable(IncapableReason::Stalled, tick));
            }
            return Some(SimOutcome::Stalled);
        }
        None
    }
}
