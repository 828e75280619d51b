//! Move sources for delivery agents.
//!
//! A [`Pilot`] decides where its agent goes next.  [`RoutePlanner`] plans a
//! full route with a search [`Strategy`] and replans on every traffic update;
//! the oracle-driven pilot lives in [`oracle`](crate::oracle).

use std::collections::VecDeque;
use std::time::Instant;

use gr_core::{AgentId, Cell, NodeId};
use gr_spatial::{GridGraph, Route, Router, Strategy};
use gr_traffic::{PermanentBlocks, TrafficCost, TrafficSnapshot};

use crate::{AgentMetrics, HoldReason};

/// Read-only view of the world from one agent's position.
pub struct Navigation<'a> {
    pub agent:    AgentId,
    pub graph:    &'a GridGraph,
    pub traffic:  &'a TrafficSnapshot,
    pub blocks:   &'a PermanentBlocks,
    pub position: NodeId,
    pub goal:     NodeId,
}

impl<'a> Navigation<'a> {
    /// Edge cost under the current snapshot and the permanent blocks.
    pub fn cost(&self) -> TrafficCost<'a> {
        TrafficCost::new(self.graph, self.traffic, self.blocks)
    }

    #[inline]
    pub fn cell(&self, node: NodeId) -> Cell {
        self.graph.cell(node)
    }

    /// `true` if `node` can be stepped on right now: neither permanently
    /// blocked nor obstructed.
    pub fn is_free(&self, node: NodeId) -> bool {
        let cell = self.graph.cell(node);
        !self.blocks.contains(cell) && !self.traffic.is_obstructed(cell)
    }

    /// Run `strategy` from the current position to the goal, timing the
    /// search into `metrics`.
    pub fn plan(&self, strategy: Strategy, metrics: &mut AgentMetrics) -> Option<Route> {
        let started = Instant::now();
        let route = strategy.route(self.graph, self.position, self.goal, &self.cost());
        metrics.record_plan(started.elapsed(), route.as_ref().map_or(0, Route::steps));
        route
    }
}

/// A pilot's decision for one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepDecision {
    Move(NodeId),
    Hold(HoldReason),
}

/// Pluggable move source for a [`DeliveryAgent`](crate::DeliveryAgent).
pub trait Pilot: Send {
    /// Short name for reports (`"astar(manhattan)"`, `"oracle"`).
    fn label(&self) -> String;

    /// A new traffic snapshot has arrived.  Also called once when the agent
    /// is built, before any snapshot, so the pilot can make its first plan.
    fn on_traffic(&mut self, nav: &Navigation<'_>, metrics: &mut AgentMetrics);

    /// Choose this tick's move.  Not called once the agent is at its goal.
    fn next_step(&mut self, nav: &Navigation<'_>, metrics: &mut AgentMetrics) -> StepDecision;
}

// ── RoutePlanner ──────────────────────────────────────────────────────────────

/// Search-based pilot: follows the current plan, replanning on every
/// snapshot and whenever the plan runs out or its next cell is obstructed.
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    strategy: Strategy,
    /// Remaining plan; the front is the current position.
    path: VecDeque<NodeId>,
}

impl RoutePlanner {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy, path: VecDeque::new() }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The remaining plan, starting at the current position.
    pub fn path(&self) -> &VecDeque<NodeId> {
        &self.path
    }

    fn replan(&mut self, nav: &Navigation<'_>, metrics: &mut AgentMetrics) {
        self.path = nav
            .plan(self.strategy, metrics)
            .map(|r| VecDeque::from(r.nodes))
            .unwrap_or_default();
    }
}

impl Pilot for RoutePlanner {
    fn label(&self) -> String {
        self.strategy.to_string()
    }

    fn on_traffic(&mut self, nav: &Navigation<'_>, metrics: &mut AgentMetrics) {
        self.replan(nav, metrics);
    }

    fn next_step(&mut self, nav: &Navigation<'_>, metrics: &mut AgentMetrics) -> StepDecision {
        let stale = match self.path.get(1) {
            None        => true,
            Some(&next) => self.path[0] != nav.position || nav.traffic.is_obstructed(nav.cell(next)),
        };
        if stale {
            self.replan(nav, metrics);
        }

        match self.path.get(1).copied() {
            None => StepDecision::Hold(HoldReason::NoRoute),
            // Only a route with no finite-cost alternative crosses a block.
            Some(next) if nav.blocks.contains(nav.cell(next)) => {
                StepDecision::Hold(HoldReason::Blocked(nav.cell(next)))
            }
            Some(next) => {
                self.path.pop_front();
                StepDecision::Move(next)
            }
        }
    }
}
