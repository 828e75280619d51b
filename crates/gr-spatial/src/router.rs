//! Routing trait, route type, and the A*/Dijkstra implementations.
//!
//! # Pluggability
//!
//! Agents call routing via the [`Router`] trait, so the search strategy is a
//! per-agent choice.  [`Strategy`] is the closed set the simulator and CLI
//! know by name; it dispatches to [`AStarRouter`] or [`DijkstraRouter`].
//!
//! # Cost units
//!
//! Costs are integer step prices from an [`EdgeCost`].  Totals saturate at
//! `u64::MAX` instead of wrapping.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use gr_core::NodeId;

use crate::search::best_first_search;
use crate::{EdgeCost, GridGraph, Heuristic, SpatialError};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: the node sequence from source to
/// destination (both inclusive) and its total cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    /// Sum of edge costs along `nodes`.
    pub cost: u64,
    /// Nodes expanded by the search that produced this route.
    pub expanded: usize,
}

impl Route {
    /// The single-node route for `from == to`.
    pub fn trivial(node: NodeId) -> Self {
        Route { nodes: vec![node], cost: 0, expanded: 0 }
    }

    /// Number of moves (edges) along the route.
    pub fn steps(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Re-derive the total cost of `nodes` under `cost`.
    ///
    /// Returns `None` if two consecutive nodes are not adjacent in `graph`.
    pub fn cost_under(&self, graph: &GridGraph, cost: &dyn EdgeCost) -> Option<u64> {
        self.nodes.windows(2).try_fold(0u64, |acc, w| {
            graph
                .are_adjacent(w[0], w[1])
                .then(|| acc.saturating_add(cost.cost(w[0], w[1])))
        })
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// Implementations must be `Send + Sync` so agents holding them can be
/// updated from rayon worker threads during the traffic broadcast.
pub trait Router: Send + Sync {
    /// Compute a minimum-cost route from `from` to `to` under `cost`.
    ///
    /// `from == to` yields the single-node route.  `None` means "no path":
    /// either endpoint is not a road node or the goal is unreachable.
    fn route(&self, graph: &GridGraph, from: NodeId, to: NodeId, cost: &dyn EdgeCost) -> Option<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Uniform-cost search.  The cost-exact reference strategy.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, graph: &GridGraph, from: NodeId, to: NodeId, cost: &dyn EdgeCost) -> Option<Route> {
        best_first_search(graph, from, to, cost, |_| 0.0)
    }
}

// ── AStarRouter ───────────────────────────────────────────────────────────────

/// A* with a pluggable [`Heuristic`].
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarRouter {
    pub heuristic: Heuristic,
}

impl AStarRouter {
    pub fn new(heuristic: Heuristic) -> Self {
        Self { heuristic }
    }
}

impl Router for AStarRouter {
    fn route(&self, graph: &GridGraph, from: NodeId, to: NodeId, cost: &dyn EdgeCost) -> Option<Route> {
        if !graph.contains(to) {
            return None;
        }
        let h = self.heuristic;
        best_first_search(graph, from, to, cost, |n| h.estimate(graph, n, to))
    }
}

// ── Strategy ──────────────────────────────────────────────────────────────────

/// Search algorithm, without its heuristic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchKind {
    #[default]
    AStar,
    Dijkstra,
}

impl FromStr for SearchKind {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "astar" | "a*" | "a-star" => Ok(SearchKind::AStar),
            "dijkstra"                => Ok(SearchKind::Dijkstra),
            other => Err(SpatialError::UnknownName(other.to_owned())),
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchKind::AStar    => "astar",
            SearchKind::Dijkstra => "dijkstra",
        })
    }
}

/// A named routing strategy: A* with a heuristic, or Dijkstra.
///
/// ```
/// use gr_spatial::{Heuristic, SearchKind, Strategy};
///
/// let s = Strategy::new(SearchKind::AStar, Heuristic::Euclidean);
/// assert_eq!(s.to_string(), "astar(euclidean)");
/// // Dijkstra ignores the heuristic.
/// assert_eq!(Strategy::new(SearchKind::Dijkstra, Heuristic::Euclidean), Strategy::Dijkstra);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    AStar(Heuristic),
    Dijkstra,
}

impl Strategy {
    pub fn new(kind: SearchKind, heuristic: Heuristic) -> Self {
        match kind {
            SearchKind::AStar    => Strategy::AStar(heuristic),
            SearchKind::Dijkstra => Strategy::Dijkstra,
        }
    }

    /// The four variants compared by the `compare` command.
    pub fn all() -> [Strategy; 4] {
        [
            Strategy::AStar(Heuristic::Manhattan),
            Strategy::AStar(Heuristic::Euclidean),
            Strategy::AStar(Heuristic::ObstacleCount),
            Strategy::Dijkstra,
        ]
    }

    pub fn kind(self) -> SearchKind {
        match self {
            Strategy::AStar(_) => SearchKind::AStar,
            Strategy::Dijkstra => SearchKind::Dijkstra,
        }
    }

    pub fn heuristic(self) -> Option<Heuristic> {
        match self {
            Strategy::AStar(h) => Some(h),
            Strategy::Dijkstra => None,
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::AStar(Heuristic::Manhattan)
    }
}

impl Router for Strategy {
    fn route(&self, graph: &GridGraph, from: NodeId, to: NodeId, cost: &dyn EdgeCost) -> Option<Route> {
        let route = match *self {
            Strategy::AStar(h) => AStarRouter::new(h).route(graph, from, to, cost),
            Strategy::Dijkstra => DijkstraRouter.route(graph, from, to, cost),
        };
        match &route {
            Some(r) => debug!(strategy = %self, steps = r.steps(), cost = r.cost, expanded = r.expanded, "planned"),
            None    => debug!(strategy = %self, from = %from, to = %to, "no route"),
        }
        route
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::AStar(h) => write!(f, "astar({h})"),
            Strategy::Dijkstra => f.write_str("dijkstra"),
        }
    }
}

impl FromStr for Strategy {
    type Err = SpatialError;

    /// Accepts `dijkstra`, `astar` (Manhattan), `astar(<heuristic>)`,
    /// `astar:<heuristic>`, or a bare heuristic name (A* implied).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_prefix("astar(").and_then(|r| r.strip_suffix(')')) {
            return Ok(Strategy::AStar(inner.parse()?));
        }
        if let Some((kind, h)) = s.split_once(':') {
            return Ok(Strategy::new(kind.parse()?, h.parse()?));
        }
        match s.parse::<SearchKind>() {
            Ok(kind) => Ok(Strategy::new(kind, Heuristic::default())),
            Err(_)   => Ok(Strategy::AStar(s.parse()?)),
        }
    }
}
