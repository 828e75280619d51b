//! Edge cost model.
//!
//! The graph itself is unweighted.  Routers ask an [`EdgeCost`] for the price
//! of stepping from one node onto an adjacent one, which keeps traffic and
//! permanent blocks out of the topology entirely.

use gr_core::NodeId;

/// Cost of entering a permanently blocked node.
///
/// Large enough that any path through open road is cheaper, small enough
/// that a handful of them still fit comfortably in a `u64` total.
pub const BLOCKED_COST: u64 = 1_000_000_000;

/// Price of traversing the edge `from → to`.
///
/// Called only for graph-adjacent pairs.  Must return at least 1 so that
/// admissible heuristics (which assume unit steps) stay admissible.
pub trait EdgeCost {
    fn cost(&self, from: NodeId, to: NodeId) -> u64;
}

/// Every step costs 1.
#[derive(Copy, Clone, Debug, Default)]
pub struct UnitCost;

impl EdgeCost for UnitCost {
    #[inline]
    fn cost(&self, _from: NodeId, _to: NodeId) -> u64 {
        1
    }
}

impl<F> EdgeCost for F
where
    F: Fn(NodeId, NodeId) -> u64,
{
    #[inline]
    fn cost(&self, from: NodeId, to: NodeId) -> u64 {
        self(from, to)
    }
}
