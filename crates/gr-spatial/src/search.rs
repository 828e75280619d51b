//! Best-first search skeleton shared by A* and Dijkstra.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;

use gr_core::NodeId;

use crate::{EdgeCost, GridGraph, Route};

// ── Frontier ──────────────────────────────────────────────────────────────────

/// Heap entry.  Ordered so that `BinaryHeap` (a max-heap) pops the lowest
/// `f` first, and among equal `f` the earliest pushed entry.
struct FrontierEntry {
    f:    f64,
    seq:  u64,
    g:    u64,
    node: NodeId,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

/// Best-first search from `from` to `to`, prioritised by `g + h(node)`.
///
/// `h` returning zero everywhere gives Dijkstra.  Returns `None` when either
/// endpoint is not a node of `graph` or the frontier empties before the goal
/// is popped.
pub(crate) fn best_first_search<H>(
    graph: &GridGraph,
    from: NodeId,
    to: NodeId,
    cost: &dyn EdgeCost,
    h: H,
) -> Option<Route>
where
    H: Fn(NodeId) -> f64,
{
    if !graph.contains(from) || !graph.contains(to) {
        return None;
    }
    if from == to {
        return Some(Route::trivial(from));
    }

    let n = graph.node_count();
    // g_score[v] = best known cost to reach v.
    let mut g_score = vec![u64::MAX; n];
    // prev[v] = node that reached v; INVALID for unreached nodes.
    let mut prev = vec![NodeId::INVALID; n];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    let mut expanded = 0usize;

    g_score[from.index()] = 0;
    heap.push(FrontierEntry { f: h(from), seq, g: 0, node: from });

    while let Some(FrontierEntry { g, node, .. }) = heap.pop() {
        // Skip stale heap entries.
        if g > g_score[node.index()] {
            continue;
        }
        if node == to {
            let nodes = reconstruct(&prev, from, to);
            trace!(from = %from, to = %to, cost = g, expanded, "route found");
            return Some(Route { nodes, cost: g, expanded });
        }
        expanded += 1;

        for &next in graph.neighbors(node) {
            let tentative = g.saturating_add(cost.cost(node, next));
            if tentative < g_score[next.index()] {
                g_score[next.index()] = tentative;
                prev[next.index()] = node;
                seq += 1;
                heap.push(FrontierEntry { f: tentative as f64 + h(next), seq, g: tentative, node: next });
            }
        }
    }

    trace!(from = %from, to = %to, expanded, "frontier exhausted");
    None
}

/// Walk the predecessor table back from `goal` to `start` and return the
/// path in forward order.
///
/// `predecessors[v]` is the node that reached `v`, or `NodeId::INVALID`.
/// If the chain breaks before reaching `start`, the partial chain ending at
/// `goal` is returned.  The walk is bounded by the table length so a
/// malformed table cannot loop forever.
pub fn reconstruct(predecessors: &[NodeId], start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut path = vec![goal];
    let mut cur = goal;
    while cur != start && path.len() <= predecessors.len() {
        let Some(&p) = predecessors.get(cur.index()) else { break };
        if !p.is_valid() {
            break;
        }
        path.push(p);
        cur = p;
    }
    path.reverse();
    path
}
