//! Immutable traffic views handed to agents, and the traffic-aware edge cost.

use gr_core::{Cell, CellMap, CellSet, NodeId, Tick};
use gr_spatial::{EdgeCost, GridGraph, BLOCKED_COST};

// ── TrafficSnapshot ───────────────────────────────────────────────────────────

/// The complete obstruction set as of one broadcast.
///
/// Shared as `Arc<TrafficSnapshot>`; never mutated after construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrafficSnapshot {
    /// Tick of the broadcast that produced this snapshot (`Tick::ZERO`
    /// before the first step).
    pub tick: Tick,
    penalty: u64,
    /// Obstructed cell → remaining TTL.
    obstructions: CellMap<u32>,
}

impl TrafficSnapshot {
    pub fn new(tick: Tick, penalty: u64, obstructions: CellMap<u32>) -> Self {
        Self { tick, penalty, obstructions }
    }

    /// Snapshot with no obstructions.
    pub fn empty(penalty: u64) -> Self {
        Self { tick: Tick::ZERO, penalty, obstructions: CellMap::default() }
    }

    /// Surcharge for entering `cell`: the configured penalty if obstructed,
    /// else zero.
    #[inline]
    pub fn penalty(&self, cell: Cell) -> u64 {
        if self.obstructions.contains_key(&cell) { self.penalty } else { 0 }
    }

    #[inline]
    pub fn is_obstructed(&self, cell: Cell) -> bool {
        self.obstructions.contains_key(&cell)
    }

    pub fn ttl(&self, cell: Cell) -> Option<u32> {
        self.obstructions.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.obstructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstructions.is_empty()
    }

    /// Obstructed cells in ascending `(row, col)` order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.obstructions.keys().copied().collect();
        cells.sort_unstable();
        cells
    }
}

// ── PermanentBlocks ───────────────────────────────────────────────────────────

/// Cells that are never practically routable, fixed for the whole run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PermanentBlocks(CellSet);

impl PermanentBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: Cell) -> bool {
        self.0.insert(cell)
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.0.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Blocked cells in ascending `(row, col)` order.
    pub fn sorted(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.0.iter().copied().collect();
        cells.sort_unstable();
        cells
    }
}

impl FromIterator<Cell> for PermanentBlocks {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        PermanentBlocks(iter.into_iter().collect())
    }
}

// ── TrafficCost ───────────────────────────────────────────────────────────────

/// Edge cost under one traffic snapshot: `1 + penalty(to)`, or
/// [`BLOCKED_COST`] when `to` is permanently blocked.
#[derive(Copy, Clone)]
pub struct TrafficCost<'a> {
    pub graph:    &'a GridGraph,
    pub snapshot: &'a TrafficSnapshot,
    pub blocks:   &'a PermanentBlocks,
}

impl<'a> TrafficCost<'a> {
    pub fn new(graph: &'a GridGraph, snapshot: &'a TrafficSnapshot, blocks: &'a PermanentBlocks) -> Self {
        Self { graph, snapshot, blocks }
    }
}

impl EdgeCost for TrafficCost<'_> {
    #[inline]
    fn cost(&self, _from: NodeId, to: NodeId) -> u64 {
        let cell = self.graph.cell(to);
        if self.blocks.contains(cell) {
            BLOCKED_COST
        } else {
            1 + self.snapshot.penalty(cell)
        }
    }
}
