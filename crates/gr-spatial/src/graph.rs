//! Grid road graph and builder.
//!
//! # Data layout
//!
//! Adjacency is stored in **Compressed Sparse Row (CSR)** form.  Given a
//! `NodeId n`, its neighbors occupy the slice:
//!
//! ```text
//! adj[ adj_start[n] .. adj_start[n+1] ]
//! ```
//!
//! Each neighbor list is sorted and de-duplicated, so adjacency behaves as a
//! set and neighbor expansion is a contiguous scan.  Only road cells become
//! nodes; non-road cells exist solely in the routability table consumed by
//! the obstacle-count heuristic.
//!
//! # Auxiliary indexes
//!
//! - `cell_index`: exact `Cell → NodeId` lookup.
//! - an R-tree (via `rstar`) for nearest-road-node snapping of arbitrary cells.
//! - a 2-D prefix-sum table of non-road cells over the grid bounds, so the
//!   number of obstacles inside any axis-aligned rectangle is O(1).

use std::collections::HashMap;

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use gr_core::{Cell, CellMap, NodeId};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a `[row, col]` point with the
/// associated `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [i64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[i64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in cell units.
    fn distance_2(&self, point: &[i64; 2]) -> i64 {
        let dr = self.point[0] - point[0];
        let dc = self.point[1] - point[1];
        dr * dr + dc * dc
    }
}

// ── GridGraph ─────────────────────────────────────────────────────────────────

/// Undirected, unweighted road graph over a rectangular grid.
///
/// Do not construct directly; use [`GridGraphBuilder`], the convenience
/// constructors, or [`load_graph_json`][crate::load_graph_json].
pub struct GridGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Coordinate of each node.  Indexed by `NodeId`.
    pub node_cell: Vec<Cell>,

    /// Identity label of each node as given by the source document
    /// (`"row_col"` for generated grids).
    pub node_label: Vec<String>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub adj_start: Vec<u32>,

    /// Concatenated, per-node sorted neighbor lists.
    pub adj: Vec<NodeId>,

    // ── Grid extent and lookups ───────────────────────────────────────────
    rows: u32,
    cols: u32,
    cell_index:  CellMap<NodeId>,
    label_index: HashMap<String, NodeId>,

    /// Routability flag per in-bounds cell, row-major.  Heuristic input only.
    road_hint: Vec<bool>,

    /// `(rows + 1) × (cols + 1)` prefix sums of `!road_hint`.
    obstacle_prefix: Vec<u32>,

    spatial_idx: RTree<NodeEntry>,
}

impl GridGraph {
    /// Construct an empty graph with no nodes.  Every search on it returns
    /// no route.
    pub fn empty() -> Self {
        GridGraphBuilder::new().build()
    }

    /// Fully open `rows × cols` grid: every cell is a road node, 4-connected.
    /// Node labels are `"row_col"`.
    pub fn open_grid(rows: u32, cols: u32) -> Self {
        let area = rows as usize * cols as usize;
        let mut b = GridGraphBuilder::with_capacity(area, 2 * area);
        for r in 0..rows as i32 {
            for c in 0..cols as i32 {
                b.add_cell_node(Cell::new(r, c));
            }
        }
        b.connect_orthogonal();
        b.build()
    }

    /// Build a grid from ASCII rows: `#` is non-road, any other character is
    /// road.  Road cells are 4-connected.
    ///
    /// ```
    /// use gr_spatial::GridGraph;
    ///
    /// let g = GridGraph::from_ascii(&[
    ///     "..#",
    ///     "...",
    /// ]);
    /// assert_eq!(g.node_count(), 5);
    /// assert_eq!((g.rows(), g.cols()), (2, 3));
    /// ```
    pub fn from_ascii(lines: &[&str]) -> Self {
        let mut b = GridGraphBuilder::new();
        for (r, line) in lines.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let cell = Cell::new(r as i32, c as i32);
                if ch == '#' {
                    b.add_non_road(cell);
                } else {
                    b.add_cell_node(cell);
                }
            }
        }
        b.connect_orthogonal();
        b.build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_cell.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adj.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.node_cell.is_empty()
    }

    /// Grid height in cells (one past the largest described row).
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Grid width in cells (one past the largest described column).
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// `true` if `node` is a valid index into this graph.
    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_cell.len()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Sorted neighbor slice of `node`.  Empty for isolated nodes.
    #[inline]
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        let start = self.adj_start[node.index()] as usize;
        let end   = self.adj_start[node.index() + 1] as usize;
        &self.adj[start..end]
    }

    #[inline]
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbors(node).len()
    }

    #[inline]
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn cell(&self, node: NodeId) -> Cell {
        self.node_cell[node.index()]
    }

    #[inline]
    pub fn label(&self, node: NodeId) -> &str {
        &self.node_label[node.index()]
    }

    /// Road node at `cell`, if the cell is routable.
    #[inline]
    pub fn node_at(&self, cell: Cell) -> Option<NodeId> {
        self.cell_index.get(&cell).copied()
    }

    /// Road node with the given document identity.
    pub fn node_by_label(&self, label: &str) -> Option<NodeId> {
        self.label_index.get(label).copied()
    }

    /// Nearest road node to `cell` by straight-line distance.
    ///
    /// Returns `None` only if the graph has no nodes.
    pub fn snap_to_node(&self, cell: Cell) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&[i64::from(cell.row), i64::from(cell.col)])
            .map(|e| e.id)
    }

    // ── Routability hints ─────────────────────────────────────────────────

    /// Routability flag used by heuristics.  Out-of-bounds cells are never
    /// routable.
    pub fn is_road_hint(&self, cell: Cell) -> bool {
        self.hint_index(cell).is_some_and(|i| self.road_hint[i])
    }

    /// Number of non-road cells inside the inclusive bounding rectangle of
    /// `a` and `b`, clipped to the grid.
    pub fn obstacles_between(&self, a: Cell, b: Cell) -> u32 {
        if self.rows == 0 || self.cols == 0 {
            return 0;
        }
        let max_r = self.rows as i32 - 1;
        let max_c = self.cols as i32 - 1;
        let r0 = a.row.min(b.row).clamp(0, max_r) as usize;
        let r1 = a.row.max(b.row).clamp(0, max_r) as usize + 1;
        let c0 = a.col.min(b.col).clamp(0, max_c) as usize;
        let c1 = a.col.max(b.col).clamp(0, max_c) as usize + 1;

        let w = self.cols as usize + 1;
        let p = &self.obstacle_prefix;
        p[r1 * w + c1] + p[r0 * w + c0] - p[r0 * w + c1] - p[r1 * w + c0]
    }

    /// Mark or unmark `cell` as an obstacle **for heuristic purposes only**.
    ///
    /// Topology and real traversal cost are unaffected.  Call before the run
    /// starts; the prefix table is rebuilt on every call.  Returns `false` if
    /// `cell` lies outside the grid.
    pub fn mark_heuristic_obstacle(&mut self, cell: Cell, is_road: bool) -> bool {
        let Some(i) = self.hint_index(cell) else {
            return false;
        };
        self.road_hint[i] = is_road;
        self.obstacle_prefix = obstacle_prefix(&self.road_hint, self.rows, self.cols);
        true
    }

    #[inline]
    fn hint_index(&self, cell: Cell) -> Option<usize> {
        cell.in_bounds(self.rows, self.cols)
            .then(|| cell.row as usize * self.cols as usize + cell.col as usize)
    }
}

/// Row-major `(rows + 1) × (cols + 1)` prefix sums of non-road cells.
fn obstacle_prefix(road_hint: &[bool], rows: u32, cols: u32) -> Vec<u32> {
    let (rows, cols) = (rows as usize, cols as usize);
    let w = cols + 1;
    let mut p = vec![0u32; (rows + 1) * w];
    for r in 0..rows {
        for c in 0..cols {
            let blocked = u32::from(!road_hint[r * cols + c]);
            p[(r + 1) * w + c + 1] = blocked + p[r * w + c + 1] + p[(r + 1) * w + c] - p[r * w + c];
        }
    }
    p
}

// ── GridGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`GridGraph`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts nodes, non-road cells and undirected edges in any
/// order.  `build()` de-duplicates edges, constructs the CSR arrays, derives
/// the grid bounds, and bulk-loads the R-tree.
///
/// # Example
///
/// ```
/// use gr_core::Cell;
/// use gr_spatial::GridGraphBuilder;
///
/// let mut b = GridGraphBuilder::new();
/// let a = b.add_node(Cell::new(0, 0), "0_0");
/// let c = b.add_node(Cell::new(0, 1), "0_1");
/// b.add_road(a, c);
/// b.add_road(c, a); // duplicate, collapsed
/// let g = b.build();
/// assert_eq!(g.node_count(), 2);
/// assert_eq!(g.edge_count(), 1);
/// ```
pub struct GridGraphBuilder {
    cells:     Vec<Cell>,
    labels:    Vec<String>,
    non_road:  Vec<Cell>,
    raw_edges: Vec<(NodeId, NodeId)>,
}

impl GridGraphBuilder {
    pub fn new() -> Self {
        Self { cells: Vec::new(), labels: Vec::new(), non_road: Vec::new(), raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            cells:     Vec::with_capacity(nodes),
            labels:    Vec::with_capacity(nodes),
            non_road:  Vec::new(),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a road node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, cell: Cell, label: impl Into<String>) -> NodeId {
        let id = NodeId(self.cells.len() as u32);
        self.cells.push(cell);
        self.labels.push(label.into());
        id
    }

    /// Add a road node labelled with the cell's `"row_col"` form.
    pub fn add_cell_node(&mut self, cell: Cell) -> NodeId {
        self.add_node(cell, cell.to_string())
    }

    /// Record a described but non-routable cell.  It contributes to the grid
    /// bounds and to the obstacle-count heuristic, never to topology.
    pub fn add_non_road(&mut self, cell: Cell) {
        self.non_road.push(cell);
    }

    /// Add an undirected edge between two road nodes.  Self-loops are ignored.
    pub fn add_road(&mut self, a: NodeId, b: NodeId) {
        if a != b {
            self.raw_edges.push((a, b));
        }
    }

    /// Connect every pair of orthogonally adjacent nodes added so far.
    pub fn connect_orthogonal(&mut self) {
        let index: CellMap<NodeId> = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, NodeId(i as u32)))
            .collect();
        for (i, &cell) in self.cells.iter().enumerate() {
            let a = NodeId(i as u32);
            // South and east only; the edge is undirected.
            for next in [Cell::new(cell.row + 1, cell.col), Cell::new(cell.row, cell.col + 1)] {
                if let Some(&b) = index.get(&next) {
                    self.raw_edges.push((a, b));
                }
            }
        }
    }

    /// Position of a node added earlier.
    pub fn node_cell(&self, id: NodeId) -> Cell {
        self.cells[id.index()]
    }

    pub fn node_count(&self) -> usize { self.cells.len() }

    /// Consume the builder and produce a [`GridGraph`].
    pub fn build(self) -> GridGraph {
        let node_count = self.cells.len();

        // Both directions, then sort + dedup for set semantics.
        let mut directed: Vec<(NodeId, NodeId)> = Vec::with_capacity(self.raw_edges.len() * 2);
        for &(a, b) in &self.raw_edges {
            directed.push((a, b));
            directed.push((b, a));
        }
        directed.sort_unstable();
        directed.dedup();

        let mut adj_start = vec![0u32; node_count + 1];
        for &(from, _) in &directed {
            adj_start[from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            adj_start[i] += adj_start[i - 1];
        }
        let adj: Vec<NodeId> = directed.iter().map(|&(_, to)| to).collect();
        debug_assert_eq!(adj_start[node_count] as usize, adj.len());

        // Bounds over every described, non-negative cell.
        let described = || self.cells.iter().chain(self.non_road.iter()).filter(|c| c.row >= 0 && c.col >= 0);
        let rows = described().map(|c| c.row as u32 + 1).max().unwrap_or(0);
        let cols = described().map(|c| c.col as u32 + 1).max().unwrap_or(0);

        // Undescribed cells inside the bounds count as obstacles.
        let mut road_hint = vec![false; rows as usize * cols as usize];
        for cell in self.cells.iter().filter(|c| c.row >= 0 && c.col >= 0) {
            road_hint[cell.row as usize * cols as usize + cell.col as usize] = true;
        }
        let obstacle_prefix = obstacle_prefix(&road_hint, rows, cols);

        let cell_index: CellMap<NodeId> = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, NodeId(i as u32)))
            .collect();
        let label_index: HashMap<String, NodeId> = self
            .labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), NodeId(i as u32)))
            .collect();

        let entries: Vec<NodeEntry> = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, c)| NodeEntry {
                point: [i64::from(c.row), i64::from(c.col)],
                id:    NodeId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        GridGraph {
            node_cell: self.cells,
            node_label: self.labels,
            adj_start,
            adj,
            rows,
            cols,
            cell_index,
            label_index,
            road_hint,
            obstacle_prefix,
            spatial_idx,
        }
    }
}

impl Default for GridGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
