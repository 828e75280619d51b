//! Graph-document loader.
//!
//! # Format
//!
//! ```json
//! {
//!   "nodes": [ { "id": "0_0", "row": 0, "col": 0, "is_road": 1 }, ... ],
//!   "edges": [ ["0_0", "0_1"], ... ]
//! }
//! ```
//!
//! `is_road` may be `0`/`1` or `false`/`true`.  Only road nodes become graph
//! nodes.  Edges with a non-road endpoint are dropped; edges naming an id that
//! is not in `nodes` at all are rejected.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use gr_core::{Cell, CellMap, NodeId};

use crate::graph::{GridGraph, GridGraphBuilder};
use crate::{SpatialError, SpatialResult};

#[derive(Deserialize)]
struct GraphDocument {
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct NodeRecord {
    id:      String,
    row:     i64,
    col:     i64,
    is_road: RoadFlag,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoadFlag {
    Bool(bool),
    Int(i64),
}

impl RoadFlag {
    fn is_road(&self) -> bool {
        match *self {
            RoadFlag::Bool(b) => b,
            RoadFlag::Int(i)  => i == 1,
        }
    }
}

/// Largest grid area (`rows × cols`) a document may span.  Per-cell tables
/// are sized by the bounds, not by the node count.
pub const MAX_GRID_CELLS: usize = 1 << 26;

/// Load a graph document from a JSON file.
///
/// # Errors
///
/// [`SpatialError::Io`] if the file cannot be opened, otherwise as
/// [`load_graph_reader`].
pub fn load_graph_json(path: &Path) -> SpatialResult<GridGraph> {
    let file = File::open(path)?;
    let graph = load_graph_reader(BufReader::new(file))?;
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        rows = graph.rows(),
        cols = graph.cols(),
        "graph loaded"
    );
    Ok(graph)
}

/// Load a graph document from any reader.
///
/// # Errors
///
/// - [`SpatialError::Json`]: malformed JSON or a missing required field.
/// - [`SpatialError::DuplicateNode`]: two nodes share an id.
/// - [`SpatialError::BadCoordinate`]: negative row/col, or bounds whose area
///   exceeds [`MAX_GRID_CELLS`].
/// - [`SpatialError::DuplicateCell`]: two nodes share a `(row, col)`.
/// - [`SpatialError::UnknownEndpoint`]: an edge names an undeclared id.
pub fn load_graph_reader<R: Read>(reader: R) -> SpatialResult<GridGraph> {
    let doc: GraphDocument = serde_json::from_reader(reader)?;

    // id → Some(node) for road cells, None for described non-road cells.
    let mut ids: HashMap<String, Option<NodeId>> = HashMap::with_capacity(doc.nodes.len());
    let mut owners: CellMap<String> = CellMap::default();
    let mut b = GridGraphBuilder::with_capacity(doc.nodes.len(), doc.edges.len());
    let (mut rows, mut cols) = (0usize, 0usize);

    for rec in doc.nodes {
        let (Ok(row), Ok(col)) = (i32::try_from(rec.row), i32::try_from(rec.col)) else {
            return Err(SpatialError::BadCoordinate { id: rec.id, row: rec.row, col: rec.col });
        };
        if row < 0 || col < 0 {
            return Err(SpatialError::BadCoordinate { id: rec.id, row: rec.row, col: rec.col });
        }
        rows = rows.max(row as usize + 1);
        cols = cols.max(col as usize + 1);
        if rows.checked_mul(cols).is_none_or(|area| area > MAX_GRID_CELLS) {
            return Err(SpatialError::BadCoordinate { id: rec.id, row: rec.row, col: rec.col });
        }
        if ids.contains_key(&rec.id) {
            return Err(SpatialError::DuplicateNode(rec.id));
        }
        let cell = Cell::new(row, col);
        if let Some(other) = owners.get(&cell) {
            return Err(SpatialError::DuplicateCell { id: rec.id, other: other.clone(), row, col });
        }
        owners.insert(cell, rec.id.clone());
        let node = if rec.is_road.is_road() {
            Some(b.add_node(cell, rec.id.clone()))
        } else {
            b.add_non_road(cell);
            None
        };
        ids.insert(rec.id, node);
    }

    let mut skipped = 0usize;
    for (index, (a, c)) in doc.edges.into_iter().enumerate() {
        let lookup = |id: String| match ids.get(&id) {
            Some(&node) => Ok(node),
            None        => Err(SpatialError::UnknownEndpoint { index, id }),
        };
        match (lookup(a)?, lookup(c)?) {
            (Some(a), Some(c)) => b.add_road(a, c),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "edges touching non-road cells dropped");
    }

    Ok(b.build())
}
