//! `gr-spatial`: grid road graph, cost model, and routing.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`graph`]     | `GridGraph` (CSR + R-tree + obstacle prefix sums), builder  |
//! | [`loader`]    | `load_graph_json` / `load_graph_reader` for graph documents |
//! | [`cost`]      | `EdgeCost` trait, `UnitCost`, `BLOCKED_COST`                |
//! | [`heuristic`] | `Heuristic` (manhattan, euclidean, obstacle-count)          |
//! | [`search`]    | shared best-first skeleton, `reconstruct`                   |
//! | [`router`]    | `Router` trait, `Route`, `AStarRouter`, `DijkstraRouter`, `Strategy` |
//! | [`error`]     | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Cost model
//!
//! Topology is unweighted.  Every traversal weight comes from an injected
//! [`EdgeCost`]; traffic surcharges and permanent blocks live there and
//! nowhere else, so the same graph serves every agent and every tick.

pub mod cost;
pub mod error;
pub mod graph;
pub mod heuristic;
pub mod loader;
pub mod router;
pub mod search;


pub use cost::{BLOCKED_COST, EdgeCost, UnitCost};
pub use error::{SpatialError, SpatialResult};
pub use graph::{GridGraph, GridGraphBuilder};
pub use heuristic::Heuristic;
pub use loader::{load_graph_json, load_graph_reader, MAX_GRID_CELLS};
pub use router::{AStarRouter, DijkstraRouter, Route, Router, SearchKind, Strategy};
pub use search::reconstruct;
