//! Spatial-subsystem error type.
//!
//! Everything here is a load-time failure.  A search that finds no route is
//! not an error; routers return `None` for it.

use thiserror::Error;

/// Errors produced by `gr-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("malformed graph document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate node id {0:?}")]
    DuplicateNode(String),

    #[error("edge #{index} references unknown node {id:?}")]
    UnknownEndpoint { index: usize, id: String },

    #[error("node {id:?} has out-of-range coordinates ({row}, {col})")]
    BadCoordinate { id: String, row: i64, col: i64 },

    #[error("node {id:?} shares cell ({row}, {col}) with node {other:?}")]
    DuplicateCell { id: String, other: String, row: i32, col: i32 },

    #[error("unknown strategy or heuristic {0:?}")]
    UnknownName(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
