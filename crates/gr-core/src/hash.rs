//! Cell-keyed hash collections.
//!
//! Obstruction sets, permanent blocks and the graph's cell index are all
//! keyed by small integer pairs, where FxHash is noticeably faster than
//! SipHash.  The `fx-hash` feature flips the aliases; callers only ever name
//! `CellMap` / `CellSet`.

use crate::Cell;

#[cfg(not(feature = "fx-hash"))]
pub type CellMap<V> = std::collections::HashMap<Cell, V>;

#[cfg(not(feature = "fx-hash"))]
pub type CellSet = std::collections::HashSet<Cell>;

#[cfg(feature = "fx-hash")]
pub type CellMap<V> = rustc_hash::FxHashMap<Cell, V>;

#[cfg(feature = "fx-hash")]
pub type CellSet = rustc_hash::FxHashSet<Cell>;
