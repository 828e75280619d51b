//! `gr-core`: foundational types for the gridroute delivery simulator.
//!
//! This crate is a dependency of every other `gr-*` crate.  It has no `gr-*`
//! dependencies and only small external ones (`rand`, `thiserror`, plus the
//! optional `serde` and `rustc-hash`).
//!
//! # What lives here
//!
//! | Module      | Contents                                               |
//! |-------------|--------------------------------------------------------|
//! | [`ids`]     | `AgentId`, `NodeId`                                    |
//! | [`cell`]    | `Cell` grid coordinate, distances, `"row_col"` labels  |
//! | [`time`]    | `Tick`                                                 |
//! | [`config`]  | `SimConfig`                                            |
//! | [`rng`]     | `SimRng`                                               |
//! | [`hash`]    | `CellMap` / `CellSet` aliases                          |
//! | [`error`]   | `CoreError`, `CoreResult`                              |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                   |
//! |-----------|----------------------------------------------------------|
//! | `serde`   | Adds `Serialize`/`Deserialize` to ids, cells and config. |
//! | `fx-hash` | `CellMap`/`CellSet` use FxHash instead of SipHash.       |

pub mod cell;
pub mod config;
pub mod error;
pub mod hash;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cell::Cell;
pub use config::SimConfig;
pub use error::{CoreError, CoreResult};
pub use hash::{CellMap, CellSet};
pub use ids::{AgentId, NodeId};
pub use rng::SimRng;
pub use time::Tick;
