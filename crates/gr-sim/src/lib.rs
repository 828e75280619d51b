//! `gr-sim`: tick loop driver for the gridroute simulator.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 1..=config.max_ticks:
//!   ① Decay:     every obstruction's TTL drops by one; zeros are removed.
//!   ② Generate:  scripted obstructions, then random spawns up to the
//!                 alert target.
//!   ③ Broadcast: one shared snapshot to every agent (agents may replan;
//!                 parallel with the `parallel` feature).
//!   ④ Advance:   each agent moves or holds, in registration order.
//!   ⑤ Progress:  all agents terminal → halt; positions unchanged for
//!                 `stuck_limit` ticks → force Incapable, halt.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the broadcast phase on Rayon's thread pool.       |
//! | `fx-hash`  | FxHash maps for obstruction and lookup tables.         |
//! | `serde`    | Serde derives on the core value types.                 |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use gr_agent::DeliveryAgent;
//! use gr_core::{Cell, SimConfig};
//! use gr_sim::{NoopObserver, SimBuilder};
//! use gr_spatial::load_graph_json;
//!
//! let graph = load_graph_json(path)?;
//! let mut sim = SimBuilder::new(SimConfig::default(), graph)
//!     .agent(DeliveryAgent::builder("van-01", Cell::new(0, 0), Cell::new(9, 9)))
//!     .build()?;
//! let summary = sim.run(&mut NoopObserver);
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{Sim, SimOutcome, SimSummary};
