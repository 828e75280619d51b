//! `gr-agent`: delivery agents for the gridroute simulator.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                       |
//! |--------------|----------------------------------------------------------------|
//! | [`agent`]    | `DeliveryAgent`, `DeliveryAgentBuilder`                        |
//! | [`pilot`]    | `Pilot` trait, `Navigation`, `StepDecision`, `RoutePlanner`    |
//! | [`oracle`]   | `Oracle`, `OraclePilot`, `TimeoutOracle`, `PromptOracle`       |
//! | [`detector`] | `LoopDetector` (A-B-A oscillation)                             |
//! | [`metrics`]  | `AgentMetrics`                                                 |
//! | [`status`]   | `AgentStatus`, `AgentEvent`, `HoldReason`, `IncapableReason`   |
//! | [`error`]    | `AgentError`, `OracleError`                                    |
//!
//! # Agent lifecycle
//!
//! ```text
//! build ──► first plan ──► Running ──┬──► Finished   (reached the goal)
//!                          ▲    │    └──► Incapable  (oscillation / global stall)
//!                          └────┘
//!                 traffic update → replan, advance → move or hold
//! ```
//!
//! Agents subscribe to a `gr_traffic::TrafficController`: every snapshot
//! reaches the pilot through [`Pilot::on_traffic`], and every tick's
//! advance goes through [`Pilot::next_step`].

pub mod agent;
pub mod detector;
pub mod error;
pub mod metrics;
pub mod oracle;
pub mod pilot;
pub mod status;

#[cfg(test)]
mod tests;

pub use agent::{DeliveryAgent, DeliveryAgentBuilder};
pub use detector::LoopDetector;
pub use error::{AgentError, AgentResult, OracleError};
pub use metrics::AgentMetrics;
pub use oracle::{
    parse_move, Oracle, OraclePilot, OracleState, PromptOracle, TextModel, TimeoutOracle,
    DEFAULT_ORACLE_DEADLINE,
};
pub use pilot::{Navigation, Pilot, RoutePlanner, StepDecision};
pub use status::{AgentEvent, AgentStatus, HoldReason, IncapableReason};
