//! `gr-traffic`: the traffic controller for the gridroute simulator.
//!
//! The controller owns the set of temporarily obstructed cells.  Each step it
//! ages them, tops the set back up with random cells, broadcasts an immutable
//! snapshot to every subscriber, and then lets each subscriber act.
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`config`]     | `TrafficConfig`                                           |
//! | [`snapshot`]   | `TrafficSnapshot`, `PermanentBlocks`, `TrafficCost`       |
//! | [`controller`] | `TrafficController`, `TrafficSubscriber`, `TickReport`    |
//! | [`error`]      | `TrafficError`, `TrafficResult<T>`                        |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the broadcast phase on Rayon's thread pool.       |
//! | `serde`    | `Serialize`/`Deserialize` on `TrafficConfig`.          |

pub mod config;
pub mod controller;
pub mod error;
pub mod snapshot;


pub use config::TrafficConfig;
pub use controller::{TickReport, TrafficController, TrafficSubscriber};
pub use error::{TrafficError, TrafficResult};
pub use snapshot::{PermanentBlocks, TrafficCost, TrafficSnapshot};
