use std::time::Duration;

use thiserror::Error;

use gr_core::Cell;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {agent:?}: cell {cell} is not a road node")]
    NotRoutable { agent: String, cell: Cell },
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Failure to obtain a proposal from an oracle.  Always recovered from by
/// falling back to the reference route; never surfaces from the simulation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),

    #[error("oracle unavailable")]
    Unavailable,
}
