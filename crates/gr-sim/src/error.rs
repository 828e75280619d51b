use gr_agent::AgentError;
use gr_core::CoreError;
use gr_traffic::TrafficError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("agent setup failed: {0}")]
    Agent(#[from] AgentError),

    #[error("traffic setup failed: {0}")]
    Traffic(#[from] TrafficError),
}

pub type SimResult<T> = Result<T, SimError>;
