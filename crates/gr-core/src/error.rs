//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` where a core
//! parse or configuration failure can surface through them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `gr-core`.
pub type CoreResult<T> = Result<T, CoreError>;
