//! Error types for trigger store operations

use thiserror::Error;

/// Trigger store errors
#[derive(Debug, Error)]
pub enum LinkError {
    /// Regex body failed to compile
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        /// Pattern as the user supplied it
        pattern: String,
        /// Compiler error
        source: regex::Error,
    },

    /// Nothing left to match on after trimming
    #[error("trigger pattern is empty")]
    EmptyPattern,

    /// Request was malformed before it reached the store
    #[error("unrecognized request: {0}")]
    Usage(String),

    /// Neither a trigger nor a target matched the query
    #[error("no trigger phrases or links matching `{0}`")]
    NotFound(String),

    /// A stored record could not be encoded or decoded
    #[error("trigger record `{key}` is invalid: {source}")]
    Record {
        /// Store key of the record
        key: String,
        /// Serialization error
        source: serde_json::Error,
    },

    /// Persistence backend failure
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, LinkError>;
