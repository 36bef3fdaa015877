use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty address")]
    EmptyAddress,

    #[error("malformed claim: {0}")]
    MalformedClaim(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
