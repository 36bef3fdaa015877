/// Errors produced when publishing to the message bus.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The bus could not be reached.
    #[error("message bus unavailable: {0}")]
    Unavailable(String),
}

/// Convenience alias used throughout the events crate.
pub type PublishResult<T> = Result<T, PublishError>;
