use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("content store error: {0}")]
    Store(#[from] claimsync_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] claimsync_index::IndexError),

    #[error("publish error: {0}")]
    Publish(#[from] claimsync_events::PublishError),

    #[error("invalid claim: {0}")]
    Validation(#[from] claimsync_types::TypeError),

    #[error("stage '{stage}' ran without {missing} in its context")]
    MissingContext {
        stage: &'static str,
        missing: &'static str,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
