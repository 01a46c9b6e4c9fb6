use sape_api::ApiError;
use sape_shared::ValidationError;
use sape_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the entity stores and the composition root.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A background storage task panicked or was cancelled.
    #[error("Storage task failed: {0}")]
    Task(String),

    #[error("The {0} store has not been loaded yet")]
    NotLoaded(&'static str),

    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("A {kind} with id {id} already exists")]
    DuplicateId { kind: &'static str, id: String },

    #[error("The {0} record has no id")]
    MissingId(&'static str),

    #[error("No user is logged in")]
    NoSession,
}

pub type Result<T> = std::result::Result<T, ClientError>;
