use core_library::LibraryError;
use provider_traits::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Server not found: {0}")]
    ServerNotFound(i64),

    #[error("No provider registered for server kind: {0}")]
    ProviderNotRegistered(String),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Scan queue is closed")]
    QueueClosed,

    #[error("Invalid scan phase transition: {from} -> {to}")]
    InvalidPhaseTransition { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
