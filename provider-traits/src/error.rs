use thiserror::Error;

/// Errors surfaced by provider adapters.
///
/// Adapters never retry; transport failures and non-success API responses
/// propagate to the caller unchanged so the sync engine can fail the scan.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
