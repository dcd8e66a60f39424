use provider_traits::error::ProviderError;
use thiserror::Error;

/// Jellyfin-specific errors
#[derive(Error, Debug)]
pub enum JellyfinError {
    #[error("Jellyfin API error ({status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse Jellyfin response: {0}")]
    ParseError(String),

    #[error("Jellyfin authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl From<JellyfinError> for ProviderError {
    fn from(err: JellyfinError) -> Self {
        match err {
            JellyfinError::ApiError {
                status_code,
                message,
            } => ProviderError::Api {
                status: status_code,
                message,
            },
            JellyfinError::ParseError(msg) => ProviderError::Parse(msg),
            JellyfinError::AuthenticationFailed(msg) => ProviderError::AuthenticationFailed(msg),
        }
    }
}
