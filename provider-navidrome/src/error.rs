use provider_traits::error::ProviderError;
use thiserror::Error;

/// Navidrome-specific errors
#[derive(Error, Debug)]
pub enum NavidromeError {
    #[error("Navidrome API error ({status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse Navidrome response: {0}")]
    ParseError(String),

    #[error("Navidrome authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl From<NavidromeError> for ProviderError {
    fn from(err: NavidromeError) -> Self {
        match err {
            NavidromeError::ApiError {
                status_code,
                message,
            } => ProviderError::Api {
                status: status_code,
                message,
            },
            NavidromeError::ParseError(msg) => ProviderError::Parse(msg),
            NavidromeError::AuthenticationFailed(msg) => ProviderError::AuthenticationFailed(msg),
        }
    }
}
