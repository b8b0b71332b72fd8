//! API-key checks for pushed fills.

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing {API_KEY_HEADER} header")]
    MissingKey,
    #[error("invalid API key")]
    InvalidKey,
}

/// Validates the provided API key against the configured one.
///
/// With no configured key the endpoint is open and every request passes.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AuthError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match provided {
        None => Err(AuthError::MissingKey),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(AuthError::InvalidKey),
    }
}
