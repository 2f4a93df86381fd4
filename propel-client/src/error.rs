//! Client error types

use thiserror::Error;

/// Errors returned by a Propel API call
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The API answered with GraphQL errors
    #[error("{0}")]
    Graphql(String),

    /// The request never produced an answer
    #[error("transport error: {0}")]
    Transport(String),

    /// The answer could not be decoded into the expected type
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn graphql(message: impl Into<String>) -> Self {
        Self::Graphql(message.into())
    }

    /// The API reports missing resources with "not found" in the error text
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::Graphql(message) => message.contains("not found"),
            _ => false,
        }
    }
}

/// Result type for API calls
pub type ClientResult<T> = Result<T, ClientError>;
