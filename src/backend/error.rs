//! Backend error types

use thiserror::Error;

/// Failure talking to the Ghostwriter backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection failures, timeouts
    #[error("Ghostwriter request failed: {0}")]
    Network(String),
    /// 401/403 from the GraphQL endpoint
    #[error("Ghostwriter rejected the API token: {0}")]
    Auth(String),
    /// Any other non-success HTTP status
    #[error("Ghostwriter returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The `errors` array of a GraphQL response
    #[error("GraphQL error: {0}")]
    Graphql(String),
    /// The response did not have the expected shape
    #[error("Unexpected Ghostwriter response: {0}")]
    Malformed(String),
    #[error("{0}")]
    NotFound(String),
    /// Request rejected before it was sent
    #[error("{0}")]
    InvalidInput(String),
}

impl BackendError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
