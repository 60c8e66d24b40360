use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeliApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not refresh the access token: {0}")]
    TokenRefresh(String),
}

impl MeliApiError {
    /// True only for "resource does not exist (yet)" responses. Freshly approved orders can take a short while to
    /// become visible on the orders endpoint, so 404s are the one retryable failure class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::QueryError { status: 404, .. })
    }
}
