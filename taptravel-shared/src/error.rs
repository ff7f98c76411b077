/// Failure of a single call to the ticketing backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend rejected request (status {status}): {message}")]
    Rejected {
        status: u16,
        message: String,
    },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}
