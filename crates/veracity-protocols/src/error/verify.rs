//! Verification service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// Non-2xx response from the service. The display text keeps the
    /// status code so the panel's inline error names it.
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("{0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),
}
