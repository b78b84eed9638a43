//! Host action errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host action failed: {0}")]
    ActionFailed(String),

    #[error("Unsupported platform: {0}")]
    Unsupported(String),
}
