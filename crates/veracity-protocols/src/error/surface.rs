//! Surface lifecycle errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Surface already started")]
    AlreadyStarted,

    #[error("Surface disposed")]
    Disposed,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert!(SurfaceError::AlreadyStarted.to_string().contains("already started"));
        assert!(SurfaceError::Disposed.to_string().contains("disposed"));
        assert!(SurfaceError::Internal("boom".to_string()).to_string().contains("boom"));
    }
}
