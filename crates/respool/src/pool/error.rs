/// Result of waiting on a [`crate::Pool`].
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur when using a [`crate::Pool`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No resource became available within the configured
    /// [`crate::PoolConfig::acquire_timeout`].
    #[error("Timed out waiting for a resource")]
    Timeout,
}

impl From<tokio::time::error::Elapsed> for PoolError {
    fn from(_error: tokio::time::error::Elapsed) -> Self {
        PoolError::Timeout
    }
}
