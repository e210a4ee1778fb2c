use std::time::Duration;

/// Configuration for the pool.
///
/// ```
/// # use respool::PoolConfig;
/// # use std::time::Duration;
/// let mut config = PoolConfig::default();
/// assert_eq!(config.acquire_timeout, None);
/// config.acquire_timeout = Some(Duration::from_secs(5));
///
/// let built = PoolConfig::default().with_acquire_timeout(Duration::from_secs(5));
/// assert_eq!(built.acquire_timeout, config.acquire_timeout);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// How long [`crate::Pool::acquire`] waits for a resource before failing
    /// with [`crate::PoolError::Timeout`]. `None` waits forever.
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            acquire_timeout: None,
        }
    }
}

impl PoolConfig {
    /// Sets [`PoolConfig::acquire_timeout`].
    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = Some(acquire_timeout);
        self
    }
}
