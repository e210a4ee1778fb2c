mod acquire;
mod config;
mod error;
mod status;

use std::sync::Arc;

use tokio::time::Instant;

use crate::{
    Resource,
    registry::{Acquired, Registry},
};

pub use acquire::Acquire;
pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use status::PoolStatus;

/// Pool of caller-created resource handles.
///
/// Handles are added with [`Pool::add`], borrowed with [`Pool::acquire`] and
/// given back with [`Pool::release`]. When nothing is idle, acquisitions
/// queue up and are served in the order they were made. The pool never
/// creates or destroys the resources behind the handles.
///
/// # Examples
/// ```
/// use respool::{Pool, PoolConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = PoolConfig::default().with_acquire_timeout(Duration::from_secs(1));
///     let pool = Pool::new(config);
///
///     pool.add("connection-1");
///
///     // Take the idle connection.
///     let connection = pool.acquire().await.unwrap();
///     assert_eq!(pool.available(), 0);
///
///     // Wait for a connection, it is handed over as soon as one is released.
///     let waiting = pool.acquire();
///     pool.release(connection);
///     assert_eq!(waiting.await.unwrap(), "connection-1");
///
///     // The pool forgets about a removed connection, even one in use.
///     assert!(pool.remove(&"connection-1"));
///     assert_eq!(pool.size(), 0);
/// }
/// ```
pub struct Pool<R> {
    inner: Arc<PoolInner<R>>,
}

struct PoolInner<R> {
    registry: Registry<R>,
    config: PoolConfig,
}

impl<R: Resource> Pool<R> {
    /// Create an empty pool with a [`PoolConfig`].
    pub fn new(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                registry: Registry::new(),
                config,
            }),
        }
    }

    /// Add a resource to the pool. If an acquisition is waiting the resource
    /// goes straight to the oldest one, otherwise it becomes available.
    ///
    /// Returns `false` and does nothing if the resource is already in the
    /// pool, idle or in use.
    pub fn add(&self, resource: R) -> bool {
        self.inner.registry.add(resource)
    }

    /// Remove a resource from the pool, whether it is idle or in use.
    /// Returns `false` if the pool was not tracking it.
    ///
    /// Waiting acquisitions are not affected. Releasing a removed resource
    /// later does nothing.
    pub fn remove(&self, resource: &R) -> bool {
        self.inner.registry.remove(resource)
    }

    /// Acquire a resource from the pool.
    ///
    /// If a resource is available it is marked as in use before this method
    /// returns. Otherwise the request joins the back of the queue and the
    /// [`PoolConfig::acquire_timeout`] starts counting now. The returned
    /// [`Acquire`] future resolves to the resource, or to
    /// [`PoolError::Timeout`].
    ///
    /// Once its deadline passes a queued request is skipped by [`Pool::add`]
    /// and [`Pool::release`], whether or not its future is being polled.
    pub fn acquire(&self) -> Acquire<R> {
        let deadline = self
            .inner
            .config
            .acquire_timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));
        match self.inner.registry.acquire(deadline) {
            Acquired::Now(resource, lease) => {
                Acquire::ready(self.inner.clone(), resource, lease)
            }
            Acquired::Queued(id, receiver) => {
                Acquire::waiting(self.inner.clone(), id, receiver, deadline)
            }
        }
    }

    /// Acquire a resource and pass the outcome to `callback`.
    ///
    /// The pool is updated as in [`Pool::acquire`] before this returns. The
    /// callback always runs exactly once, on a spawned tokio task, so it
    /// never runs inside this call or inside the [`Pool::add`] or
    /// [`Pool::release`] that serves it. Must be called from within a tokio
    /// runtime.
    pub fn acquire_with<F>(&self, callback: F)
    where
        R: Send + 'static,
        F: FnOnce(PoolResult<R>) + Send + 'static,
    {
        let acquire = self.acquire();
        tokio::spawn(async move { callback(acquire.await) });
    }

    /// Give an acquired resource back. It goes to the oldest waiting
    /// acquisition, or becomes available if nothing is waiting.
    ///
    /// Resources that are not in use, for example ones that were removed or
    /// already released, are ignored.
    pub fn release(&self, resource: R) {
        self.inner.registry.release(resource);
    }

    /// Whether the pool tracks the resource, idle or in use.
    pub fn contains(&self, resource: &R) -> bool {
        self.inner.registry.contains(resource)
    }

    /// Number of idle resources.
    pub fn available(&self) -> usize {
        self.status().available
    }

    /// Number of tracked resources, idle and in use.
    pub fn size(&self) -> usize {
        self.status().size
    }

    /// Number of resources currently acquired.
    pub fn in_use(&self) -> usize {
        self.status().in_use
    }

    /// Number of acquisitions waiting for a resource. Requests past their
    /// deadline are not counted.
    pub fn waiting(&self) -> usize {
        self.status().waiting
    }

    /// All counters at once.
    pub fn status(&self) -> PoolStatus {
        self.inner.registry.status()
    }
}

impl<R: Resource> Default for Pool<R> {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl<R> Clone for Pool<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Resource> std::fmt::Debug for Pool<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pool {{ status: {:?} }}", self.status())
    }
}
