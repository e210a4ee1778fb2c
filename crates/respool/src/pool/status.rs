/// Snapshot of the pool's counters, taken under a single lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Number of tracked resources, idle and in use.
    pub size: usize,
    /// Number of idle resources.
    pub available: usize,
    /// Number of resources currently acquired.
    pub in_use: usize,
    /// Number of acquisitions queued for a resource.
    pub waiting: usize,
}
