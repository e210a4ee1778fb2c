#![deny(missing_docs)]
#![doc = include_str!("../../../README.md")]

mod pool;
mod registry;
mod resource;

pub use pool::{Acquire, Pool, PoolConfig, PoolError, PoolResult, PoolStatus};
pub use resource::Resource;
