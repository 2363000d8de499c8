//! Redis storage implementation
//!
//! ## Module Structure
//!
//! - `pool` - Connection management, connected flag and health monitoring
//! - `cache` - Key operations (set with expiry, pttl, expire, delete, scan)
//! - `sorted_set` - Sorted set operations
//! - `atomic` - Atomic limiter primitives (MULTI pipeline and Lua scripts)
//! - `scripts` - Lua sources
//! - `store` - `CounterStore` implementation
//! - `tests` - Module tests

mod atomic;
mod cache;
mod pool;
mod scripts;
mod sorted_set;
mod store;

pub use pool::RedisStore;
