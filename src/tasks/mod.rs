//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside request handling.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired entries from every cache role
//! - Warming: Warms the caches at startup and on a schedule

mod cleanup;
mod warming;

pub use cleanup::spawn_cleanup_task;
pub use warming::spawn_warming_task;
