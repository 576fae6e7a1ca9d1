//! Background Tasks Module
//!
//! Contains background tasks that run periodically during proxy operation.
//!
//! # Tasks
//! - Periodic sweep: runs the gated runtime cache eviction at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
