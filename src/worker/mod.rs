//! Worker Module
//!
//! The cache lifecycle manager, its state machine and the eviction clocks.

pub mod eviction;
pub mod lifecycle;
mod manager;

pub use eviction::{EvictionGate, EvictionOutcome};
pub use lifecycle::{transition, Effect, LifecycleEvent, Transition, WorkerState};
pub use manager::{
    CacheManager, ManagerConfig, DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_TITLE,
    DEFAULT_NOTIFICATION_URL,
};
