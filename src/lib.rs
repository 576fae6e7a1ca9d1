//! Offline Cache - A caching reverse proxy for offline-capable web portals
//!
//! Keeps a static and a runtime cache store, serves stale-while-revalidate
//! static assets and network-first pages, falls back to locale offline pages
//! and evicts stale runtime entries on a 24-hour / 30-day schedule.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod policy;
pub mod tasks;
pub mod worker;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_sweep_task;
pub use worker::CacheManager;
