//! API Module
//!
//! HTTP handlers and routing for the caching proxy.
//!
//! # Endpoints
//! - `GET /__offline/health` - Health and lifecycle state
//! - `GET /__offline/stats` - Cache statistics
//! - `POST /__offline/evict` - Run the gated eviction pass
//! - `POST /__offline/messages` - Client messages
//! - `POST /__offline/push` - Push payload to notification
//! - `POST /__offline/notification-click` - Notification click target
//! - `*` - Proxied through the cache manager

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
