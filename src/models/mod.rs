//! Value types for the offline cache
//!
//! Fetch request/response descriptors, inbound message payloads and the
//! JSON bodies of the control endpoints.

pub mod fetch;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use fetch::{is_hop_by_hop, FetchRequest, FetchResponse, ResponseType};
pub use requests::{ClientMessage, NotificationClickRequest, PushPayload};
pub use responses::{
    HealthResponse, MessageResponse, Notification, NotificationClickResponse, StatsResponse,
};
