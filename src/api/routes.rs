//! API Routes
//!
//! Configures the Axum router: control endpoints under `/__offline`, every
//! other path proxied through the cache manager.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    evict_handler, health_handler, message_handler, notification_click_handler, proxy_handler,
    push_handler, stats_handler, AppState, MAX_PROXY_BODY,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /__offline/health` - Health and lifecycle state
/// - `GET /__offline/stats` - Cache statistics
/// - `POST /__offline/evict` - Run the gated eviction pass
/// - `POST /__offline/messages` - Client messages
/// - `POST /__offline/push` - Push payload to notification
/// - `POST /__offline/notification-click` - Notification click target
/// - anything else - proxied through the cache manager
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let control = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/evict", post(evict_handler))
        .route("/messages", post(message_handler))
        .route("/push", post(push_handler))
        .route("/notification-click", post(notification_click_handler))
        .layer(cors);

    Router::new()
        .nest("/__offline", control)
        .fallback(proxy_handler)
        .layer(DefaultBodyLimit::max(MAX_PROXY_BODY))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
