//! API Handlers
//!
//! The proxy handler that routes every page request through the cache
//! manager, plus the control endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::error::Result;
use crate::fetch::upstream_url;
use crate::models::{
    is_hop_by_hop, ClientMessage, FetchRequest, HealthResponse, MessageResponse, Notification,
    NotificationClickRequest, NotificationClickResponse, StatsResponse,
};
use crate::worker::{CacheManager, EvictionOutcome};

/// Largest request body accepted; larger bodies are rejected with 413
pub const MAX_PROXY_BODY: usize = 10 * 1024 * 1024; // 10 MB

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: CacheManager,
}

impl AppState {
    pub fn new(manager: CacheManager) -> Self {
        Self { manager }
    }
}

/// Fallback handler: every non-control request.
///
/// Rewrites the request onto the upstream origin and lets the cache manager
/// answer it. The body limit is enforced by the router.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = upstream_url(&state.manager.config().origin, path_and_query)?;

    let fetch_request = FetchRequest {
        method,
        url,
        headers: forwarded_headers(headers),
        body,
    };
    debug!(method = %fetch_request.method, url = %fetch_request.url, "Proxying request");

    let response = state.manager.serve(fetch_request).await;
    Ok(response.into_response())
}

/// Drops `Host` and connection-scoped headers before forwarding upstream.
fn forwarded_headers(mut headers: HeaderMap) -> HeaderMap {
    headers.remove(header::HOST);

    let hop_by_hop: Vec<_> = headers
        .keys()
        .filter(|name| is_hop_by_hop(name))
        .cloned()
        .collect();
    for name in hop_by_hop {
        headers.remove(name);
    }

    headers
}

/// Handler for GET /__offline/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.manager.status().await))
}

/// Handler for GET /__offline/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.manager.stats().await;
    Json(StatsResponse::new(&stats))
}

/// Handler for POST /__offline/evict
pub async fn evict_handler(State(state): State<AppState>) -> Json<EvictionOutcome> {
    Json(state.manager.evict_expired().await)
}

/// Handler for POST /__offline/messages
///
/// Payloads are validated before dispatch; malformed messages are rejected.
pub async fn message_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>> {
    let message = ClientMessage::parse(&body)?;
    Ok(Json(state.manager.handle_message(message).await))
}

/// Handler for POST /__offline/push
pub async fn push_handler(State(state): State<AppState>, body: Bytes) -> Json<Notification> {
    Json(state.manager.handle_push(&body))
}

/// Handler for POST /__offline/notification-click
pub async fn notification_click_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    let request: NotificationClickRequest = serde_json::from_slice(&body).unwrap_or_default();
    Json(NotificationClickResponse {
        open_url: state.manager.notification_click(request.url.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use url::Url;

    use crate::cache::MemoryStorage;
    use crate::clock::ManualClock;
    use crate::error::CacheError;
    use crate::fetch::Fetcher;
    use crate::models::FetchResponse;
    use crate::worker::ManagerConfig;

    /// Echoes the upstream URL and method back as the body, plus the names
    /// of any forwarded headers.
    struct EchoFetcher;

    #[async_trait]
    impl Fetcher for EchoFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
            let mut names: Vec<_> = request.headers.keys().map(|n| n.as_str()).collect();
            names.sort();
            let suffix = if names.is_empty() {
                String::new()
            } else {
                format!(" [{}]", names.join(","))
            };
            Ok(FetchResponse::ok(format!(
                "{} {}{}",
                request.method, request.url, suffix
            )))
        }
    }

    fn state() -> AppState {
        AppState::new(CacheManager::new(
            ManagerConfig {
                origin: Url::parse("http://upstream.test:3000").unwrap(),
                static_cache: "static-v1".to_string(),
                runtime_cache: "runtime-v1".to_string(),
                periodic_sweep: false,
                sweep_interval: Duration::from_secs(60),
            },
            Arc::new(MemoryStorage::new()),
            Arc::new(EchoFetcher),
            Arc::new(ManualClock::default()),
        ))
    }

    async fn proxy(uri: &str, headers: HeaderMap) -> String {
        let response = proxy_handler(
            State(state()),
            Method::GET,
            uri.parse().unwrap(),
            headers,
            Bytes::new(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_proxy_rewrites_onto_upstream() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "portal.example.org".parse().unwrap());

        let body = proxy("/en/events?page=2", headers).await;

        assert_eq!(body, "GET http://upstream.test:3000/en/events?page=2");
    }

    #[tokio::test]
    async fn test_proxy_never_leaves_upstream_origin() {
        let body = proxy("//evil.example/steal?x=1", HeaderMap::new()).await;

        assert_eq!(body, "GET http://upstream.test:3000//evil.example/steal?x=1");
    }

    #[tokio::test]
    async fn test_proxy_strips_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "keep-alive, upgrade".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert(header::TE, "trailers".parse().unwrap());
        headers.insert(header::UPGRADE, "websocket".parse().unwrap());
        headers.insert(header::ACCEPT, "text/html".parse().unwrap());

        let body = proxy("/en", headers).await;

        assert_eq!(body, "GET http://upstream.test:3000/en [accept]");
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.state, "parsed");
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(state())).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.runtime_entries, 0);
    }

    #[tokio::test]
    async fn test_message_handler_rejects_malformed() {
        let result = message_handler(State(state()), Bytes::from_static(b"{\"type\":1}")).await;
        assert!(matches!(result, Err(CacheError::InvalidMessage(_))));
    }

    #[tokio::test]
    async fn test_message_handler_unsupported_sweep() {
        let response = message_handler(
            State(state()),
            Bytes::from_static(br#"{"type":"REGISTER_PERIODIC_SWEEP"}"#),
        )
        .await
        .unwrap();
        assert!(!response.accepted);
    }

    #[tokio::test]
    async fn test_push_handler_defaults() {
        let response = push_handler(State(state()), Bytes::from_static(b"")).await;
        assert_eq!(response.url, "/");
    }
}
