//! Inbound message payloads
//!
//! Messages from clients and push payloads are validated here, at the
//! boundary, before the cache manager dispatches on them.

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Message posted by a client page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Ask for the periodic background sweep to be registered
    RegisterPeriodicSweep {
        #[serde(default)]
        min_interval_secs: Option<u64>,
    },
    /// Ask a waiting version to take over immediately
    SkipWaiting,
}

impl ClientMessage {
    /// Parses and validates a raw JSON message.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let message: ClientMessage =
            serde_json::from_slice(raw).map_err(|e| CacheError::InvalidMessage(e.to_string()))?;

        if let ClientMessage::RegisterPeriodicSweep {
            min_interval_secs: Some(0),
        } = message
        {
            return Err(CacheError::InvalidMessage(
                "min_interval_secs must be greater than zero".to_string(),
            ));
        }

        Ok(message)
    }
}

/// Payload carried by a push event. Every field is optional; blank
/// values are treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PushPayload {
    /// Parses a raw push payload. Only non-JSON or non-object input fails.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let payload: PushPayload =
            serde_json::from_slice(raw).map_err(|e| CacheError::InvalidMessage(e.to_string()))?;

        Ok(Self {
            title: non_blank(payload.title),
            body: non_blank(payload.body),
            url: non_blank(payload.url),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Request body for a notification click.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationClickRequest {
    #[serde(default)]
    pub url: Option<String>,
}
