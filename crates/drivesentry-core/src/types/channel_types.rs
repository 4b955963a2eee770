//! Change-watch channel and notification tunnel record types

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header the provider stamps on change-channel callbacks; a tunnel record
/// whose raw response carries it is a qualifying notification.
pub const CHANNEL_ID_HEADER: &str = "x-goog-channel-id";

/// Registration payload for a provider-side change watch.
///
/// Built once per push session and never mutated; the provider owns the
/// channel's lifecycle and stops delivering after `expiration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchChannel {
    pub payload: bool,
    pub id: String,
    pub resource_id: String,
    pub resource_uri: String,
    pub token: String,
    /// Unix-millisecond timestamp, as a string on the wire
    pub expiration: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    pub address: String,
    pub params: HashMap<String, String>,
    pub kind: String,
}

impl WatchChannel {
    /// Build a webhook channel delivering to `address`, expiring in 24h
    pub fn new(
        address: impl Into<String>,
        resource_id: impl Into<String>,
        resource_uri: impl Into<String>,
    ) -> Self {
        let expiration = (Utc::now() + Duration::days(1)).timestamp_millis();
        Self {
            payload: false,
            id: uuid::Uuid::new_v4().to_string(),
            resource_id: resource_id.into(),
            resource_uri: resource_uri.into(),
            token: String::new(),
            expiration: expiration.to_string(),
            channel_type: "webhook".to_string(),
            address: address.into(),
            params: HashMap::new(),
            kind: "api#channel".to_string(),
        }
    }
}

/// One JSON record emitted by the notification tunnel, one per line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TunnelRecord {
    #[serde(default)]
    pub protocol: String,
    #[serde(default, rename = "raw-response")]
    pub raw_response: String,
}

impl TunnelRecord {
    /// True iff this record is an HTTP interaction carrying the provider's
    /// change-channel header
    pub fn is_channel_notification(&self) -> bool {
        self.protocol == "http" && self.raw_response.contains(CHANNEL_ID_HEADER)
    }
}
