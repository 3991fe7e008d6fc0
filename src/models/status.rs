// src/models/status.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::server::ServerTarget;

/// One connected player as reported by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub identity_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedPlayer {
    pub name: String,
    #[serde(rename = "uuid")]
    pub identity_token: Option<String>,
    /// `data:` URI of the player's head, if any provider answered.
    #[serde(rename = "avatar")]
    pub image_data: Option<String>,
}

impl EnrichedPlayer {
    pub fn new(entry: RosterEntry, image_data: Option<String>) -> Self {
        Self {
            name: entry.name,
            identity_token: entry.identity_token,
            image_data,
        }
    }
}

/// Fields copied verbatim from the aggregator payload when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,
}

/// Normalised aggregator response. The roster is already reduced to
/// `RosterEntry` regardless of the upstream shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusPayload {
    pub online: bool,
    pub players_online: u64,
    pub players_max: u64,
    pub roster: Option<Vec<RosterEntry>>,
    pub metadata: ServerMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub online: u64,
    pub max: u64,
    pub list: Vec<EnrichedPlayer>,
}

/// The document returned to clients for one status request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDocument {
    pub online: bool,
    #[serde(rename = "server")]
    pub host: String,
    pub port: u16,
    pub timestamp: DateTime<Utc>,
    pub players: PlayerSummary,
    #[serde(flatten)]
    pub metadata: ServerMetadata,
    #[serde(rename = "ping", skip_serializing_if = "Option::is_none")]
    pub ping_ms: Option<u64>,
    pub error: Option<String>,
}

impl StatusDocument {
    /// Offline, error-free document with every optional field unset.
    pub fn base(target: &ServerTarget) -> Self {
        Self {
            online: false,
            host: target.host.clone(),
            port: target.port,
            timestamp: Utc::now(),
            players: PlayerSummary::default(),
            metadata: ServerMetadata::default(),
            ping_ms: None,
            error: None,
        }
    }

    pub fn failed(target: &ServerTarget, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn offline_document_serializes_null_error() {
        let doc = StatusDocument::base(&ServerTarget::new("mc.example", 25565));
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["online"], json!(false));
        assert_eq!(value["server"], json!("mc.example"));
        assert_eq!(value["error"], Value::Null);
        assert_eq!(value["players"], json!({"online": 0, "max": 0, "list": []}));
        assert!(value.get("ping").is_none());
        assert!(value.get("version").is_none());
        assert!(value.get("icon").is_none());
    }

    #[test]
    fn metadata_is_flattened_into_document() {
        let mut doc = StatusDocument::base(&ServerTarget::new("mc.example", 25565));
        doc.metadata.version = Some(json!("1.20.4"));
        doc.ping_ms = Some(12);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["version"], json!("1.20.4"));
        assert_eq!(value["ping"], json!(12));
    }

    #[test]
    fn enriched_player_uses_wire_names() {
        let player = EnrichedPlayer::new(
            RosterEntry { name: "Alice".into(), identity_token: None },
            Some("data:image/png;base64,AA==".into()),
        );
        let value = serde_json::to_value(&player).unwrap();
        assert_eq!(value, json!({"name": "Alice", "uuid": null, "avatar": "data:image/png;base64,AA=="}));
    }
}
