// src/upstream/aggregator.rs
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::models::server::ServerTarget;
use crate::models::status::{RosterEntry, ServerMetadata, StatusPayload};

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Aggregator unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Aggregator answered HTTP {0}")]
    Http(u16),

    #[error("Malformed aggregator payload: {0}")]
    Parse(String),

    #[error("Aggregator has no record of this server")]
    NotFound,
}

/// Source of the high-level status payload for a server.
#[async_trait]
pub trait StatusFetch: Send + Sync {
    /// The aggregator's JSON body, untouched.
    async fn fetch_raw(&self, target: &ServerTarget) -> Result<Value, StatusError>;

    async fn fetch_status(&self, target: &ServerTarget) -> Result<StatusPayload, StatusError> {
        let raw = self.fetch_raw(target).await?;
        parse_payload(raw)
    }
}

pub struct AggregatorClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    default_port: u16,
}

impl AggregatorClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.aggregator_url.trim_end_matches('/').to_string(),
            timeout: config.status_timeout(),
            default_port: config.default_server_port,
        }
    }

    fn url_for(&self, target: &ServerTarget) -> String {
        format!("{}/{}", self.base_url, target.lookup_key(self.default_port))
    }
}

#[async_trait]
impl StatusFetch for AggregatorClient {
    async fn fetch_raw(&self, target: &ServerTarget) -> Result<Value, StatusError> {
        let url = self.url_for(target);
        info!("Requesting status from {}", url);

        let response = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                error!("Aggregator timed out for {}", target);
                return Err(e.into());
            }
            Err(e) => {
                error!("Aggregator request failed for {}: {}", target, e);
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("Aggregator returned {} for {}", status, target);
            return Err(StatusError::Http(status.as_u16()));
        }

        let body = response.bytes().await?;
        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            error!("Aggregator body for {} is not JSON: {}", target, e);
            StatusError::Parse(e.to_string())
        })?;

        debug!("Aggregator response for {}: online={:?}", target, value.get("online"));
        Ok(value)
    }
}

#[derive(Debug, Default)]
struct RawPlayers {
    online: u64,
    max: u64,
    list: Option<Vec<Value>>,
}

impl RawPlayers {
    /// Reads the `players` block field by field. Once `online` is known a
    /// malformed roster only costs the roster, never the whole status.
    fn from_value(value: Option<&Value>) -> Self {
        let players = match value {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => return Self::default(),
            Some(other) => {
                warn!("Ignoring players block that is not an object: {}", other);
                return Self::default();
            }
        };

        let count = |key: &str| players.get(key).and_then(Value::as_u64).unwrap_or(0);
        let list = match players.get("list") {
            Some(Value::Array(items)) => Some(items.clone()),
            Some(Value::Null) | None => None,
            Some(other) => {
                warn!("Ignoring player list that is not an array: {}", other);
                None
            }
        };

        Self {
            online: count("online"),
            max: count("max"),
            list,
        }
    }
}

/// Roster entries come either as objects or, from older API versions, as bare names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRosterItem {
    Structured {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        uuid: Option<String>,
    },
    Bare(String),
}

impl RawRosterItem {
    fn into_entry(self) -> Option<RosterEntry> {
        let (name, token) = match self {
            Self::Structured { name, uuid } => (name.unwrap_or_default(), uuid),
            Self::Bare(name) => (name, None),
        };
        if name.is_empty() {
            return None;
        }
        Some(RosterEntry {
            name,
            identity_token: token.filter(|t| !t.is_empty()),
        })
    }
}

fn normalize_roster(items: Vec<Value>) -> Vec<RosterEntry> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawRosterItem>(item) {
            Ok(raw) => raw.into_entry(),
            Err(e) => {
                warn!("Skipping unrecognised roster entry: {}", e);
                None
            }
        })
        .collect()
}

fn passthrough(data: &Map<String, Value>, key: &str) -> Option<Value> {
    data.get(key).filter(|v| !v.is_null()).cloned()
}

/// Normalises an aggregator body. A body without an `online` field means the
/// aggregator does not know the server.
pub fn parse_payload(raw: Value) -> Result<StatusPayload, StatusError> {
    let data = match raw {
        Value::Object(map) if map.contains_key("online") => map,
        _ => return Err(StatusError::NotFound),
    };

    let online = match &data["online"] {
        Value::Bool(b) => *b,
        Value::Null => false,
        other => return Err(StatusError::Parse(format!("online is not a boolean: {}", other))),
    };

    let players = RawPlayers::from_value(data.get("players"));

    let metadata = ServerMetadata {
        version: passthrough(&data, "version"),
        protocol: passthrough(&data, "protocol"),
        hostname: passthrough(&data, "hostname"),
        software: passthrough(&data, "software"),
        motd: passthrough(&data, "motd"),
        icon: passthrough(&data, "icon"),
    };

    Ok(StatusPayload {
        online,
        players_online: players.online,
        players_max: players.max,
        roster: players.list.map(normalize_roster),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_online_field_is_not_found() {
        assert!(matches!(parse_payload(json!({"ip": "1.2.3.4"})), Err(StatusError::NotFound)));
        assert!(matches!(parse_payload(json!([])), Err(StatusError::NotFound)));
    }

    #[test]
    fn offline_payload_has_no_roster() {
        let payload = parse_payload(json!({"online": false, "icon": "data:image/png;base64,AA=="})).unwrap();
        assert!(!payload.online);
        assert_eq!(payload.players_online, 0);
        assert!(payload.roster.is_none());
        assert_eq!(payload.metadata.icon, Some(json!("data:image/png;base64,AA==")));
    }

    #[test]
    fn structured_roster_keeps_order() {
        let payload = parse_payload(json!({
            "online": true,
            "players": {"online": 3, "max": 20, "list": [
                {"name": "Carol", "uuid": "u3"},
                {"name": "Alice", "uuid": "u1"},
                {"name": "Bob", "uuid": ""}
            ]}
        }))
        .unwrap();

        let roster = payload.roster.unwrap();
        let names: Vec<_> = roster.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Carol", "Alice", "Bob"]);
        assert_eq!(roster[0].identity_token.as_deref(), Some("u3"));
        assert_eq!(roster[2].identity_token, None);
    }

    #[test]
    fn bare_string_roster_keeps_order() {
        let payload = parse_payload(json!({
            "online": true,
            "players": {"online": 2, "max": 10, "list": ["Zed", "Amy"]}
        }))
        .unwrap();

        let roster = payload.roster.unwrap();
        assert_eq!(
            roster,
            vec![
                RosterEntry { name: "Zed".into(), identity_token: None },
                RosterEntry { name: "Amy".into(), identity_token: None },
            ]
        );
    }

    #[test]
    fn nameless_and_odd_entries_are_dropped() {
        let payload = parse_payload(json!({
            "online": true,
            "players": {"online": 3, "max": 10, "list": [{"uuid": "u9"}, 42, "Kim"]}
        }))
        .unwrap();

        let roster = payload.roster.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Kim");
    }

    #[test]
    fn null_metadata_is_treated_as_absent() {
        let payload = parse_payload(json!({"online": true, "version": null, "software": "Paper"})).unwrap();
        assert_eq!(payload.metadata.version, None);
        assert_eq!(payload.metadata.software, Some(json!("Paper")));
    }

    #[test]
    fn malformed_players_block_degrades_to_defaults() {
        let payload = parse_payload(json!({
            "online": true,
            "players": {"online": null, "max": "twenty", "list": {"name": "Alice"}}
        }))
        .unwrap();

        assert!(payload.online);
        assert_eq!(payload.players_online, 0);
        assert_eq!(payload.players_max, 0);
        assert!(payload.roster.is_none());

        let payload = parse_payload(json!({"online": true, "players": "none"})).unwrap();
        assert!(payload.online);
        assert_eq!(payload.players_online, 0);
    }

    #[test]
    fn non_boolean_online_is_a_parse_error() {
        assert!(matches!(parse_payload(json!({"online": "yes"})), Err(StatusError::Parse(_))));
    }
}
