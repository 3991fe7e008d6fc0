// src/upstream/profiles.rs
use log::{error, info};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile lookup failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Profile API returned HTTP {0}")]
    Http(u16),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    /// Undashed identity as returned by the profile API.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Profile {
    /// The identity in canonical 8-4-4-4-12 form when it is a 32-digit hex id.
    pub fn hyphenated_id(&self) -> String {
        hyphenate(&self.id)
    }
}

pub fn hyphenate(id: &str) -> String {
    if id.len() == 32 {
        if let Ok(parsed) = Uuid::parse_str(id) {
            return parsed.hyphenated().to_string();
        }
    }
    id.to_string()
}

/// Resolves a player name to its identity token.
pub struct ProfileClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ProfileClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.profile_lookup_url.trim_end_matches('/').to_string(),
            timeout: config.avatar_timeout(),
        }
    }

    pub async fn lookup(&self, username: &str) -> Result<Profile, ProfileError> {
        let url = format!("{}/{}", self.base_url, username);
        let response = self.client.get(&url).timeout(self.timeout).send().await.map_err(|e| {
            error!("Profile lookup for {} failed: {}", username, e);
            e
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            info!("Profile lookup for {} returned {}", username, status);
            return Err(ProfileError::Http(status.as_u16()));
        }

        Ok(response.json::<Profile>().await?)
    }
}
