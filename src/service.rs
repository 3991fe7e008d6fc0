// src/service.rs
use futures::future::join_all;
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::avatar::AvatarResolver;
use crate::config::Config;
use crate::models::server::ServerTarget;
use crate::models::status::{EnrichedPlayer, StatusDocument, StatusPayload};
use crate::protocol::{HandshakeProber, LatencyProbe};
use crate::upstream::{AggregatorClient, StatusFetch};

/// Builds a `StatusDocument` for one server: aggregator status, then a single
/// latency probe and one avatar lookup per player when the server is online.
/// Holds no per-request state.
pub struct StatusService {
    fetcher: Arc<dyn StatusFetch>,
    prober: Arc<dyn LatencyProbe>,
    avatars: Arc<AvatarResolver>,
}

pub fn not_found_message(target: &ServerTarget) -> String {
    format!("Server not found ({})", target.host)
}

impl StatusService {
    pub fn new(
        fetcher: Arc<dyn StatusFetch>,
        prober: Arc<dyn LatencyProbe>,
        avatars: Arc<AvatarResolver>,
    ) -> Self {
        Self { fetcher, prober, avatars }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            Arc::new(AggregatorClient::new(client.clone(), config)),
            Arc::new(HandshakeProber::new(config)),
            Arc::new(AvatarResolver::from_config(client, config)),
        )
    }

    pub fn fetcher(&self) -> &dyn StatusFetch {
        self.fetcher.as_ref()
    }

    pub fn prober(&self) -> &dyn LatencyProbe {
        self.prober.as_ref()
    }

    pub fn avatars(&self) -> &AvatarResolver {
        &self.avatars
    }

    pub async fn get_status(&self, target: &ServerTarget) -> StatusDocument {
        let payload = match self.fetcher.fetch_status(target).await {
            Ok(payload) => payload,
            Err(e) => {
                error!("Could not determine status of {}: {}", target, e);
                return StatusDocument::failed(target, not_found_message(target));
            }
        };

        let doc = if payload.online {
            self.online_document(target, payload).await
        } else {
            info!("Server {} is offline", target);
            offline_document(target, payload)
        };

        debug!(
            "Status for {}: online={} players={}/{} ping={:?}",
            target, doc.online, doc.players.online, doc.players.max, doc.ping_ms
        );
        doc
    }

    async fn online_document(&self, target: &ServerTarget, payload: StatusPayload) -> StatusDocument {
        let mut doc = StatusDocument::base(target);
        doc.online = true;
        doc.metadata = payload.metadata;
        doc.players.online = payload.players_online;
        doc.players.max = payload.players_max;

        match self.prober.probe(target).await {
            Ok(result) => doc.ping_ms = Some(result.calibrated_latency_ms),
            Err(e) => warn!("Ping unavailable for {}: {}", target, e),
        }

        if payload.players_online > 0 {
            if let Some(roster) = payload.roster {
                // join_all yields results in input order
                let lookups = roster.into_iter().map(move |entry| async move {
                    let image = self.avatars.resolve(entry.identity_token.as_deref()).await;
                    info!("Player {} (uuid: {:?})", entry.name, entry.identity_token);
                    EnrichedPlayer::new(entry, image)
                });
                doc.players.list = join_all(lookups).await;
            }
        }

        doc
    }
}

fn offline_document(target: &ServerTarget, payload: StatusPayload) -> StatusDocument {
    let mut doc = StatusDocument::base(target);
    doc.metadata.icon = payload.metadata.icon;
    doc.metadata.motd = payload.metadata.motd;
    doc
}
