// src/handlers/status.rs
use actix_web::{web, HttpResponse};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::models::server::ServerTarget;
use crate::service::StatusService;
use crate::upstream::{ProfileClient, ProfileError};
use crate::utils::{preview, RequestError};

#[derive(Deserialize)]
pub struct StatusQuery {
    server: Option<String>,
}

impl StatusQuery {
    fn target(&self, config: &Config) -> ServerTarget {
        match self.server.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(address) => ServerTarget::parse(address, config.default_server_port),
            None => ServerTarget::new(config.default_server_address.clone(), config.default_server_port),
        }
    }
}

pub async fn get_status(
    service: web::Data<StatusService>,
    config: web::Data<Config>,
    query: web::Query<StatusQuery>,
) -> HttpResponse {
    let target = query.target(&config);
    info!("Status request for {}", target);

    let doc = service.get_status(&target).await;
    HttpResponse::Ok().json(doc)
}

/// Raw aggregator body next to a fresh probe, for troubleshooting.
pub async fn debug_status(
    service: web::Data<StatusService>,
    config: web::Data<Config>,
    query: web::Query<StatusQuery>,
) -> HttpResponse {
    let target = query.target(&config);

    let raw = match service.fetcher().fetch_raw(&target).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Debug fetch for {} failed: {}", target, e);
            return HttpResponse::BadGateway().json(json!({
                "status": "error",
                "message": "API connection failed",
            }));
        }
    };

    let probe = service.prober().probe(&target).await.ok();

    let mut keys: Vec<&String> = raw.as_object().map(|o| o.keys().collect()).unwrap_or_default();
    keys.sort();

    HttpResponse::Ok().json(json!({
        "status": "success",
        "raw_api_response": &raw,
        "ping_info": {
            "minecraft_ping": probe.map(|p| p.calibrated_latency_ms),
            "raw_ping": probe.map(|p| p.raw_latency_ms),
        },
        "online": raw.get("online"),
        "available_keys": keys,
    }))
}

pub async fn test_avatar(service: web::Data<StatusService>, path: web::Path<String>) -> HttpResponse {
    let uuid = path.into_inner();
    let avatar = service.avatars().resolve(Some(&uuid)).await;

    let mut body = json!({
        "uuid": uuid,
        "has_avatar": avatar.is_some(),
    });
    if let Some(avatar) = avatar {
        body["avatar_preview"] = json!(preview(&avatar, 100));
    }
    HttpResponse::Ok().json(body)
}

pub async fn test_player(
    service: web::Data<StatusService>,
    profile_client: web::Data<ProfileClient>,
    path: web::Path<String>,
) -> Result<HttpResponse, RequestError> {
    let username = path.into_inner();

    let profile = match profile_client.lookup(&username).await {
        Ok(profile) => profile,
        Err(ProfileError::Http(status)) => {
            return Err(RequestError::ProfileNotFound { username, status });
        }
        Err(e) => {
            return Err(RequestError::Upstream { username, message: e.to_string() });
        }
    };

    let uuid_full = profile.hyphenated_id();
    let avatar = service.avatars().resolve(Some(&uuid_full)).await;

    Ok(HttpResponse::Ok().json(json!({
        "username": username,
        "uuid_short": profile.id,
        "uuid_full": uuid_full,
        "has_avatar": avatar.is_some(),
    })))
}
