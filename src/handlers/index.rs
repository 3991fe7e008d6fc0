// src/handlers/index.rs
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::Config;

pub async fn index(config: web::Data<Config>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "server_address": config.default_server_address,
        "server_port": config.default_server_port,
    }))
}
