// src/main.rs
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use governor::RateLimiter;
use log::info;
use mcmon::config::Config;
use mcmon::handlers::{self, admin::LoginRateLimiter};
use mcmon::service::StatusService;
use mcmon::storage::memory::SessionStore;
use mcmon::upstream::{self, ProfileClient};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger only once at the start
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    info!("=== Minecraft server monitor starting ===");

    let config = Config::from_env();
    let bind = config.bind();

    let client = upstream::http_client();
    let service = web::Data::new(StatusService::from_config(client.clone(), &config));
    let profiles = web::Data::new(ProfileClient::new(client, &config));
    let sessions = web::Data::new(SessionStore::new(&config));

    let login_rate_limiter: web::Data<LoginRateLimiter> =
        web::Data::new(RateLimiter::keyed(config.login_quota()));

    info!(
        "Default target {}:{}, aggregator {}",
        config.default_server_address, config.default_server_port, config.aggregator_url
    );
    let config = web::Data::new(config);

    info!("Starting server on {}", bind);
    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .app_data(service.clone())
            .app_data(profiles.clone())
            .app_data(sessions.clone())
            .app_data(login_rate_limiter.clone())
            .configure(handlers::routes)
    })
        .bind(&bind)?
        .run().await
}
