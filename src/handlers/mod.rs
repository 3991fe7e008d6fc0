// src/handlers/mod.rs
pub mod admin;
pub mod index;
pub mod status;

use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index::index))
        .route("/api/status", web::get().to(status::get_status))
        .route("/api/debug", web::get().to(status::debug_status))
        .route("/api/test/avatar/{uuid}", web::get().to(status::test_avatar))
        .route("/api/test/player/{username}", web::get().to(status::test_player))
        .service(
            web::resource("/admin/login")
                .route(web::get().to(admin::login_page))
                .route(web::post().to(admin::login)),
        )
        .service(
            web::resource("/admin")
                .route(web::get().to(admin::panel))
                .route(web::post().to(admin::post_message)),
        )
        .route("/admin/logout", web::get().to(admin::logout));
}
