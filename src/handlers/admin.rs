// src/handlers/admin.rs
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{clock::DefaultClock, RateLimiter};
use log::{error, info, warn};
use serde::Deserialize;
use std::net::IpAddr;

use crate::config::Config;
use crate::storage::memory::SessionStore;
use crate::utils::{client_ip, escape_html, log_all_headers, RequestError};

pub type LoginRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

pub const SESSION_COOKIE: &str = "admin_session";

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    message: String,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

fn render_login(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<p class=\"error\">{}</p>", escape_html(e)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html><html><head><title>Admin login</title></head><body>\
         <h1>Admin login</h1>{}\
         <form method=\"post\" action=\"/admin/login\">\
         <input type=\"password\" name=\"password\" autofocus>\
         <button type=\"submit\">Log in</button></form></body></html>",
        error
    )
}

fn render_panel(message: &str) -> String {
    let sent = if message.is_empty() {
        String::new()
    } else {
        format!("<p>Sent: {}</p>", escape_html(message))
    };
    format!(
        "<!DOCTYPE html><html><head><title>Admin</title></head><body>\
         <h1>Admin panel</h1>{}\
         <form method=\"post\" action=\"/admin\">\
         <textarea name=\"message\"></textarea>\
         <button type=\"submit\">Send</button></form>\
         <a href=\"/admin/logout\">Log out</a></body></html>",
        sent
    )
}

fn is_authenticated(req: &HttpRequest, sessions: &SessionStore) -> bool {
    req.cookie(SESSION_COOKIE)
        .map(|c| sessions.is_valid(c.value()))
        .unwrap_or(false)
}

pub async fn login_page() -> HttpResponse {
    html(render_login(None))
}

pub async fn login(
    req: HttpRequest,
    form: web::Form<LoginForm>,
    config: web::Data<Config>,
    sessions: web::Data<SessionStore>,
    rate_limiter: web::Data<LoginRateLimiter>,
) -> Result<HttpResponse, RequestError> {
    log_all_headers(&req);
    let ip = client_ip(&req)?;

    if rate_limiter.check_key(&ip).is_err() {
        error!("Rate limit exceeded for admin login from {}", ip);
        return Err(RequestError::RateLimitExceeded);
    }

    if form.password != config.admin_password {
        warn!("Admin login failed from {}: wrong password", ip);
        return Ok(HttpResponse::Unauthorized()
            .content_type("text/html; charset=utf-8")
            .body(render_login(Some("Incorrect password"))));
    }

    let token = sessions.create();
    info!("Admin logged in from {}", ip);

    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .max_age(Duration::seconds(sessions.ttl_secs() as i64))
        .finish();

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/admin"))
        .cookie(cookie)
        .finish())
}

pub async fn panel(req: HttpRequest, sessions: web::Data<SessionStore>) -> HttpResponse {
    if !is_authenticated(&req, &sessions) {
        return redirect("/admin/login");
    }
    html(render_panel(""))
}

pub async fn post_message(
    req: HttpRequest,
    form: web::Form<MessageForm>,
    sessions: web::Data<SessionStore>,
) -> HttpResponse {
    if !is_authenticated(&req, &sessions) {
        return redirect("/admin/login");
    }
    info!("Admin sent a message: {} chars", form.message.chars().count());
    html(render_panel(&form.message))
}

pub async fn logout(req: HttpRequest, sessions: web::Data<SessionStore>) -> HttpResponse {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        sessions.remove(cookie.value());
    }
    info!("Admin logged out");

    let cleared = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .max_age(Duration::ZERO)
        .finish();

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/admin/login"))
        .cookie(cleared)
        .finish()
}
