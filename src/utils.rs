// src/utils.rs
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use actix_web::http::StatusCode;
use serde_json::json;
use std::net::IpAddr;
use log::debug;
use std::fmt;

#[derive(Debug)]
pub enum RequestError {
    MissingPeerIP,
    RateLimitExceeded,
    ProfileNotFound { username: String, status: u16 },
    Upstream { username: String, message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPeerIP => write!(f, "Failed to extract client IP"),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            Self::ProfileNotFound { status, .. } => write!(f, "API error: {}", status),
            Self::Upstream { message, .. } => write!(f, "{}", message),
        }
    }
}

impl ResponseError for RequestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingPeerIP => StatusCode::BAD_REQUEST,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::ProfileNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::ProfileNotFound { username, .. } | Self::Upstream { username, .. } => {
                HttpResponse::build(self.status_code()).json(json!({
                    "username": username,
                    "error": self.to_string(),
                }))
            }
            _ => HttpResponse::build(self.status_code()).body(self.to_string()),
        }
    }
}

/// Address of the connecting peer. Used only to key the login rate limiter.
pub fn client_ip(req: &HttpRequest) -> Result<IpAddr, RequestError> {
    req.peer_addr()
        .map(|addr| addr.ip())
        .ok_or(RequestError::MissingPeerIP)
}

// For debugging purposes
pub fn log_all_headers(req: &HttpRequest) {
    debug!("All request headers:");
    for (name, value) in req.headers() {
        debug!("{}: {:?}", name, value);
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shortens long values for log lines and previews.
pub fn preview(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}
