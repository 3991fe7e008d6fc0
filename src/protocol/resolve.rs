// src/protocol/resolve.rs
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use log::{debug, info, warn};
use std::net::IpAddr;
use std::time::Duration;

use crate::models::server::ServerTarget;

pub const SRV_SERVICE: &str = "_minecraft._tcp";

/// The parts of an SRV answer that decide where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

/// Lowest priority wins, then the heaviest weight. A target of `.` means the
/// service is explicitly unavailable and is skipped.
pub fn pick_srv(records: &[SrvRecord]) -> Option<(String, u16)> {
    records
        .iter()
        .filter(|r| !r.target.trim_end_matches('.').is_empty())
        .min_by(|a, b| a.priority.cmp(&b.priority).then(b.weight.cmp(&a.weight)))
        .map(|r| (r.target.trim_end_matches('.').to_string(), r.port))
}

/// SRV only applies to hostnames whose port the caller left open.
pub fn wants_srv(target: &ServerTarget) -> bool {
    !target.explicit_port && target.host.parse::<IpAddr>().is_err()
}

/// Chooses the host and port to open a socket to. The handshake still
/// carries the host the user asked for.
#[derive(Clone)]
pub struct SrvResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl SrvResolver {
    pub fn new(timeout: Duration) -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            warn!("System resolver config unavailable ({}), using defaults", e);
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver, timeout }
    }

    pub async fn connect_target(&self, target: &ServerTarget) -> (String, u16) {
        let direct = (target.host.clone(), target.port);
        if !wants_srv(target) {
            return direct;
        }

        let name = format!("{}.{}", SRV_SERVICE, target.host);
        let lookup = match tokio::time::timeout(self.timeout, self.resolver.srv_lookup(name.as_str())).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => {
                debug!("No SRV record for {}: {}", name, e);
                return direct;
            }
            Err(_) => {
                warn!("SRV lookup for {} timed out", name);
                return direct;
            }
        };

        let records: Vec<SrvRecord> = lookup
            .iter()
            .map(|srv| SrvRecord {
                priority: srv.priority(),
                weight: srv.weight(),
                port: srv.port(),
                target: srv.target().to_utf8(),
            })
            .collect();

        match pick_srv(&records) {
            Some((host, port)) => {
                info!("SRV {} -> {}:{}", name, host, port);
                (host, port)
            }
            None => direct,
        }
    }
}
