// src/models/server.rs
use serde::Serialize;
use std::fmt;

/// Host and port of the game server a status request is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerTarget {
    pub host: String,
    pub port: u16,
    /// The caller named the port. Only targets without one are looked up via SRV.
    #[serde(skip)]
    pub explicit_port: bool,
}

impl ServerTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            explicit_port: false,
        }
    }

    pub fn with_explicit_port(host: impl Into<String>, port: u16) -> Self {
        Self {
            explicit_port: true,
            ..Self::new(host, port)
        }
    }

    /// Parses `host[:port]`, `[v6addr]:port`, `[v6addr]` or a bare IPv6 address.
    /// A missing or unparsable port falls back to `default_port`.
    pub fn parse(address: &str, default_port: u16) -> Self {
        let address = address.trim();

        if let Some(rest) = address.strip_prefix('[') {
            if let Some((host, tail)) = rest.split_once(']') {
                if host.is_empty() {
                    return Self::new(address, default_port);
                }
                return match tail.strip_prefix(':').map(str::parse::<u16>) {
                    Some(Ok(port)) => Self::with_explicit_port(host, port),
                    _ => Self::new(host, default_port),
                };
            }
        }

        // More than one colon without brackets is an IPv6 literal, never host:port.
        if address.matches(':').count() > 1 {
            return Self::new(address, default_port);
        }

        if let Some((host, port)) = address.rsplit_once(':') {
            if let Ok(port) = port.parse::<u16>() {
                if !host.is_empty() {
                    return Self::with_explicit_port(host, port);
                }
            }
        }
        Self::new(address, default_port)
    }

    /// Host as it appears in front of a `:port`; IPv6 literals get brackets.
    pub fn host_for_authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    /// Address the aggregator is keyed by. The port is only included when it
    /// differs from the one the caller treats as default.
    pub fn lookup_key(&self, default_port: u16) -> String {
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host_for_authority(), self.port)
        }
    }
}

impl fmt::Display for ServerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_for_authority(), self.port)
    }
}

/// Outcome of a single handshake probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub raw_latency_ms: u64,
    pub calibrated_latency_ms: u64,
}

impl ProbeResult {
    pub fn new(raw_latency_ms: u64, calibration_offset_ms: u64) -> Self {
        Self {
            raw_latency_ms,
            calibrated_latency_ms: calibrate(raw_latency_ms, calibration_offset_ms),
        }
    }
}

/// Handshake latency minus protocol overhead, floored at zero.
pub fn calibrate(raw_latency_ms: u64, offset_ms: u64) -> u64 {
    raw_latency_ms.saturating_sub(offset_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_subtracts_offset() {
        assert_eq!(calibrate(100, 63), 37);
        assert_eq!(calibrate(63, 63), 0);
        assert_eq!(calibrate(500, 63), 437);
    }

    #[test]
    fn calibration_floors_at_zero() {
        for raw in 0..63 {
            assert_eq!(calibrate(raw, 63), 0);
        }
    }

    #[test]
    fn probe_result_keeps_raw_value() {
        let result = ProbeResult::new(100, 63);
        assert_eq!(result.raw_latency_ms, 100);
        assert_eq!(result.calibrated_latency_ms, 37);
    }

    #[test]
    fn parse_address_with_and_without_port() {
        assert_eq!(ServerTarget::parse("play.example.net", 25565), ServerTarget::new("play.example.net", 25565));
        assert_eq!(
            ServerTarget::parse("play.example.net:25570", 25565),
            ServerTarget::with_explicit_port("play.example.net", 25570)
        );
        assert_eq!(ServerTarget::parse(" 10.0.0.2:bad ", 25565), ServerTarget::new("10.0.0.2:bad", 25565));
        assert!(ServerTarget::parse("play.example.net:25565", 25565).explicit_port);
        assert!(!ServerTarget::parse("play.example.net", 25565).explicit_port);
    }

    #[test]
    fn parse_ipv6_addresses() {
        assert_eq!(
            ServerTarget::parse("[2001:db8::1]:25570", 25565),
            ServerTarget::with_explicit_port("2001:db8::1", 25570)
        );
        assert_eq!(ServerTarget::parse("[2001:db8::1]", 25565), ServerTarget::new("2001:db8::1", 25565));
        assert_eq!(ServerTarget::parse("2001:db8::1", 25565), ServerTarget::new("2001:db8::1", 25565));
        assert_eq!(ServerTarget::parse("::1", 25565), ServerTarget::new("::1", 25565));
        // Trailing group looks like a port but belongs to the address.
        assert_eq!(ServerTarget::parse("2001:db8::25570", 25565), ServerTarget::new("2001:db8::25570", 25565));
        assert_eq!(ServerTarget::parse("[2001:db8::1]:bad", 25565), ServerTarget::new("2001:db8::1", 25565));
    }

    #[test]
    fn ipv6_hosts_are_bracketed_when_a_port_follows() {
        let target = ServerTarget::new("2001:db8::1", 25570);
        assert_eq!(target.to_string(), "[2001:db8::1]:25570");
        assert_eq!(target.lookup_key(25565), "[2001:db8::1]:25570");
        assert_eq!(ServerTarget::new("2001:db8::1", 25565).lookup_key(25565), "2001:db8::1");
    }

    #[test]
    fn lookup_key_omits_default_port() {
        assert_eq!(ServerTarget::new("a.example", 25565).lookup_key(25565), "a.example");
        assert_eq!(ServerTarget::new("a.example", 25570).lookup_key(25565), "a.example:25570");
    }
}
