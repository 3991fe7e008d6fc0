// src/protocol/ping.rs
use async_trait::async_trait;
use log::{debug, error, info};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::codec::{self, STATUS_RESPONSE_PACKET_ID};
use super::resolve::SrvResolver;
use crate::config::Config;
use crate::models::server::{ProbeResult, ServerTarget};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{stage} timed out after {timeout_ms} ms")]
    Timeout { stage: &'static str, timeout_ms: u64 },

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Measures round-trip latency to a game server.
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    async fn probe(&self, target: &ServerTarget) -> Result<ProbeResult, ProbeError>;
}

/// Server List Ping over TCP. Times the handshake + status exchange and
/// subtracts a fixed calibration offset.
#[derive(Clone)]
pub struct HandshakeProber {
    timeout: Duration,
    protocol_version: i32,
    calibration_offset_ms: u64,
    resolver: SrvResolver,
}

impl HandshakeProber {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.probe_timeout(),
            protocol_version: config.probe_protocol_version,
            calibration_offset_ms: config.calibration_offset_ms,
            resolver: SrvResolver::new(config.probe_timeout()),
        }
    }

    async fn exchange(&self, stream: &mut TcpStream, host: &str, port: u16) -> Result<Duration, ProbeError> {
        let started = Instant::now();

        let mut request = codec::handshake_packet(self.protocol_version, host, port);
        request.extend(codec::status_request_packet());
        stream.write_all(&request).await?;
        stream.flush().await?;

        let (packet_id, body) = codec::read_packet(stream).await?;
        let elapsed = started.elapsed();

        if packet_id != STATUS_RESPONSE_PACKET_ID {
            return Err(ProbeError::Protocol(format!("Unexpected packet id 0x{:02X}", packet_id)));
        }
        codec::decode_status_body(&body).map_err(|e| ProbeError::Protocol(e.to_string()))?;

        Ok(elapsed)
    }
}

#[async_trait]
impl LatencyProbe for HandshakeProber {
    async fn probe(&self, target: &ServerTarget) -> Result<ProbeResult, ProbeError> {
        debug!("Probing {}", target);
        let timeout_ms = self.timeout.as_millis() as u64;

        let (connect_host, connect_port) = self.resolver.connect_target(target).await;
        let connect = TcpStream::connect((connect_host.as_str(), connect_port));
        let mut stream = match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!("Could not connect to {}: {}", target, e);
                return Err(e.into());
            }
            Err(_) => {
                error!("Timed out connecting to {}", target);
                return Err(ProbeError::Timeout { stage: "connect", timeout_ms });
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", target, e);
        }

        let exchange = self.exchange(&mut stream, &target.host, connect_port);
        let elapsed = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(elapsed)) => elapsed,
            Ok(Err(e)) => {
                error!("Handshake with {} failed: {}", target, e);
                return Err(e);
            }
            Err(_) => {
                error!("Timed out waiting for status from {}", target);
                return Err(ProbeError::Timeout { stage: "handshake", timeout_ms });
            }
        };

        let raw_ms = (elapsed.as_secs_f64() * 1000.0).round() as u64;
        let result = ProbeResult::new(raw_ms, self.calibration_offset_ms);
        info!(
            "Ping for {}: {} ms (raw: {} ms)",
            target, result.calibrated_latency_ms, result.raw_latency_ms
        );
        Ok(result)
    }
}
