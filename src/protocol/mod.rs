// src/protocol/mod.rs
pub mod codec;
pub mod ping;
pub mod resolve;

pub use ping::{HandshakeProber, LatencyProbe, ProbeError};
pub use resolve::SrvResolver;
