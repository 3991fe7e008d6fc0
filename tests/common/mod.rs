// Shared fakes for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mcmon::avatar::{AvatarResolver, ImageError, ImageSource};
use mcmon::models::server::{ProbeResult, ServerTarget};
use mcmon::protocol::{LatencyProbe, ProbeError};
use mcmon::upstream::{StatusError, StatusFetch};

pub struct FakeFetcher {
    body: Option<Value>,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn returning(body: Value) -> Arc<Self> {
        Arc::new(Self { body: Some(body), calls: AtomicUsize::new(0) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { body: None, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl StatusFetch for FakeFetcher {
    async fn fetch_raw(&self, _target: &ServerTarget) -> Result<Value, StatusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.clone().ok_or(StatusError::Http(504))
    }
}

pub struct FakeProbe {
    raw_ms: Option<u64>,
    pub calls: AtomicUsize,
}

impl FakeProbe {
    pub fn with_raw(raw_ms: u64) -> Arc<Self> {
        Arc::new(Self { raw_ms: Some(raw_ms), calls: AtomicUsize::new(0) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { raw_ms: None, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LatencyProbe for FakeProbe {
    async fn probe(&self, _target: &ServerTarget) -> Result<ProbeResult, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.raw_ms {
            Some(raw) => Ok(ProbeResult::new(raw, 63)),
            None => Err(ProbeError::Timeout { stage: "connect", timeout_ms: 3000 }),
        }
    }
}

/// Image source that serves `prefix + identity`, or fails for identities in `broken`.
pub struct FakeImages {
    prefix: &'static str,
    broken: Vec<&'static str>,
    pub seen: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn new(prefix: &'static str, broken: &[&'static str]) -> Arc<Self> {
        Arc::new(Self { prefix, broken: broken.to_vec(), seen: Mutex::new(Vec::new()) })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageSource for FakeImages {
    fn name(&self) -> &str {
        self.prefix
    }

    async fn fetch(&self, identity: &str) -> Result<Vec<u8>, ImageError> {
        self.seen.lock().unwrap().push(identity.to_string());
        if self.broken.iter().any(|b| *b == identity) {
            return Err(ImageError::Http(404));
        }
        Ok(format!("{}{}", self.prefix, identity).into_bytes())
    }
}

pub fn resolver(sources: &[Arc<FakeImages>], default: &Arc<FakeImages>) -> Arc<AvatarResolver> {
    Arc::new(AvatarResolver::new(
        sources.iter().map(|s| s.clone() as Arc<dyn ImageSource>).collect(),
        default.clone(),
        "steve",
    ))
}
