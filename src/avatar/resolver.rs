// src/avatar/resolver.rs
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use std::sync::Arc;

use super::source::{ImageSource, TemplateImageSource};
use crate::config::Config;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_MAGIC: &[u8] = b"GIF8";

/// Resolves player heads by walking the providers in priority order.
///
/// Providers are tried one at a time; the next one is only contacted after the
/// previous one failed. When every provider fails, or the player has no
/// identity, the default identity is fetched from the default source.
pub struct AvatarResolver {
    sources: Vec<Arc<dyn ImageSource>>,
    default_source: Arc<dyn ImageSource>,
    default_identity: String,
}

impl AvatarResolver {
    pub fn new(
        sources: Vec<Arc<dyn ImageSource>>,
        default_source: Arc<dyn ImageSource>,
        default_identity: impl Into<String>,
    ) -> Self {
        Self {
            sources,
            default_source,
            default_identity: default_identity.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        let timeout = config.avatar_timeout();
        let sources = config
            .avatar_providers
            .iter()
            .map(|template| {
                Arc::new(TemplateImageSource::new(client.clone(), template.as_str(), timeout)) as Arc<dyn ImageSource>
            })
            .collect();
        let default_source = Arc::new(TemplateImageSource::new(client, config.default_avatar_url.as_str(), timeout));

        Self::new(sources, default_source, config.default_avatar_uuid.clone())
    }

    /// Returns a `data:` URI for the player, or `None` when even the default failed.
    pub async fn resolve(&self, identity: Option<&str>) -> Option<String> {
        let identity = match identity.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => return self.default_image().await,
        };

        for source in &self.sources {
            match source.fetch(identity).await {
                Ok(bytes) => {
                    debug!("Avatar for {} served by {}", identity, source.name());
                    return Some(to_data_uri(&bytes));
                }
                Err(e) => warn!("Avatar provider {} failed for {}: {}", source.name(), identity, e),
            }
        }

        self.default_image().await
    }

    pub async fn default_image(&self) -> Option<String> {
        match self.default_source.fetch(&self.default_identity).await {
            Ok(bytes) => Some(to_data_uri(&bytes)),
            Err(e) => {
                warn!("Default avatar from {} failed: {}", self.default_source.name(), e);
                None
            }
        }
    }
}

fn mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PNG_MAGIC) {
        "image/png"
    } else if bytes.starts_with(JPEG_MAGIC) {
        "image/jpeg"
    } else if bytes.starts_with(GIF_MAGIC) {
        "image/gif"
    } else {
        // Providers serve PNG
        "image/png"
    }
}

pub fn to_data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type(bytes), STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::source::ImageError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Stub {
        name: &'static str,
        payload: Option<Vec<u8>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl Stub {
        fn ok(name: &'static str, payload: &[u8]) -> Arc<Self> {
            Arc::new(Self { name, payload: Some(payload.to_vec()), calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self { name, payload: None, calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageSource for Stub {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, identity: &str) -> Result<Vec<u8>, ImageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(identity.to_string());
            self.payload.clone().ok_or(ImageError::Http(503))
        }
    }

    fn resolver(sources: &[Arc<Stub>], default: &Arc<Stub>) -> AvatarResolver {
        AvatarResolver::new(
            sources.iter().map(|s| s.clone() as Arc<dyn ImageSource>).collect(),
            default.clone(),
            "steve",
        )
    }

    #[tokio::test]
    async fn first_success_wins_and_stops_the_chain() {
        let p1 = Stub::failing("p1");
        let p2 = Stub::ok("p2", b"two");
        let p3 = Stub::ok("p3", b"three");
        let p4 = Stub::ok("p4", b"four");
        let default = Stub::ok("default", b"steve");

        let image = resolver(&[p1.clone(), p2.clone(), p3.clone(), p4.clone()], &default)
            .resolve(Some("u1"))
            .await;

        assert_eq!(image, Some(to_data_uri(b"two")));
        assert_eq!(p1.calls(), 1);
        assert_eq!(p2.calls(), 1);
        assert_eq!(p3.calls(), 0);
        assert_eq!(p4.calls(), 0);
        assert_eq!(default.calls(), 0);
    }

    #[tokio::test]
    async fn missing_identity_goes_straight_to_default() {
        let p1 = Stub::ok("p1", b"one");
        let default = Stub::ok("default", b"steve");

        let resolver = resolver(&[p1.clone()], &default);
        assert_eq!(resolver.resolve(None).await, Some(to_data_uri(b"steve")));
        assert_eq!(resolver.resolve(Some("")).await, Some(to_data_uri(b"steve")));
        assert_eq!(p1.calls(), 0);
        assert_eq!(default.seen.lock().unwrap().as_slice(), ["steve", "steve"]);
    }

    #[tokio::test]
    async fn exhausted_chain_falls_back_to_default() {
        let sources: Vec<_> = ["p1", "p2", "p3", "p4"].into_iter().map(Stub::failing).collect();
        let default = Stub::ok("default", b"steve");

        let image = resolver(&sources, &default).resolve(Some("u1")).await;

        assert_eq!(image, Some(to_data_uri(b"steve")));
        assert!(sources.iter().all(|s| s.calls() == 1));
    }

    #[tokio::test]
    async fn everything_failing_yields_none() {
        let sources: Vec<_> = ["p1", "p2"].into_iter().map(Stub::failing).collect();
        let default = Stub::failing("default");

        assert_eq!(resolver(&sources, &default).resolve(Some("u1")).await, None);
    }

    #[test]
    fn data_uri_labels_known_formats() {
        assert!(to_data_uri(b"\x89PNG\r\n\x1a\nrest").starts_with("data:image/png;base64,"));
        assert!(to_data_uri(&[0xFF, 0xD8, 0xFF, 0x00]).starts_with("data:image/jpeg;base64,"));
        assert_eq!(to_data_uri(b"hi"), "data:image/png;base64,aGk=");
    }
}
