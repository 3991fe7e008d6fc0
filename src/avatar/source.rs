// src/avatar/source.rs
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Image provider returned HTTP {0}")]
    Http(u16),

    #[error("Image provider returned an empty body")]
    Empty,
}

/// Something that can turn an identity token into raw image bytes.
#[async_trait]
pub trait ImageSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, identity: &str) -> Result<Vec<u8>, ImageError>;
}

/// Image provider addressed by a URL template containing `{uuid}`.
pub struct TemplateImageSource {
    name: String,
    template: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl TemplateImageSource {
    pub fn new(client: reqwest::Client, template: impl Into<String>, timeout: Duration) -> Self {
        let template = template.into();
        let name = reqwest::Url::parse(&template)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| template.clone());
        Self { name, template, client, timeout }
    }

    pub fn url_for(&self, identity: &str) -> String {
        self.template.replace("{uuid}", identity)
    }
}

#[async_trait]
impl ImageSource for TemplateImageSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, identity: &str) -> Result<Vec<u8>, ImageError> {
        let response = self
            .client
            .get(self.url_for(identity))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Http(status.as_u16()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(body.to_vec())
    }
}
