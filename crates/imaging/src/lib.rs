//! Atelier image-generation adapter.
//!
//! Implements [`pipeline::ImageRenderer`] over the Pollinations HTTP API: a
//! plain `GET {base_url}/{prompt}` that answers with image bytes and needs no
//! API key. Every render writes its bytes to a fresh file named after the
//! configured output path, so concurrent renders never share a file.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL encoding, transport and file output live here. The
//! [`pipeline`] crate sees only [`pipeline::ImageRenderer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{AtelierError, ImageRenderer, RenderError};
use reqwest::Url;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Default Pollinations prompt endpoint.
pub const DEFAULT_BASE_URL: &str = "https://image.pollinations.ai/prompt";

/// Default file-name template, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "my_art_work.jpg";

/// Settings for [`PollinationsRenderer`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Endpoint the prompt is appended to as one path segment.
    pub base_url: String,
    /// Name template for rendered files. A render of `my_art_work.jpg`
    /// writes `my_art_work-<id>.jpg` in the same directory.
    pub output_path: PathBuf,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Renders prompts through Pollinations and saves the result locally.
pub struct PollinationsRenderer {
    base_url: Url,
    output_path: PathBuf,
    client: reqwest::Client,
}

impl PollinationsRenderer {
    /// Validates the base URL and builds the HTTP client.
    pub fn new(config: RendererConfig) -> Result<Self, AtelierError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| AtelierError::ConfigurationError {
            message: format!("invalid image base URL '{}': {e}", config.base_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AtelierError::ConfigurationError {
                message: format!("image base URL '{}' cannot carry a path", config.base_url),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AtelierError::ConfigurationError {
                message: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self {
            base_url,
            output_path: config.output_path,
            client,
        })
    }

    /// Unique file for one render, next to the configured output path.
    fn output_file(&self) -> PathBuf {
        unique_sibling(&self.output_path, Uuid::new_v4())
    }

    /// URL for `prompt`, with the prompt percent-encoded as a single segment.
    fn prompt_url(&self, prompt: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(prompt);
        }
        url
    }
}

#[async_trait]
impl ImageRenderer for PollinationsRenderer {
    #[instrument(skip_all, fields(output = %self.output_path.display()))]
    async fn render(&self, prompt_text: &str) -> Result<PathBuf, RenderError> {
        let url = self.prompt_url(prompt_text);
        debug!(prompt_chars = prompt_text.chars().count(), "requesting image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RenderError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "image service rejected the prompt");
            return Err(RenderError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| RenderError::Transport {
            message: e.to_string(),
        })?;

        let output = self.output_file();
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&output, &bytes).await?;
        debug!(bytes = bytes.len(), path = %output.display(), "image written");

        Ok(output)
    }
}

/// `dir/stem.ext` becomes `dir/stem-<id>.ext`.
fn unique_sibling(template: &Path, id: Uuid) -> PathBuf {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let mut name = format!("{stem}-{}", id.simple());
    if let Some(ext) = template.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    template.with_file_name(name)
}
