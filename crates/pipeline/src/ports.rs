//! Port traits implemented by infrastructure crates.
//!
//! The executor only ever sees these traits; concrete HTTP clients are injected
//! at the composition root. Both traits are object-safe via `async_trait` so
//! they can be held as `Arc<dyn ...>`.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::{CompletionError, RenderError};

/// A hosted text-generation service.
///
/// Implemented by `llm::GeminiProvider`. Implementations must be reentrant:
/// concurrent pipeline runs share one client.
#[async_trait]
pub trait TextCompletionClient: Send + Sync {
    /// Generates text for `input_text` under the system instruction `role_text`.
    async fn generate(&self, role_text: &str, input_text: &str) -> Result<String, CompletionError>;
}

/// An image-generation service that saves its output locally.
///
/// Implemented by `imaging::PollinationsRenderer`.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Renders `prompt_text` and returns the path of the written file.
    async fn render(&self, prompt_text: &str) -> Result<PathBuf, RenderError>;
}
