//! Atelier LLM provider infrastructure adapter.
//!
//! Implements [`pipeline::TextCompletionClient`] for Google's Generative
//! Language API (`models/{model}:generateContent`). Additional providers are
//! added as new modules in this crate without any changes to the `pipeline`
//! crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting and response parsing
//! live here. The [`pipeline`] crate sees only
//! [`pipeline::TextCompletionClient`]. There is deliberately no retry or
//! back-off: a failed call surfaces as a [`pipeline::CompletionError`] and the
//! executor's error policy decides what happens next.

mod gemini;
mod types;

pub use gemini::{GeminiConfig, GeminiProvider, DEFAULT_BASE_URL, DEFAULT_MODEL};
