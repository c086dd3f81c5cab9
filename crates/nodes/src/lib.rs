//! Atelier orchestration: the persona agent and the pipeline executor.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** [`PersonaAgent`] and [`PipelineExecutor`] sequence
//! calls between the domain types in the [`pipeline`] crate and the injected
//! ports ([`pipeline::TextCompletionClient`], [`pipeline::ImageRenderer`]).
//! They contain no transport code of their own.

mod agent;
mod executor;

pub use agent::PersonaAgent;
pub use executor::{ExecutorConfig, PipelineExecutor, DEFAULT_TARGET_LANGUAGE};
