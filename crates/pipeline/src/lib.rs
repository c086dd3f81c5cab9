//! Core domain for the Atelier exhibition pipeline.
//!
//! This crate contains the persona catalog, the pipeline value types, the
//! error types, and the two port traits the executor depends on.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`PersonaName`, `PipelineRunId`, `ModelName`) |
//! | [`personas`] | Built-in personas and the data-driven [`PersonaCatalog`] |
//! | [`types`] | Step outcomes, error policy, log entries, the result record |
//! | [`ports`] | [`TextCompletionClient`] and [`ImageRenderer`] |
//! | [`errors`] | Port errors and caller-facing errors |

pub mod errors;
pub mod identifiers;
pub mod personas;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{AtelierError, CompletionError, RenderError};
pub use identifiers::{ModelName, PersonaName, PipelineRunId};
pub use personas::{community_brief, Persona, PersonaCatalog};
pub use ports::{ImageRenderer, TextCompletionClient};
pub use types::{
    ErrorPolicy, InputSource, LogEntry, PipelineResult, PipelineStep, StepOutput, StudioResult,
    Timestamp, DEFAULT_ERROR_PREFIX,
};
