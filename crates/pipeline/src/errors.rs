//! Error types for the Atelier domain.
//!
//! [`CompletionError`] and [`RenderError`] are produced by the two external
//! ports. Neither is fatal on its own: the executor converts them into step
//! outputs or a `null` image path. [`AtelierError`] covers the conditions that
//! do reach the caller of `run` or `consult`.

use thiserror::Error;

use crate::PersonaName;

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Failure of a text-completion call.
///
/// Produced by [`crate::TextCompletionClient`] implementations. The `Display`
/// text of this error is what ends up inline in pipeline output when the
/// pass-through policy is active, so it should read well to a human.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompletionError {
    /// The provider answered with a non-success HTTP status.
    #[error("provider returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider error message, or the raw body when it could not be parsed.
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The provider answered 2xx but the body did not match the expected shape.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// Description of the decoding failure.
        message: String,
    },

    /// The provider answered but produced no text (e.g. safety block).
    #[error("empty response{}", .reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    EmptyResponse {
        /// Block or finish reason reported by the provider, if any.
        reason: Option<String>,
    },
}

/// Failure of an image-render call.
///
/// Always recovered by the executor: the result carries `image_path: null`.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The image service answered with a non-success HTTP status.
    #[error("image service returned {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The request never produced a response.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The image bytes could not be written to disk.
    #[error("could not write image: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Caller-facing errors
// ---------------------------------------------------------------------------

/// Errors returned to the caller of the executor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtelierError {
    /// A persona step failed while the executor runs with the halt policy.
    #[error("{persona} step failed: {message}")]
    StepFailed {
        /// Persona whose completion call failed.
        persona: PersonaName,
        /// Failure message from the completion client.
        message: String,
    },

    /// A consultation named a persona that is not in the catalog.
    #[error("unknown persona '{name}'")]
    UnknownPersona {
        /// The requested persona name.
        name: String,
    },

    /// Configuration is invalid. Produced at load time.
    #[error("configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },
}
