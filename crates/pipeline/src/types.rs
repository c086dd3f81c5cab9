//! Shared value types for the exhibition pipeline.
//!
//! [`StepOutput`] is the tagged outcome of one persona call. [`ErrorPolicy`]
//! decides how a failed outcome is treated. [`PipelineResult`] is the record
//! returned to the CLI or the HTTP layer and is serialised as-is;
//! [`StudioResult`] is its counterpart for a single styled sketch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PersonaName;

/// Prefix prepended to failure messages under [`ErrorPolicy::PassThrough`]
/// unless the caller configures another one.
pub const DEFAULT_ERROR_PREFIX: &str = "Error: ";

// ---------------------------------------------------------------------------
// Step outcome
// ---------------------------------------------------------------------------

/// Outcome of one persona invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutput {
    /// The completion client returned text.
    Generated(String),
    /// The completion client failed; `message` is its error text.
    Failed {
        /// Human-readable failure description.
        message: String,
    },
}

impl StepOutput {
    /// Returns `true` for [`StepOutput::Failed`].
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Text that flows into later steps and into the log.
    ///
    /// Generated text is returned unchanged; a failure becomes
    /// `prefix + message`.
    pub fn render(&self, prefix: &str) -> String {
        match self {
            Self::Generated(text) => text.clone(),
            Self::Failed { message } => format!("{prefix}{message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error policy
// ---------------------------------------------------------------------------

/// How the executor treats a failed persona step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Render the failure as `prefix + message` and keep going. The error
    /// text is consumed by later steps as if it were content.
    PassThrough {
        /// Marker placed in front of failure messages.
        prefix: String,
    },
    /// Stop at the first failed persona step and return
    /// [`crate::AtelierError::StepFailed`].
    Halt,
}

impl ErrorPolicy {
    /// Prefix used when rendering failures. `Halt` never renders a failure
    /// into content, but logs still need a marker.
    pub fn prefix(&self) -> &str {
        match self {
            Self::PassThrough { prefix } => prefix,
            Self::Halt => DEFAULT_ERROR_PREFIX,
        }
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::PassThrough {
            prefix: DEFAULT_ERROR_PREFIX.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Steps and logs
// ---------------------------------------------------------------------------

/// Where a pipeline step took its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// The topic supplied by the caller.
    Topic,
    /// The rendered output of an earlier step.
    StepOutput(PersonaName),
    /// The topic combined with an earlier step's output.
    TopicWith(PersonaName),
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Topic => write!(f, "topic"),
            Self::StepOutput(persona) => write!(f, "{persona}"),
            Self::TopicWith(persona) => write!(f, "topic+{persona}"),
        }
    }
}

/// One executed persona step. Lives only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    /// Persona that was invoked.
    pub persona: PersonaName,
    /// Where the input text came from.
    pub input_source: InputSource,
    /// Outcome of the completion call.
    pub output: StepOutput,
}

/// One entry of the pipeline log, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Persona name, e.g. `"Planner"`.
    #[serde(rename = "agent")]
    pub agent_name: PersonaName,
    /// Rendered step output (generated text or prefixed error text).
    pub message: String,
    /// When the entry was appended.
    pub recorded_at: Timestamp,
}

impl LogEntry {
    /// Builds the log entry for an executed step.
    pub fn from_step(step: &PipelineStep, error_prefix: &str) -> Self {
        Self {
            agent_name: step.persona.clone(),
            message: step.output.render(error_prefix),
            recorded_at: Timestamp::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Result record
// ---------------------------------------------------------------------------

/// Packaged output of one pipeline run.
///
/// `image_path` is serialised as `null` when rendering failed; the key is
/// never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Topic the run was started with.
    pub topic: String,
    /// Planner output.
    #[serde(rename = "final_plan")]
    pub plan: String,
    /// Plan translated into the configured target language.
    pub translated_plan: String,
    /// PromptMaker output sent to the image renderer.
    pub image_prompt: String,
    /// Local path of the rendered image, or `None` when rendering failed.
    pub image_path: Option<String>,
    /// Docent output.
    pub docent_comment: String,
    /// CommunityManager output.
    pub community_post: String,
    /// One entry per persona step, in execution order.
    pub logs: Vec<LogEntry>,
}

/// Output of one studio sketch: a styled prompt and the image rendered from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudioResult {
    /// Subject the caller asked for.
    pub topic: String,
    /// Painting style bound into the prompt persona.
    pub style: String,
    /// English prompt sent to the image renderer.
    pub final_prompt: String,
    /// Local path of the rendered image, or `None` when rendering failed.
    pub image_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> PersonaName {
        PersonaName::new("Planner").unwrap()
    }

    #[test]
    fn failed_output_renders_with_prefix() {
        let out = StepOutput::Failed {
            message: "quota exceeded".into(),
        };
        assert!(out.is_failed());
        assert_eq!(out.render("Error: "), "Error: quota exceeded");
    }

    #[test]
    fn generated_output_ignores_prefix() {
        let out = StepOutput::Generated("- 제목: 네온".into());
        assert!(!out.is_failed());
        assert_eq!(out.render("Error: "), "- 제목: 네온");
    }

    #[test]
    fn default_policy_is_pass_through_with_error_prefix() {
        let policy = ErrorPolicy::default();
        assert_eq!(policy.prefix(), "Error: ");
        assert!(matches!(policy, ErrorPolicy::PassThrough { .. }));
    }

    #[test]
    fn log_entry_serialises_agent_key() {
        let step = PipelineStep {
            persona: planner(),
            input_source: InputSource::Topic,
            output: StepOutput::Generated("plan".into()),
        };
        let json = serde_json::to_value(LogEntry::from_step(&step, "Error: ")).unwrap();
        assert_eq!(json["agent"], "Planner");
        assert_eq!(json["message"], "plan");
        assert!(json.get("recorded_at").is_some());
    }

    #[test]
    fn missing_image_path_serialises_as_null() {
        let result = PipelineResult {
            topic: "사이버펑크 서울".into(),
            plan: "p".into(),
            translated_plan: "t".into(),
            image_prompt: "i".into(),
            image_path: None,
            docent_comment: "d".into(),
            community_post: "c".into(),
            logs: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("image_path").unwrap().is_null());
        assert_eq!(json["final_plan"], "p");
    }

    #[test]
    fn studio_result_keeps_null_image_path() {
        let json = serde_json::to_value(StudioResult {
            topic: "밤의 항구".into(),
            style: "인상주의".into(),
            final_prompt: "A harbour at night.".into(),
            image_path: None,
        })
        .unwrap();
        assert_eq!(json["final_prompt"], "A harbour at night.");
        assert!(json.get("image_path").unwrap().is_null());
    }

    #[test]
    fn input_source_display() {
        assert_eq!(InputSource::Topic.to_string(), "topic");
        assert_eq!(InputSource::TopicWith(planner()).to_string(), "topic+Planner");
    }
}
