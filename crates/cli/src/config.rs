//! Command-line and environment configuration.
//!
//! Every setting can come from a flag or its environment variable; flags win.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use imaging::RendererConfig;
use llm::GeminiConfig;
use nodes::{ExecutorConfig, DEFAULT_TARGET_LANGUAGE};
use pipeline::{ErrorPolicy, ModelName, PersonaCatalog, DEFAULT_ERROR_PREFIX};

/// Topic used when the interactive prompt is left empty.
pub const DEFAULT_TOPIC: &str = "미래의 도시";

/// AI-curated exhibition pipeline for the art DAO.
#[derive(Debug, Parser)]
#[command(name = "atelier", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(flatten)]
    pub gemini: GeminiArgs,

    #[command(flatten)]
    pub image: ImageArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline once and print the result as JSON.
    Run {
        /// Exhibition topic. Prompted for on stdin when omitted.
        #[arg(long)]
        topic: Option<String>,
    },
    /// Ask a single persona and print its answer.
    Ask {
        /// Persona name, e.g. `Docent` or `Curator`.
        persona: String,
        /// Text handed to the persona.
        input: String,
    },
    /// Write a styled image prompt for a topic and render it.
    Studio {
        /// What to paint.
        #[arg(long)]
        topic: String,
        /// Painting style, e.g. `인상주의`.
        #[arg(long)]
        style: String,
    },
    /// Serve the HTTP API.
    Serve {
        /// Address to bind.
        #[arg(long, env = "ATELIER_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Port to bind.
        #[arg(long, env = "ATELIER_PORT", default_value_t = 8002)]
        port: u16,
    },
    /// List persona names.
    Personas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Args)]
pub struct LoggingArgs {
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, env = "ATELIER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (logs go to stderr).
    #[arg(long, env = "ATELIER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint; spans are exported when set.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Args)]
pub struct GeminiArgs {
    /// Google Generative Language API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name.
    #[arg(long, env = "ATELIER_MODEL", default_value = llm::DEFAULT_MODEL)]
    pub model: String,

    /// API root.
    #[arg(long, env = "ATELIER_GEMINI_BASE_URL", default_value = llm::DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    /// Sampling temperature.
    #[arg(long, env = "ATELIER_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Timeout for every outbound HTTP request, in seconds.
    #[arg(long, env = "ATELIER_HTTP_TIMEOUT_SECS", default_value_t = 120)]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct ImageArgs {
    /// Image service endpoint; the prompt is appended as a path segment.
    #[arg(long, env = "ATELIER_IMAGE_BASE_URL", default_value = imaging::DEFAULT_BASE_URL)]
    pub image_base_url: String,

    /// Name template for rendered images; each render writes `<stem>-<id>.<ext>` beside it.
    #[arg(long, env = "ATELIER_IMAGE_OUTPUT", default_value = imaging::DEFAULT_OUTPUT_PATH)]
    pub image_output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ErrorPolicyArg {
    /// Embed failures as prefixed text and keep going.
    PassThrough,
    /// Stop at the first failed persona step.
    Halt,
}

#[derive(Debug, Args)]
pub struct PipelineArgs {
    /// Language the plan is translated into.
    #[arg(long, env = "ATELIER_TARGET_LANGUAGE", default_value = DEFAULT_TARGET_LANGUAGE)]
    pub target_language: String,

    /// What to do when a persona call fails.
    #[arg(long, env = "ATELIER_ERROR_POLICY", value_enum, default_value_t = ErrorPolicyArg::PassThrough)]
    pub error_policy: ErrorPolicyArg,

    /// Marker placed in front of failure text under `pass-through`.
    #[arg(long, env = "ATELIER_ERROR_PREFIX", default_value = DEFAULT_ERROR_PREFIX)]
    pub error_prefix: String,

    /// Pause after the Planner and Critic steps, in milliseconds.
    #[arg(long, env = "ATELIER_STEP_PAUSE_MS", default_value_t = 0)]
    pub step_pause_ms: u64,

    /// JSON file mapping persona names to replacement role texts.
    #[arg(long, env = "ATELIER_PERSONAS")]
    pub personas: Option<PathBuf>,
}

impl Cli {
    fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini.http_timeout_secs)
    }

    /// Completion client settings. Fails without an API key.
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        let api_key = self
            .gemini
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("GOOGLE_API_KEY (or --api-key) is required"))?;
        let mut config = GeminiConfig::new(api_key)?;
        config.model = ModelName::new(self.gemini.model.clone())
            .ok_or_else(|| anyhow!("--model must not be empty"))?;
        config.base_url = self.gemini.gemini_base_url.clone();
        config.temperature = self.gemini.temperature;
        config.timeout = self.http_timeout();
        Ok(config)
    }

    /// Image renderer settings.
    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            base_url: self.image.image_base_url.clone(),
            output_path: self.image.image_output.clone(),
            timeout: self.http_timeout(),
        }
    }

    /// Executor settings.
    pub fn executor_config(&self) -> ExecutorConfig {
        let error_policy = match self.pipeline.error_policy {
            ErrorPolicyArg::PassThrough => ErrorPolicy::PassThrough {
                prefix: self.pipeline.error_prefix.clone(),
            },
            ErrorPolicyArg::Halt => ErrorPolicy::Halt,
        };
        ExecutorConfig {
            error_policy,
            target_language: self.pipeline.target_language.clone(),
            step_pause: Duration::from_millis(self.pipeline.step_pause_ms),
        }
    }

    /// Built-in personas with any file overrides applied.
    pub fn catalog(&self) -> Result<PersonaCatalog> {
        let mut catalog = PersonaCatalog::builtin();
        if let Some(path) = &self.pipeline.personas {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read persona overrides: {}", path.display()))?;
            catalog.apply_overrides_json(&json)?;
        }
        Ok(catalog)
    }
}

/// The entered topic, or [`DEFAULT_TOPIC`] when the line is blank.
pub fn topic_or_default(line: &str) -> String {
    let topic = line.trim();
    if topic.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        topic.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("atelier").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn run_accepts_topic_flag() {
        let cli = parse(&["run", "--topic", "사이버펑크 서울"]);
        assert!(matches!(cli.command, Command::Run { topic: Some(ref t) } if t == "사이버펑크 서울"));
    }

    #[test]
    fn studio_requires_topic_and_style() {
        let cli = parse(&["studio", "--topic", "밤의 항구", "--style", "인상주의"]);
        assert!(matches!(
            cli.command,
            Command::Studio { ref topic, ref style } if topic == "밤의 항구" && style == "인상주의"
        ));
        assert!(Cli::try_parse_from(["atelier", "studio", "--topic", "밤의 항구"]).is_err());
    }

    #[test]
    fn serve_has_default_port() {
        let cli = parse(&["serve"]);
        assert!(matches!(cli.command, Command::Serve { port: 8002, .. }));
    }

    #[test]
    fn halt_policy_maps_to_executor_config() {
        let cli = parse(&["--error-policy", "halt", "--step-pause-ms", "1000", "personas"]);
        let config = cli.executor_config();
        assert_eq!(config.error_policy, ErrorPolicy::Halt);
        assert_eq!(config.step_pause, Duration::from_secs(1));
    }

    #[test]
    fn pass_through_carries_custom_prefix() {
        let cli = parse(&["--error-prefix", "[실패] ", "--target-language", "Japanese", "personas"]);
        let config = cli.executor_config();
        assert_eq!(
            config.error_policy,
            ErrorPolicy::PassThrough {
                prefix: "[실패] ".into()
            }
        );
        assert_eq!(config.target_language, "Japanese");
    }

    #[test]
    fn gemini_config_uses_flags() {
        let cli = parse(&[
            "--api-key",
            "secret",
            "--model",
            "gemini-1.5-flash",
            "--temperature",
            "0.7",
            "--http-timeout-secs",
            "30",
            "personas",
        ]);
        let config = cli.gemini_config().unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model.as_str(), "gemini-1.5-flash");
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn persona_file_overrides_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Docent": "short docent"}}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = parse(&["--personas", &path, "personas"]);
        let catalog = cli.catalog().unwrap();

        assert_eq!(catalog.get("Docent").unwrap().role_text, "short docent");
    }

    #[test]
    fn missing_persona_file_is_reported() {
        let cli = parse(&["--personas", "/nonexistent/atelier/personas.json", "personas"]);
        let err = cli.catalog().unwrap_err();
        assert!(err.to_string().contains("Failed to read persona overrides"));
    }

    #[test]
    fn blank_topic_falls_back_to_default() {
        assert_eq!(topic_or_default("  \n"), DEFAULT_TOPIC);
        assert_eq!(topic_or_default("고흐의 재림\n"), "고흐의 재림");
    }
}
