//! The exhibition pipeline.
//!
//! `run` is a straight line: Planner, Critic, PromptMaker, Translator, image
//! render, Docent, CommunityManager. Outputs are threaded forward by value and
//! every persona step is logged before its output is consumed. The Critic's
//! answer is logged and otherwise unused; nothing branches on it.
//!
//! `studio` is the short path: StyledPromptMaker, then image render.

use std::sync::Arc;
use std::time::Duration;

use pipeline::personas::{
    COMMUNITY_MANAGER, CRITIC, DOCENT, PLANNER, PROMPT_MAKER, STYLED_PROMPT_MAKER, STYLE_SLOT,
    TARGET_LANGUAGE_SLOT, TRANSLATOR,
};
use pipeline::{
    community_brief, AtelierError, ErrorPolicy, ImageRenderer, InputSource, LogEntry, Persona,
    PersonaCatalog, PersonaName, PipelineResult, PipelineRunId, PipelineStep, StepOutput,
    StudioResult,
};
use tracing::{debug, info, instrument, warn};

use crate::PersonaAgent;

/// Language the plan is translated into unless configured otherwise.
pub const DEFAULT_TARGET_LANGUAGE: &str = "English";

/// Tunables for [`PipelineExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Treatment of failed persona steps.
    pub error_policy: ErrorPolicy,
    /// Value bound into the Translator's `{target_language}` slot.
    pub target_language: String,
    /// Delay after the Planner and Critic steps. Zero disables it.
    pub step_pause: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            step_pause: Duration::ZERO,
        }
    }
}

/// Runs the exhibition pipeline and single-persona consultations.
///
/// Holds no mutable state; concurrent calls are independent as long as the
/// injected client and renderer are.
#[derive(Clone)]
pub struct PipelineExecutor {
    agent: PersonaAgent,
    renderer: Arc<dyn ImageRenderer>,
    catalog: Arc<PersonaCatalog>,
    config: ExecutorConfig,
}

impl PipelineExecutor {
    /// Creates an executor from its collaborators.
    pub fn new(
        agent: PersonaAgent,
        renderer: Arc<dyn ImageRenderer>,
        catalog: Arc<PersonaCatalog>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            agent,
            renderer,
            catalog,
            config,
        }
    }

    /// The persona catalog in use.
    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    /// Runs the full pipeline for `topic`.
    ///
    /// Under [`ErrorPolicy::PassThrough`] this only fails if a pipeline persona
    /// is missing from the catalog. Under [`ErrorPolicy::Halt`] the first failed
    /// persona step is returned as [`AtelierError::StepFailed`]. A failed image
    /// render never stops the run.
    #[instrument(skip(self), fields(run_id = %PipelineRunId::new_random()))]
    pub async fn run(&self, topic: &str) -> Result<PipelineResult, AtelierError> {
        info!("starting exhibition pipeline");
        let planner = self.catalog.require(PLANNER)?;
        let planner_name = planner.name.clone();
        let mut logs = Vec::with_capacity(6);

        let plan = self
            .step(planner, InputSource::Topic, topic, &mut logs)
            .await?;
        self.pause().await;

        // Advisory only; a pass token does not skip rework and a complaint does not trigger it.
        let critique = self
            .step(
                self.catalog.require(CRITIC)?,
                InputSource::StepOutput(planner_name.clone()),
                &plan,
                &mut logs,
            )
            .await?;
        debug!(critique_chars = critique.chars().count(), "critique recorded");
        self.pause().await;

        let image_prompt = self
            .step(
                self.catalog.require(PROMPT_MAKER)?,
                InputSource::StepOutput(planner_name.clone()),
                &plan,
                &mut logs,
            )
            .await?;

        let translated_plan = self
            .step(
                &self.translator()?,
                InputSource::StepOutput(planner_name.clone()),
                &plan,
                &mut logs,
            )
            .await?;

        let image_path = self.render(&image_prompt).await;

        let docent_comment = self
            .step(self.catalog.require(DOCENT)?, InputSource::Topic, topic, &mut logs)
            .await?;

        let community_post = self
            .step(
                self.catalog.require(COMMUNITY_MANAGER)?,
                InputSource::TopicWith(planner_name),
                &community_brief(topic, &plan),
                &mut logs,
            )
            .await?;

        info!(steps = logs.len(), has_image = image_path.is_some(), "pipeline finished");

        Ok(PipelineResult {
            topic: topic.to_string(),
            plan,
            translated_plan,
            image_prompt,
            image_path,
            docent_comment,
            community_post,
            logs,
        })
    }

    /// Runs a single catalog persona on `input`.
    ///
    /// The Translator is bound to the configured target language.
    #[instrument(skip(self, input))]
    pub async fn consult(&self, persona: &str, input: &str) -> Result<LogEntry, AtelierError> {
        let persona = if persona == TRANSLATOR {
            self.translator()?
        } else {
            self.catalog.require(persona)?.clone()
        };

        self.execute(&persona, InputSource::Topic, input).await
    }

    /// Writes a styled English prompt for `topic` and renders it.
    ///
    /// A failed prompt step is returned as [`AtelierError::StepFailed`]
    /// under either policy; there is nothing downstream to carry the error
    /// text. A failed render gives `image_path: None`.
    #[instrument(skip(self), fields(run_id = %PipelineRunId::new_random()))]
    pub async fn studio(&self, topic: &str, style: &str) -> Result<StudioResult, AtelierError> {
        let persona = self
            .catalog
            .require(STYLED_PROMPT_MAKER)?
            .bind(STYLE_SLOT, style);

        let final_prompt = match self.agent.invoke(&persona, topic).await {
            StepOutput::Generated(text) => text,
            StepOutput::Failed { message } => return Err(step_failed(persona.name, &message)),
        };
        let image_path = self.render(&final_prompt).await;
        info!(has_image = image_path.is_some(), "studio sketch finished");

        Ok(StudioResult {
            topic: topic.to_string(),
            style: style.to_string(),
            final_prompt,
            image_path,
        })
    }

    fn translator(&self) -> Result<Persona, AtelierError> {
        Ok(self
            .catalog
            .require(TRANSLATOR)?
            .bind(TARGET_LANGUAGE_SLOT, &self.config.target_language))
    }

    /// Runs one persona step, appends its log entry, and returns the text
    /// that flows onward.
    async fn step(
        &self,
        persona: &Persona,
        input_source: InputSource,
        input: &str,
        logs: &mut Vec<LogEntry>,
    ) -> Result<String, AtelierError> {
        let entry = self.execute(persona, input_source, input).await?;
        let message = entry.message.clone();
        logs.push(entry);
        Ok(message)
    }

    /// Invokes one persona and applies the error policy to its outcome.
    async fn execute(
        &self,
        persona: &Persona,
        input_source: InputSource,
        input: &str,
    ) -> Result<LogEntry, AtelierError> {
        let step = PipelineStep {
            persona: persona.name.clone(),
            input_source,
            output: self.agent.invoke(persona, input).await,
        };
        debug!(
            persona = %step.persona,
            input_source = %step.input_source,
            failed = step.output.is_failed(),
            "step complete"
        );

        if let (ErrorPolicy::Halt, StepOutput::Failed { message }) =
            (&self.config.error_policy, &step.output)
        {
            return Err(step_failed(step.persona, message));
        }

        Ok(LogEntry::from_step(&step, self.config.error_policy.prefix()))
    }

    async fn render(&self, prompt: &str) -> Option<String> {
        info!("rendering exhibition image");
        match self.renderer.render(prompt).await {
            Ok(path) => {
                info!(path = %path.display(), "image saved");
                Some(path.display().to_string())
            }
            Err(e) => {
                warn!(error = %e, "image rendering failed; continuing without image");
                None
            }
        }
    }

    async fn pause(&self) {
        if !self.config.step_pause.is_zero() {
            tokio::time::sleep(self.config.step_pause).await;
        }
    }
}

fn step_failed(persona: PersonaName, message: &str) -> AtelierError {
    AtelierError::StepFailed {
        persona,
        message: message.to_string(),
    }
}
