//! The single invocation path shared by every persona.

use std::sync::Arc;

use pipeline::{Persona, StepOutput, TextCompletionClient};
use tracing::{info, warn};

/// Binds a completion client; invoked with a [`Persona`] per call.
#[derive(Clone)]
pub struct PersonaAgent {
    client: Arc<dyn TextCompletionClient>,
}

impl PersonaAgent {
    /// Creates an agent that delegates to `client`.
    pub fn new(client: Arc<dyn TextCompletionClient>) -> Self {
        Self { client }
    }

    /// Sends `input_text` to the completion client under the persona's role.
    ///
    /// Never fails: a client error becomes [`StepOutput::Failed`]. The input is
    /// passed through untouched, empty or not.
    pub async fn invoke(&self, persona: &Persona, input_text: &str) -> StepOutput {
        info!(
            persona = %persona.name,
            input_chars = input_text.chars().count(),
            "persona is working"
        );

        match self.client.generate(&persona.role_text, input_text).await {
            Ok(text) => StepOutput::Generated(text),
            Err(e) => {
                warn!(persona = %persona.name, error = %e, "completion call failed");
                StepOutput::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
