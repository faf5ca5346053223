use crate::client::{GeminiClient, TextStream};
use crate::config::GeminiConfig;
use crate::error::LlmError;
use crate::knowledge::KnowledgeBase;
use crate::prompt::{build_contents, SYSTEM_INSTRUCTION};
use avatalk_types::Turn;
use std::sync::Arc;

/// Forwards chat turns to the LLM with the persona and reference document attached.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: GeminiClient,
    knowledge: Arc<KnowledgeBase>,
    instruction: String,
}

impl ChatRelay {
    pub fn new(client: GeminiClient, knowledge: Arc<KnowledgeBase>, instruction: String) -> Self {
        Self {
            client,
            knowledge,
            instruction,
        }
    }

    /// Builds a relay from config, using the built-in instruction unless overridden.
    pub fn from_config(config: GeminiConfig, knowledge: Arc<KnowledgeBase>) -> Result<Self, LlmError> {
        let instruction = config
            .system_instruction
            .clone()
            .unwrap_or_else(|| SYSTEM_INSTRUCTION.to_string());
        let client = GeminiClient::new(config)?;
        Ok(Self::new(client, knowledge, instruction))
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Starts streaming the model's reply to `message`.
    pub async fn stream_reply(
        &self,
        history: Vec<Turn>,
        message: Turn,
    ) -> Result<TextStream, LlmError> {
        tracing::debug!(
            model = self.client.model(),
            history_len = history.len(),
            "relaying chat turn"
        );
        let contents = build_contents(history, message, &self.instruction, &self.knowledge);
        self.client.stream_generate(&contents).await
    }
}
