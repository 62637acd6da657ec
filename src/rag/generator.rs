//! Answer generation against the language model.

use crate::error::{Result, TutorError};
use crate::openai::OpenAIClient;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, instrument};

/// Incremental text fragments from the model.
///
/// Dropping the stream releases the upstream connection.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Trait for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a complete answer.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Open a new upstream stream of answer fragments.
    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream>;
}

/// OpenAI chat-completion generator.
pub struct OpenAIGenerator {
    client: OpenAIClient,
    model: String,
    system_prompt: Option<String>,
    temperature: f32,
}

impl OpenAIGenerator {
    /// Create a generator with temperature 0 for reproducible grounded answers.
    pub fn new(client: OpenAIClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            system_prompt: None,
            temperature: 0.0,
        }
    }

    /// Prepend a system message to every request.
    pub fn with_system_prompt(mut self, system_prompt: &str) -> Self {
        self.system_prompt = Some(system_prompt.to_string());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn request(&self, prompt: &str) -> Result<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.clone())
                    .build()
                    .map_err(|e| TutorError::Upstream(e.to_string()))?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| TutorError::Upstream(e.to_string()))?
                .into(),
        );

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TutorError::Upstream(e.to_string()))
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = self.request(prompt)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            TutorError::Upstream(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TutorError::Upstream("Empty response from LLM".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate_stream(&self, prompt: &str) -> Result<FragmentStream> {
        let request = self.request(prompt)?;

        let stream = self.client.chat().create_stream(request).await.map_err(|e| {
            TutorError::Upstream(format!("Failed to open response stream: {}", e))
        })?;

        Ok(stream
            .map(|item| match item {
                Ok(chunk) => Ok(chunk
                    .choices
                    .into_iter()
                    .filter_map(|c| c.delta.content)
                    .collect::<String>()),
                Err(e) => Err(TutorError::Upstream(format!("Response stream failed: {}", e))),
            })
            .boxed())
    }
}
