use crate::ai_response::{
    fallback_options, is_affirmative, parse_options, parse_persona, parse_question_setup,
};
use crate::content_filter::{CHARACTER_MAX_SEVERITY, ContentFilter};
use crate::credentials::CredentialProvider;
use crate::error::{AppError, Result, TransportError};
use crate::game_state::{PersonaDraft, QuestionSetup};
use crate::message::{ChatMessage, QuestionOption};
use crate::prompts;
use crate::settings::Settings;
use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;
use strum_macros::Display;

const APP_TITLE: &str = "Records of Amur Isondo";
const APP_REFERER: &str = "https://github.com/ProHaller/amur_isondo";

// What a request is for. Only used for logging and by test transports, never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Purpose {
    Completion,
    Answer,
    Evaluation,
    Greeting,
    Persona,
    QuestionSetup,
    Options,
    Elaboration,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip)]
    pub purpose: Purpose,
}

/// One attempt against the chat-completion endpoint, no retries.
pub trait ChatTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
        api_key: &'a str,
    ) -> BoxFuture<'a, std::result::Result<String, TransportError>>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenRouter-compatible transport over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_url: String,
}

impl HttpTransport {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.api_url.clone(), settings.request_timeout())
    }

    async fn post(
        &self,
        request: &ChatRequest,
        api_key: &str,
    ) -> std::result::Result<String, TransportError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedBody(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(TransportError::MissingContent)
    }
}

impl ChatTransport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
        api_key: &'a str,
    ) -> BoxFuture<'a, std::result::Result<String, TransportError>> {
        self.post(request, api_key).boxed()
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if err.is_connect() {
        let mut chain = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push_str(&cause.to_string().to_lowercase());
            source = cause.source();
        }
        if chain.contains("dns") || chain.contains("lookup") {
            return TransportError::Dns(err.to_string());
        }
        return TransportError::Connect(err.to_string());
    }
    TransportError::Request(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32, // First attempt included.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: settings.initial_backoff(),
        }
    }

    /// Wait before attempt `attempt + 1`, doubling from the initial backoff.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Every LLM-backed step of the game.
pub struct GameAI {
    transport: Arc<dyn ChatTransport>,
    credentials: Arc<dyn CredentialProvider>,
    filter: ContentFilter,
    retry: RetryPolicy,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GameAI {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        credentials: Arc<dyn CredentialProvider>,
        filter: ContentFilter,
        settings: &Settings,
    ) -> Self {
        Self {
            transport,
            credentials,
            filter,
            retry: RetryPolicy::from_settings(settings),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    /// HTTP transport and the bundled term list.
    pub fn from_settings(settings: &Settings, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let transport = Arc::new(HttpTransport::from_settings(settings)?);
        Ok(Self::new(
            transport,
            credentials,
            ContentFilter::builtin()?,
            settings,
        ))
    }

    /// Sends `messages` to `model`, retrying transient failures with exponential backoff.
    pub async fn complete(&self, messages: Vec<ChatMessage>, model: &str) -> Result<String> {
        self.request(Purpose::Completion, messages, model).await
    }

    async fn generate(&self, purpose: Purpose, messages: Vec<ChatMessage>) -> Result<String> {
        self.request(purpose, messages, &self.model).await
    }

    async fn request(
        &self,
        purpose: Purpose,
        messages: Vec<ChatMessage>,
        model: &str,
    ) -> Result<String> {
        if messages.is_empty() {
            return Err(AppError::validation("cannot generate from an empty message list"));
        }
        let api_key = self
            .credentials
            .credential()
            .await
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config("no OpenRouter API key set".to_string()))?;

        let request = ChatRequest {
            model: model.to_string(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            purpose,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.transport.send(&request, &api_key).await {
                Ok(text) => {
                    log::debug!("{} request succeeded on attempt {}", purpose, attempt);
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    log::warn!(
                        "{} attempt {} failed: {}. Retrying in {:?}",
                        purpose,
                        attempt,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    log::error!("{} failed after {} attempt(s): {}", purpose, attempt, e);
                    return Err(AppError::Generation {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    fn censor(&self, text: &str) -> String {
        self.filter.filter(text.trim(), CHARACTER_MAX_SEVERITY)
    }

    pub async fn answer_as_character(
        &self,
        persona: &str,
        character_name: &str,
        question: &str,
        context: &str,
    ) -> Result<String> {
        let messages = prompts::answer_messages(persona, character_name, question, context);
        let answer = self.generate(Purpose::Answer, messages).await?;
        Ok(self.censor(&answer))
    }

    /// Never fails: a broken evaluation counts as "not adequate yet".
    pub async fn evaluate_adequacy(
        &self,
        question: &str,
        answer: &str,
        target_topic: &str,
        criteria: &[String],
        history: Option<&[ChatMessage]>,
    ) -> bool {
        let messages = prompts::evaluation_messages(question, answer, target_topic, criteria, history);
        match self.generate(Purpose::Evaluation, messages).await {
            Ok(verdict) => is_affirmative(&verdict),
            Err(e) => {
                log::warn!("Evaluation failed, treating the answer as inadequate: {}", e);
                false
            }
        }
    }

    pub async fn generate_greeting(
        &self,
        persona: &str,
        character_name: &str,
        context: &str,
    ) -> Result<String> {
        let messages = prompts::greeting_messages(persona, character_name, context);
        let greeting = self.generate(Purpose::Greeting, messages).await?;
        Ok(self.censor(&greeting))
    }

    /// Network failures propagate; an unparseable reply still yields a persona.
    pub async fn generate_persona(
        &self,
        tags: &[String],
        question: &str,
        target_topic_hint: &str,
    ) -> Result<PersonaDraft> {
        let messages = prompts::persona_messages(tags, question, target_topic_hint);
        let raw = self.generate(Purpose::Persona, messages).await?;
        let draft = parse_persona(&raw);
        Ok(PersonaDraft {
            name: self.censor(&draft.name),
            description: self.censor(&draft.description),
        })
    }

    pub async fn generate_question_setup(&self, question: &str) -> Result<QuestionSetup> {
        let messages = prompts::question_setup_messages(question);
        let raw = self.generate(Purpose::QuestionSetup, messages).await?;
        parse_question_setup(&raw)
    }

    /// Always three options: any failure falls back to a generic triple.
    pub async fn generate_options(
        &self,
        persona: &str,
        context: &str,
        history: &[ChatMessage],
        target_topic: &str,
        research_question: Option<&str>,
    ) -> Vec<QuestionOption> {
        let messages =
            prompts::options_messages(persona, context, history, target_topic, research_question);
        let raw = match self.generate(Purpose::Options, messages).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Option generation failed, using fallback questions: {}", e);
                return fallback_options();
            }
        };
        parse_options(&raw).unwrap_or_else(|| {
            log::warn!("Options response had the wrong shape, using fallback questions");
            fallback_options()
        })
    }

    pub async fn elaborate(
        &self,
        persona: &str,
        character_name: &str,
        question: &str,
        previous_answer: &str,
        context: &str,
    ) -> Result<String> {
        let messages = prompts::elaboration_messages(
            persona,
            character_name,
            question,
            previous_answer,
            context,
        );
        let text = self.generate(Purpose::Elaboration, messages).await?;
        Ok(self.censor(&text))
    }
}
