// model backends - turn a question plus schema into candidate sql text
// the backend is picked once at startup; the gate decides what the text is worth

use std::time::Duration;

use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{mock, prompt};
use crate::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Mock,
    Ollama,
    Vllm,
    Claude,
    Gemini,
}

#[derive(Debug, Clone)]
pub enum Backend {
    /// Keyword rules, no network.
    Mock,
    Ollama {
        base_url: String,
        model: String,
    },
    /// Any OpenAI compatible server.
    Vllm {
        base_url: String,
        model: String,
        api_key: String,
    },
    Claude {
        api_key: String,
        model: String,
    },
    Gemini {
        api_key: String,
        model: String,
    },
}

impl Backend {
    /// Fill in a backend of `kind` from the environment.
    /// An explicit `api_key` wins over the environment.
    pub fn from_env(kind: BackendKind, api_key: Option<String>) -> Result<Self, Error> {
        let backend = match kind {
            BackendKind::Mock => Self::Mock,
            BackendKind::Ollama => Self::Ollama {
                base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
                model: env_or("OLLAMA_MODEL", "qwen2.5:7b-instruct"),
            },
            BackendKind::Vllm => Self::Vllm {
                base_url: env_or("VLLM_BASE_URL", "http://localhost:8001"),
                model: std::env::var("VLLM_MODEL").map_err(|_| Error::MissingConfig("VLLM_MODEL"))?,
                api_key: api_key.unwrap_or_else(|| env_or("VLLM_API_KEY", "EMPTY")),
            },
            BackendKind::Claude => {
                // check common env var names for the api key
                let api_key = api_key
                    .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                    .or_else(|| std::env::var("CLAUDE_API_KEY").ok())
                    .or_else(|| std::env::var("CLAUDE_KEY").ok())
                    .ok_or(Error::MissingApiKey)?;
                Self::Claude {
                    api_key,
                    model: env_or("CLAUDE_MODEL", "claude-sonnet-4-20250514"),
                }
            }
            BackendKind::Gemini => Self::Gemini {
                api_key: api_key
                    .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                    .ok_or(Error::MissingConfig("GEMINI_API_KEY"))?,
                model: env_or("GEMINI_MODEL", "gemini-2.5-flash"),
            },
        };

        Ok(backend)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Ollama { .. } => "ollama",
            Self::Vllm { .. } => "vllm",
            Self::Claude { .. } => "claude",
            Self::Gemini { .. } => "gemini",
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

fn chat(question: &str, schema: &str) -> Vec<Message> {
    vec![
        Message {
            role: "system",
            content: prompt::SYSTEM_PROMPT.to_string(),
        },
        Message {
            role: "user",
            content: prompt::user_message(question, schema),
        },
    ]
}

// ollama /api/chat
#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

// openai style /v1/chat/completions
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

// anthropic /v1/messages
#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'static str,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

// gemini generateContent
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GeminiConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Long lived handle to the selected backend. Build once, share everywhere.
pub struct Ai {
    client: reqwest::Client,
    backend: Backend,
}

impl Ai {
    pub fn new(backend: Backend) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, backend })
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Raw candidate text for the question. Nothing here is trusted yet.
    pub async fn generate(&self, question: &str, schema: &str) -> Result<String, Error> {
        let text = match &self.backend {
            Backend::Mock => mock::generate(question).to_string(),
            Backend::Ollama { base_url, model } => {
                self.ollama(base_url, model, question, schema).await?
            }
            Backend::Vllm {
                base_url,
                model,
                api_key,
            } => self.vllm(base_url, model, api_key, question, schema).await?,
            Backend::Claude { api_key, model } => {
                self.claude(api_key, model, question, schema).await?
            }
            Backend::Gemini { api_key, model } => {
                self.gemini(api_key, model, question, schema).await?
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Backend(format!(
                "{} returned empty response",
                self.backend.name()
            )));
        }

        debug!(backend = self.backend.name(), chars = text.len(), "generated candidate");
        Ok(text.to_string())
    }

    async fn ollama(
        &self,
        base_url: &str,
        model: &str,
        question: &str,
        schema: &str,
    ) -> Result<String, Error> {
        let request = OllamaRequest {
            model,
            messages: chat(question, schema),
            stream: false,
            options: OllamaOptions { temperature: 0.0 },
        };

        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));
        let response: OllamaResponse = self.send(self.client.post(url).json(&request)).await?;

        Ok(response.message.map(|m| m.content).unwrap_or_default())
    }

    async fn vllm(
        &self,
        base_url: &str,
        model: &str,
        api_key: &str,
        question: &str,
        schema: &str,
    ) -> Result<String, Error> {
        let request = CompletionRequest {
            model,
            messages: chat(question, schema),
            temperature: 0.0,
            max_tokens: 256,
        };

        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let response: CompletionResponse = self
            .send(self.client.post(url).bearer_auth(api_key).json(&request))
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Backend("unexpected vllm response: no choices".to_string()))
    }

    async fn claude(
        &self,
        api_key: &str,
        model: &str,
        question: &str,
        schema: &str,
    ) -> Result<String, Error> {
        let request = ClaudeRequest {
            model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system: prompt::SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: prompt::user_message(question, schema),
            }],
        };

        let response: ClaudeResponse = self
            .send(
                self.client
                    .post("https://api.anthropic.com/v1/messages")
                    .header("x-api-key", api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&request),
            )
            .await?;

        Ok(response
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default())
    }

    async fn gemini(
        &self,
        api_key: &str,
        model: &str,
        question: &str,
        schema: &str,
    ) -> Result<String, Error> {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: prompt::SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt::user_message(question, schema),
                }],
            }],
            generation_config: GeminiConfig { temperature: 0.0 },
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
        );
        let response: GeminiResponse = self
            .send(
                self.client
                    .post(url)
                    .header("x-goog-api-key", api_key)
                    .json(&request),
            )
            .await?;

        // a candidate can come back split over several parts
        Ok(response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }

    async fn send<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<R, Error> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            warn!(backend = self.backend.name(), %status, "backend request failed");
            return Err(Error::Backend(format!(
                "{} returned {status}: {body}",
                self.backend.name()
            )));
        }

        Ok(response.json().await?)
    }
}
