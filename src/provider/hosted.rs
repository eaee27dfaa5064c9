//! Hosted chat-completion provider
//!
//! Speaks either the Anthropic Messages API or the OpenAI-compatible chat
//! completions API (OpenAI, DeepSeek, OpenRouter, ...). The format is chosen
//! from the URL.

use crate::core::config::HostedConfig;
use crate::core::error::{ConductorError, Result};
use crate::decision::{Advice, DecisionRequest, DecisionResponse, Provenance, WorldSummary};
use crate::provider::http::{build_client, send_json};
use crate::provider::{prompt, InferenceProvider, ProviderHealth};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "hosted";

/// API format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

impl ApiFormat {
    /// Detect API format from URL
    pub fn detect(url: &str) -> Self {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAI
        }
    }
}

pub struct HostedProvider {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_format: ApiFormat,
    health: ProviderHealth,
}

impl HostedProvider {
    pub fn new(config: &HostedConfig, timeout: Duration) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ConductorError::Config("hosted provider needs an API key (set LLM_API_KEY)".into())
        })?;
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            api_url: config.url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_format: ApiFormat::detect(&config.url),
            health: ProviderHealth::new(NAME, timeout),
        })
    }

    pub fn api_format(&self) -> ApiFormat {
        self.api_format
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(system, user).await,
            ApiFormat::OpenAI => self.complete_openai(system, user).await,
        }
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        let builder = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request);
        let completion: AnthropicResponse =
            send_json(NAME, self.health.timeout(), builder).await?;

        completion
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ConductorError::MalformedResponse {
                provider: NAME.into(),
                reason: "empty content".into(),
            })
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String> {
        let request = OpenAIRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
        };

        let builder = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request);
        let completion: OpenAIResponse = send_json(NAME, self.health.timeout(), builder).await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ConductorError::MalformedResponse {
                provider: NAME.into(),
                reason: "no choices".into(),
            })
    }
}

#[async_trait]
impl InferenceProvider for HostedProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn decide_batch(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        let user = prompt::render_batch(request);
        self.health
            .observe(async {
                let text = self.complete(prompt::DECIDE_SYSTEM_PROMPT, &user).await?;
                let actions = prompt::parse_action_list(&text, request.len());
                let response = DecisionResponse::from_positional(request, &actions, NAME);
                let unreadable = response.default_count();
                if unreadable > 0 {
                    tracing::debug!(
                        "{}: {} of {} answers unreadable, using defaults",
                        NAME,
                        unreadable,
                        request.len()
                    );
                }
                Ok(response)
            })
            .await
    }

    async fn advise(&self, summary: &WorldSummary) -> Result<Advice> {
        let user = prompt::render_advice(summary);
        self.health
            .observe(async {
                let text = self.complete(prompt::ADVISE_SYSTEM_PROMPT, &user).await?;
                let (text, focus) = prompt::parse_advice(&text);
                Ok(Advice {
                    text,
                    focus,
                    provenance: Provenance::Provider(NAME.into()),
                })
            })
            .await
    }

    fn is_available(&self) -> bool {
        self.health.is_available()
    }

    fn average_latency(&self) -> Option<Duration> {
        self.health.average_latency()
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Action, WorldContext};
    use crate::test_support::agent;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> HostedConfig {
        HostedConfig {
            url,
            api_key: Some("test-key".into()),
            ..HostedConfig::default()
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ApiFormat::detect("https://api.anthropic.com/v1/messages"),
            ApiFormat::Anthropic
        );
        assert_eq!(
            ApiFormat::detect("https://api.deepseek.com/chat/completions"),
            ApiFormat::OpenAI
        );
    }

    #[tokio::test]
    async fn test_openai_format_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant",
                    "content": "{\"actions\": [\"TRADE\", \"PRAY\"]}"}}]
            })))
            .mount(&server)
            .await;

        let provider = HostedProvider::new(
            &config(format!("{}/v1/chat/completions", server.uri())),
            Duration::from_secs(2),
        )
        .unwrap();
        assert_eq!(provider.api_format(), ApiFormat::OpenAI);

        let request =
            DecisionRequest::new(WorldContext::default(), vec![agent("a"), agent("b")]).unwrap();
        let response = provider.decide_batch(&request).await.unwrap();
        assert_eq!(response.decisions[0].action, Action::Trade);
        assert_eq!(response.decisions[1].action, Action::Pray);
    }

    #[tokio::test]
    async fn test_empty_choices_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let provider =
            HostedProvider::new(&config(server.uri()), Duration::from_secs(2)).unwrap();
        let request = DecisionRequest::new(WorldContext::default(), vec![agent("a")]).unwrap();
        assert!(matches!(
            provider.decide_batch(&request).await,
            Err(ConductorError::MalformedResponse { .. })
        ));
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn test_unauthorized_is_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let provider =
            HostedProvider::new(&config(server.uri()), Duration::from_secs(2)).unwrap();
        let result = provider.advise(&WorldSummary::default()).await;
        assert!(matches!(result, Err(ConductorError::Http { status: 401, .. })));
    }
}
