//! Ollama local model server
//!
//! Uses the non-streaming `/api/generate` endpoint. Batch calls ask for JSON
//! output (`format: "json"`) and the generated text is mapped to actions by
//! [`prompt::parse_action_list`]; the HTTP envelope itself must decode or the
//! call counts as a failure.

use crate::core::config::OllamaConfig;
use crate::core::error::Result;
use crate::decision::{Advice, DecisionRequest, DecisionResponse, Provenance, WorldSummary};
use crate::provider::http::{build_client, send_json};
use crate::provider::{prompt, InferenceProvider, ProviderHealth};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "ollama";

pub struct OllamaProvider {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    num_predict: u32,
    health: ProviderHealth,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: format!("{}/api/generate", config.url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            num_predict: config.num_predict,
            health: ProviderHealth::new(NAME, timeout),
        })
    }

    async fn generate(&self, system: &str, prompt: &str, json: bool) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            system,
            prompt,
            stream: false,
            format: json.then_some("json"),
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.num_predict,
            },
        };
        let reply: GenerateResponse = send_json(
            NAME,
            self.health.timeout(),
            self.client.post(&self.endpoint).json(&request),
        )
        .await?;
        Ok(reply.response)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl InferenceProvider for OllamaProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn decide_batch(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        let user = prompt::render_batch(request);
        self.health
            .observe(async {
                let text = self
                    .generate(prompt::DECIDE_SYSTEM_PROMPT, &user, true)
                    .await?;
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
                let text = self
                    .generate(prompt::ADVISE_SYSTEM_PROMPT, &user, false)
                    .await?;
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
