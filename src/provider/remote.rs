//! Generic JSON-over-HTTP decision endpoint
//!
//! Wire contract:
//! - `POST {url}/decide` with [`DecideBody`], answered by
//!   `{"decisions": [{"agent_id": "<uuid>", "action": "MINE"}, ...]}`.
//!   Decisions are matched back by agent id; unknown ids are ignored and
//!   unrecognised action names fall back to the safe default.
//! - `POST {url}/advise` with `{"model", "summary"}`, answered by
//!   `{"advice": "...", "focus": "FARM" | null}`.

use crate::core::config::RemoteProviderConfig;
use crate::core::error::Result;
use crate::core::types::AgentId;
use crate::decision::{
    Action, Advice, AgentContext, DecisionRequest, DecisionResponse, Provenance, WorldContext,
    WorldSummary,
};
use crate::provider::http::{build_client, send_json};
use crate::provider::{InferenceProvider, ProviderHealth};
use ahash::AHashMap;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAME: &str = "remote";

pub struct RemoteProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    health: ProviderHealth,
}

impl RemoteProvider {
    pub fn new(config: &RemoteProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            health: ProviderHealth::new(NAME, timeout),
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .header("content-type", "application/json");
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }
}

#[derive(Serialize)]
struct DecideBody<'a> {
    model: &'a str,
    world: &'a WorldContext,
    agents: &'a [AgentContext],
    /// The closed action set, so the endpoint never has to guess it
    actions: Vec<&'static str>,
}

#[derive(Deserialize)]
struct DecideReply {
    decisions: Vec<RemoteDecision>,
}

#[derive(Deserialize)]
struct RemoteDecision {
    agent_id: AgentId,
    action: String,
}

#[derive(Serialize)]
struct AdviseBody<'a> {
    model: &'a str,
    summary: &'a WorldSummary,
}

#[derive(Deserialize)]
struct AdviseReply {
    advice: String,
    #[serde(default)]
    focus: Option<String>,
}

#[async_trait]
impl InferenceProvider for RemoteProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn decide_batch(&self, request: &DecisionRequest) -> Result<DecisionResponse> {
        let body = DecideBody {
            model: &self.model,
            world: request.world(),
            agents: request.agents(),
            actions: Action::ALL.iter().map(|a| a.as_str()).collect(),
        };
        self.health
            .observe(async {
                let reply: DecideReply =
                    send_json(NAME, self.health.timeout(), self.post("decide").json(&body)).await?;
                let keyed: AHashMap<AgentId, Action> = reply
                    .decisions
                    .into_iter()
                    .filter_map(|d| Action::from_token(&d.action).map(|a| (d.agent_id, a)))
                    .collect();
                Ok(DecisionResponse::from_keyed(request, &keyed, NAME))
            })
            .await
    }

    async fn advise(&self, summary: &WorldSummary) -> Result<Advice> {
        let body = AdviseBody {
            model: &self.model,
            summary,
        };
        self.health
            .observe(async {
                let reply: AdviseReply =
                    send_json(NAME, self.health.timeout(), self.post("advise").json(&body)).await?;
                Ok(Advice {
                    text: reply.advice,
                    focus: reply.focus.as_deref().and_then(Action::from_token),
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
