use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use portal_session::{ByteStream, ChatTransport};

use crate::config::PortalConfig;
use crate::types::{AgentCard, ProvisionStatus, TemplateInfo};

/// HTTP client for the portal backend (direct reqwest, no SDK).
///
/// Doubles as the [`ChatTransport`] for a
/// [`portal_session::ChatSession`] and exposes the portal's plain REST calls.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    rest_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatStreamRequest<'a> {
    message: &'a str,
    conversation_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct AgentsResponse {
    agents: Vec<AgentCard>,
}

#[derive(Debug, Deserialize)]
struct TemplatesResponse {
    templates: Vec<TemplateInfo>,
}

#[derive(Debug, Serialize)]
struct ProvisionRequest<'a> {
    template_name: &'a str,
    parameters: Value,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rest_timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// List the automation agents registered with the backend.
    pub async fn list_agents(&self) -> Result<Vec<AgentCard>> {
        let url = format!("{}/api/v1/agents", self.base_url);

        let response = self
            .http
            .get(&url)
            .timeout(self.rest_timeout)
            .send()
            .await
            .context("Agents request failed")?
            .error_for_status()
            .context("Agents request returned an error status")?;

        let body: AgentsResponse = response
            .json()
            .await
            .context("Invalid agents payload")?;
        Ok(body.agents)
    }

    /// List the self-service provisioning templates.
    pub async fn list_templates(&self) -> Result<Vec<TemplateInfo>> {
        let url = format!("{}/api/v1/self-service/templates", self.base_url);

        let response = self
            .http
            .get(&url)
            .timeout(self.rest_timeout)
            .send()
            .await
            .context("Templates request failed")?
            .error_for_status()
            .context("Templates request returned an error status")?;

        let body: TemplatesResponse = response
            .json()
            .await
            .context("Invalid templates payload")?;
        Ok(body.templates)
    }

    /// Submit a provisioning request for one template.
    pub async fn provision(
        &self,
        template_name: &str,
        parameters: Value,
    ) -> Result<ProvisionStatus> {
        let url = format!("{}/api/v1/self-service/provision", self.base_url);
        let request = ProvisionRequest {
            template_name,
            parameters,
        };

        let response = self
            .http
            .post(&url)
            .timeout(self.rest_timeout)
            .json(&request)
            .send()
            .await
            .context("Provision request failed")?
            .error_for_status()
            .context("Provision request returned an error status")?;

        let status: ProvisionStatus = response
            .json()
            .await
            .context("Invalid provision payload")?;

        tracing::info!(
            request_id = %status.request_id,
            template = template_name,
            "Provisioning request accepted"
        );
        Ok(status)
    }
}

#[async_trait]
impl ChatTransport for PortalClient {
    async fn send(&self, content: &str, conversation_id: &str) -> Result<ByteStream> {
        let url = format!("{}/api/v1/chat/stream", self.base_url);
        let request = ChatStreamRequest {
            message: content,
            conversation_id,
        };

        // No timeout here: the stream stays open for the whole turn.
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Chat request failed")?
            .error_for_status()
            .context("Chat request returned an error status")?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(anyhow::Error::from));
        Ok(Box::pin(stream))
    }
}
