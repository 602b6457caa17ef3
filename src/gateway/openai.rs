// ABOUTME: HTTP implementation of the assistant API against the OpenAI Assistants v2 endpoints.
// ABOUTME: Every call sends bearer auth plus the assistants=v2 beta header.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::GatewayError;
use crate::gateway::GatewayConfig;
use crate::gateway::api::{AssistantApi, Run, ThreadMessage};

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

pub struct OpenAiAssistants {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiAssistants {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .user_agent(concat!("threadchat/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistants {
    async fn create_thread(&self) -> Result<String, GatewayError> {
        let created: Created = self
            .send(self.http.post(self.url("/threads")).json(&json!({})))
            .await?;
        Ok(created.id)
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> Result<(), GatewayError> {
        let _: Created = self
            .send(
                self.http
                    .post(self.url(&format!("/threads/{thread_id}/messages")))
                    .json(&json!({ "role": "user", "content": content })),
            )
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, GatewayError> {
        self.send(
            self.http
                .post(self.url(&format!("/threads/{thread_id}/runs")))
                .json(&json!({ "assistant_id": assistant_id })),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, GatewayError> {
        self.send(
            self.http
                .get(self.url(&format!("/threads/{thread_id}/runs/{run_id}"))),
        )
        .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, GatewayError> {
        let list: MessageList = self
            .send(
                self.http
                    .get(self.url(&format!("/threads/{thread_id}/messages")))
                    .query(&[("order", "desc")]),
            )
            .await?;
        Ok(list.data)
    }
}
