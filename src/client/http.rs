use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, header};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::api::MessageApi;
use super::error::ApiError;
use crate::config::{EndpointConfig, ServerConfig};
use crate::models::{ConversationRef, SendTarget};
use crate::utils::endpoint_url;

/// `MessageApi` over JSON-over-HTTP
#[derive(Clone)]
pub struct HttpMessageApi {
    http_client: reqwest::Client,
    base_url: String,
    endpoints: EndpointConfig,
}

impl HttpMessageApi {
    pub fn new(server: &ServerConfig, endpoints: EndpointConfig) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(token) = &server.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Configuration(format!("invalid token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = server.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self { http_client: builder.build()?, base_url: server.base_url.clone(), endpoints })
    }

    fn url(&self, template: &str, conversation: Option<&ConversationRef>) -> String {
        endpoint_url(&self.base_url, template, conversation.map(|c| c.id.as_str()))
    }

    /// Send `request` and read its body, racing both awaits against `token`
    async fn execute(
        &self,
        request: RequestBuilder,
        token: &CancellationToken,
    ) -> Result<String, ApiError> {
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(target: "http::execute", "Cancelled before the response arrived");
                return Err(ApiError::Cancelled);
            }
            res = request.send() => res?,
        };

        let status = response.status();
        let body = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(target: "http::execute", "Cancelled while reading the response body");
                return Err(ApiError::Cancelled);
            }
            text = response.text() => text?,
        };

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), body));
        }
        Ok(body)
    }
}

#[async_trait]
impl MessageApi for HttpMessageApi {
    async fn list_messages(
        &self,
        conversation: &ConversationRef,
        token: CancellationToken,
    ) -> Result<Value, ApiError> {
        let url = self.url(&self.endpoints.list_messages, Some(conversation));
        debug!(target: "http::list_messages", conversation = %conversation, %url, "Fetching snapshot");

        let body = self.execute(self.http_client.get(&url), &token).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ApiError::ResponseParsing(e.to_string()))
    }

    async fn send_message(&self, target: &SendTarget, text: &str) -> Result<(), ApiError> {
        let url = self.url(&self.endpoints.send, None);
        let request = self.http_client.post(&url).json(&target.request_body(text));
        self.execute(request, &CancellationToken::new()).await?;
        Ok(())
    }

    async fn resync(&self, conversation: &ConversationRef) -> Result<(), ApiError> {
        let token = CancellationToken::new();
        let sync_url = self.url(&self.endpoints.resync, Some(conversation));
        let rebuild_url = self.url(&self.endpoints.rebuild, None);

        let synced = self.execute(self.http_client.post(&sync_url), &token).await;
        if let Err(e) = &synced {
            warn!(target: "http::resync", conversation = %conversation, "Sync request failed: {}", e);
        }
        // Rebuild runs even when the per-conversation sync failed
        self.execute(self.http_client.post(&rebuild_url), &token).await?;
        synced.map(|_| ())
    }
}
