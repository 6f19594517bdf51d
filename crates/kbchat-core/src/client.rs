use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::ChatError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Body of a successful reply. `message` is required.
#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Capability to deliver one message to an endpoint and get the reply text.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, endpoint: Endpoint, message: &str) -> Result<String, ChatError>;
}

/// Parse a 200 response body into the reply text.
pub fn parse_reply(body: &str) -> Result<String, ChatError> {
    serde_json::from_str::<ChatReply>(body)
        .map(|reply| reply.message)
        .map_err(|e| ChatError::Malformed(e.to_string()))
}

#[derive(Clone, Debug)]
pub struct HttpChatClient {
    client: Client,
    base_url: Url,
}

impl HttpChatClient {
    pub fn new(base_url: &str) -> Result<Self, ChatError> {
        Self::with_timeout(base_url, None)
    }

    /// Build a client. Without a timeout a request waits as long as the
    /// server takes.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ChatError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ChatError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, ChatError> {
        Ok(self.base_url.join(endpoint.path())?)
    }
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn send(&self, endpoint: Endpoint, message: &str) -> Result<String, ChatError> {
        let url = self.endpoint_url(endpoint)?;

        let response = self
            .client
            .post(url)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(ChatError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(ChatError::from_transport)?;

        if status != StatusCode::OK {
            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => tracing::warn!(status = status.as_u16(), error = %err.error, "server rejected message"),
                Err(_) => tracing::warn!(status = status.as_u16(), "server rejected message"),
            }
            return Err(ChatError::Server {
                status: status.as_u16(),
            });
        }

        parse_reply(&body)
    }
}
