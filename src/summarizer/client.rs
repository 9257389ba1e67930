use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::Client;

use super::prompt::{ChatRequest, RunSearch};
use crate::config::ChatConfig;
use crate::error::{CIDigestError, Result, SummaryError};

/// Client for the chat `send-message` endpoint.
///
/// No request timeout is set: answers are generated before the stream ends
/// and can take minutes.
pub struct ChatClient {
    client: Client,
    endpoint: String,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let endpoint = config
            .url
            .clone()
            .ok_or_else(|| CIDigestError::Config("Chat endpoint is not set".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        if let Some(cookie) = &config.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| CIDigestError::Config(format!("Invalid chat cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .user_agent(concat!("cidigest/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| CIDigestError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            config: config.clone(),
        })
    }

    /// Posts a prompt and returns the raw response body.
    pub async fn send(&self, prompt: String, run_search: RunSearch) -> std::result::Result<String, SummaryError> {
        let request = ChatRequest::new(&self.config, prompt, run_search);
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Chat request: {}",
                serde_json::to_string_pretty(&request).unwrap_or_default()
            );
        }

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Chat response ({status}): {body}");

        if !status.is_success() {
            return Err(SummaryError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }
        Ok(body)
    }
}
