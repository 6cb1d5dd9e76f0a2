use super::extract::{extract_answer, truncate_chars, RAW_BODY_LIMIT};
use super::types::{Content, GenerateContentRequest};
use crate::ai::GenerativeModel;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used for both text and image problems.
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini REST client for `generateContent`.
///
/// Holds the credential resolved at startup; a client without one rejects
/// every call before touching the network.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::new_with_client(api_key, Client::new())
    }

    pub fn new_with_client(api_key: Option<String>, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Configuration("GEMINI_API_KEY not configured on server".to_string())
        })
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, GEMINI_MODEL
        )
    }
}

/// Render an error with its sources, e.g. `error sending request: connection refused`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_content(&self, contents: &[Content]) -> Result<String> {
        let api_key = self.api_key()?;

        tracing::debug!(
            "Sending generateContent request to Gemini ({} messages)",
            contents.len()
        );

        let response = self
            .client
            .post(self.generate_content_url())
            .query(&[("key", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .json(&GenerateContentRequest { contents })
            .send()
            .await
            .map_err(|e| {
                let cause = error_chain(&e.without_url());
                tracing::error!("Failed to send request to Gemini: {}", cause);
                Error::UpstreamUnreachable(cause)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            let cause = error_chain(&e.without_url());
            tracing::error!("Failed to read Gemini response body: {}", cause);
            Error::UpstreamUnreachable(cause)
        })?;

        if !status.is_success() {
            tracing::error!("Gemini API error (status {}): {}", status, body);
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!(
                    "Gemini API error: {}",
                    truncate_chars(&body, RAW_BODY_LIMIT)
                ),
            });
        }

        Ok(extract_answer(&body))
    }
}
