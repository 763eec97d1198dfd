//! Google Translate backend (public `translate_a/single` endpoint).

use super::Translator;
use crate::error::{Result, ScribeError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Public endpoint used by the web client.
pub const DEFAULT_GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Translator backed by Google Translate.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    /// Create a translator against the default endpoint.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_endpoint(DEFAULT_GOOGLE_ENDPOINT, timeout)
    }

    /// Create a translator against a custom endpoint.
    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    fn request_url(&self, text: &str, source: &str, target: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|e| ScribeError::Config(format!("Invalid translation endpoint: {}", e)))
    }
}

/// Extract the translated text from the nested array response.
///
/// The body looks like `[[["Bonjour","Hello",null,null,10], ...], null, "en", ...]`;
/// long inputs are split into several sentence entries.
fn parse_response(body: &serde_json::Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| ScribeError::Translation("Unexpected response shape".to_string()))?;

    let text: String = sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(ScribeError::Translation("Empty translation returned".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl Translator for GoogleTranslator {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(ScribeError::Translation("Nothing to translate".to_string()));
        }

        let url = self.request_url(text, source, target)?;
        let body: serde_json::Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let translated = parse_response(&body)?;
        debug!("Translated {} chars into {} chars", text.len(), translated.len());
        Ok(translated)
    }
}
