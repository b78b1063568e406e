use async_trait::async_trait;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils;

use super::TextTranslator;

/// Separator markers a chunk may carry. Joined chunks put them on a line of their own.
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^<<SEG\d*>>$").expect("separator pattern"));

const API_VERSION: &str = "2023-06-01";

/// Anthropic client translating text through the messages API
#[derive(Debug)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    model: String,
    /// Template with {source_language}, {target_language} and {separator}
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// The content of the response
    pub content: Vec<AnthropicContent>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content, absent for non-text blocks
    #[serde(default)]
    pub text: String,
}

impl AnthropicRequest {
    /// Create a new Anthropic request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            temperature: None,
            max_tokens,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(AnthropicMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            system_prompt: String::new(),
            temperature: 0.3,
            max_tokens: 4096,
        })
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the request translating `text`
    pub fn build_request(&self, text: &str, source_lang: &str, target_lang: &str) -> AnthropicRequest {
        let separator = SEPARATOR.find(text).map(|m| m.as_str()).unwrap_or("<<SEG>>");
        let language = |code: &str| language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());
        let system = self
            .system_prompt
            .replace("{source_language}", &language(source_lang))
            .replace("{target_language}", &language(target_lang))
            .replace("{separator}", separator);

        let mut request = AnthropicRequest::new(self.model.clone(), self.max_tokens)
            .add_message("user", text)
            .temperature(self.temperature);
        if !system.trim().is_empty() {
            request = request.system(system);
        }
        request
    }

    /// Complete a messages request
    pub async fn complete(
        &self,
        request: &AnthropicRequest,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<AnthropicResponse, ProviderError> {
        let api_url = if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        };

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text, source_lang, target_lang));
        }

        response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Anthropic API response: {}", e)))
    }

    /// Extract text from Anthropic response
    pub fn extract_text_from_response(response: &AnthropicResponse) -> String {
        response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

#[async_trait]
impl TextTranslator for Anthropic {
    async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let mut translations = Vec::with_capacity(texts.len());
        for text in texts {
            let request = self.build_request(text, source_lang, target_lang);
            let response = self.complete(&request, source_lang, target_lang).await?;
            let translated = Self::extract_text_from_response(&response);
            if translated.trim().is_empty() {
                return Err(ProviderError::ParseError("Anthropic returned no text".to_string()));
            }
            debug!("Anthropic translated {} chars into {}", text.len(), translated.len());
            translations.push(translated);
        }
        Ok(translations)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
