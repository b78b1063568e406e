/*!
 * DeepL client.
 *
 * Text is translated through `/v2/translate`. Whole documents go through the
 * asynchronous `/v2/document` endpoints: upload, status, result.
 */

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::document::Document;
use crate::errors::ProviderError;
use crate::language_utils;

use super::{DocumentTranslator, JobHandle, JobStatus, TextTranslator};

/// DeepL API client
#[derive(Debug)]
pub struct DeepL {
    client: Client,
    api_key: String,
    /// Base URL, `https://api.deepl.com` or `https://api-free.deepl.com`
    endpoint: String,
}

/// Body of a `/v2/translate` request
#[derive(Debug, Serialize)]
pub struct TranslateRequest<'a> {
    pub text: &'a [String],
    pub source_lang: String,
    pub target_lang: String,
    /// Keep line breaks so separator lines survive
    pub preserve_formatting: bool,
    pub split_sentences: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TranslateResponse {
    pub translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
pub struct TranslatedText {
    #[serde(default)]
    pub detected_source_language: Option<String>,
    pub text: String,
}

/// Response to a document upload
#[derive(Debug, Deserialize)]
pub struct DocumentHandleResponse {
    pub document_id: String,
    pub document_key: String,
}

#[derive(Debug, Serialize)]
struct DocumentKeyRequest<'a> {
    document_key: &'a str,
}

/// Response to a document status request
#[derive(Debug, Deserialize)]
pub struct DocumentStatusResponse {
    pub status: String,
    #[serde(default)]
    pub seconds_remaining: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
    // older API versions name it `message`
    #[serde(default)]
    pub message: Option<String>,
}

impl DocumentStatusResponse {
    pub fn to_job_status(&self) -> Result<JobStatus, ProviderError> {
        match self.status.as_str() {
            "queued" => Ok(JobStatus::Queued),
            "translating" => Ok(JobStatus::Translating),
            "done" => Ok(JobStatus::Done),
            "error" => Ok(JobStatus::Error(
                self.error_message
                    .clone()
                    .or_else(|| self.message.clone())
                    .unwrap_or_else(|| "unknown error".to_string()),
            )),
            other => Err(ProviderError::ParseError(format!("Unknown document status: {}", other))),
        }
    }
}

/// Source language code as DeepL expects it
pub fn source_code(code: &str) -> Result<String, ProviderError> {
    language_utils::provider_code(code).map_err(|e| ProviderError::ParseError(e.to_string()))
}

/// Target language code as DeepL expects it; English and Portuguese need a variant
pub fn target_code(code: &str) -> Result<String, ProviderError> {
    let code = source_code(code)?;
    Ok(match code.as_str() {
        "EN" => "EN-US".to_string(),
        "PT" => "PT-PT".to_string(),
        _ => code,
    })
}

impl DeepL {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
    }

    /// Send `request` and turn non-success statuses into provider errors
    async fn send(
        &self,
        request: RequestBuilder,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Response, ProviderError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("DeepL API error ({}): {}", status, error_text);
        Err(ProviderError::from_status(status.as_u16(), error_text, source_lang, target_lang))
    }
}

#[async_trait]
impl TextTranslator for DeepL {
    async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let body = TranslateRequest {
            text: texts,
            source_lang: source_code(source_lang)?,
            target_lang: target_code(target_lang)?,
            preserve_formatting: true,
            split_sentences: "nonewlines",
        };
        let response = self
            .send(self.post("/v2/translate").json(&body), source_lang, target_lang)
            .await?;
        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepL response: {}", e)))?;

        if parsed.translations.len() != texts.len() {
            return Err(ProviderError::ParseError(format!(
                "DeepL returned {} translations for {} texts",
                parsed.translations.len(),
                texts.len()
            )));
        }
        Ok(parsed.translations.into_iter().map(|t| t.text).collect())
    }

    fn name(&self) -> &str {
        "deepl"
    }
}

#[async_trait]
impl DocumentTranslator for DeepL {
    async fn submit_document(
        &self,
        document: &Document,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<JobHandle, ProviderError> {
        let file = Part::bytes(document.bytes().to_vec()).file_name(document.file_name());
        let form = Form::new()
            .text("source_lang", source_code(source_lang)?)
            .text("target_lang", target_code(target_lang)?)
            .part("file", file);

        let response = self
            .send(self.post("/v2/document").multipart(form), source_lang, target_lang)
            .await?;
        let handle: DocumentHandleResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepL upload response: {}", e)))?;

        debug!("DeepL accepted document {}", handle.document_id);
        Ok(JobHandle {
            id: handle.document_id,
            key: Some(handle.document_key),
        })
    }

    async fn poll_status(&self, handle: &JobHandle) -> Result<JobStatus, ProviderError> {
        let body = DocumentKeyRequest {
            document_key: handle.key.as_deref().unwrap_or_default(),
        };
        let path = format!("/v2/document/{}", handle.id);
        let response = self.send(self.post(&path).json(&body), "", "").await?;
        let status: DocumentStatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepL status: {}", e)))?;

        if let Some(remaining) = status.seconds_remaining {
            debug!("DeepL document {}: {} ({}s remaining)", handle.id, status.status, remaining);
        }
        status.to_job_status()
    }

    async fn download_result(&self, handle: &JobHandle) -> Result<Bytes, ProviderError> {
        let body = DocumentKeyRequest {
            document_key: handle.key.as_deref().unwrap_or_default(),
        };
        let path = format!("/v2/document/{}/result", handle.id);
        let response = self.send(self.post(&path).json(&body), "", "").await?;
        Ok(response.bytes().await?)
    }

    fn name(&self) -> &str {
        "deepl"
    }
}
