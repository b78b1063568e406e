/*!
 * Error types for the doctrans library.
 *
 * This module contains custom error types for the different layers of the
 * translation pipeline, using the thiserror crate for ergonomic error definitions:
 * - `ProviderError`: transport and API failures of a translation provider
 * - `TranslationError`: the classification surfaced to pipeline callers
 * - `AppError`: wrapper used by the binary and configuration layer
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// HTTP statuses that are worth another attempt
const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Network-level failure while sending the request or reading the body
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Too many requests in a short period (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The account's character or document quota is used up
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider cannot translate between the requested languages
    #[error("Unsupported language pair {source_lang} -> {target_lang}: {message}")]
    UnsupportedLanguagePair {
        source_lang: String,
        target_lang: String,
        message: String,
    },

    /// A native document job reported `error`
    #[error("Document job {job_id} failed: {detail}")]
    JobFailed { job_id: String, detail: String },
}

impl ProviderError {
    /// Classify a non-success HTTP response.
    ///
    /// Language-pair errors are recognised from the message because providers
    /// report them as plain 400s.
    pub fn from_status(status_code: u16, message: impl Into<String>, source_lang: &str, target_lang: &str) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            456 => Self::QuotaExceeded(message),
            400 if mentions_language(&message) => Self::UnsupportedLanguagePair {
                source_lang: source_lang.to_string(),
                target_lang: target_lang.to_string(),
                message,
            },
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Whether the retry policy may attempt the call again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => RETRYABLE_STATUSES.contains(status_code),
            _ => false,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } => Some(*status_code),
            Self::RateLimitExceeded(_) => Some(429),
            Self::QuotaExceeded(_) => Some(456),
            _ => None,
        }
    }
}

fn mentions_language(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("target_lang") || lower.contains("source_lang") || lower.contains("language")
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::ApiError {
                status_code: status.as_u16(),
                message: error.to_string(),
            }
        } else {
            // timeouts and broken bodies land here
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors surfaced to callers of the translation pipeline
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// The container could not be parsed
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Extraction found nothing to translate
    #[error("No translatable content found in document")]
    NoTranslatableContent,

    /// The provider rejected the credentials
    #[error("Provider rejected credentials: {0}")]
    ProviderUnauthorized(String),

    /// The provider account is out of quota
    #[error("Provider quota exceeded: {0}")]
    ProviderQuotaExceeded(String),

    /// The provider does not support the language pair
    #[error("Provider does not support {source_lang} -> {target_lang}: {message}")]
    ProviderUnsupportedLanguagePair {
        source_lang: String,
        target_lang: String,
        message: String,
    },

    /// Any other provider failure once retries are exhausted
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// A native document job did not finish before the deadline
    #[error("Document job {job_id} timed out after {waited:?}")]
    Timeout { job_id: String, waited: Duration },

    /// The caller cancelled the run
    #[error("Translation run cancelled")]
    Cancelled,

    /// The rebuilt container failed structural validation
    #[error("Reconstructed document is invalid: {0}")]
    ReconstructionInvalid(String),
}

impl From<ProviderError> for TranslationError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::AuthenticationError(message) => Self::ProviderUnauthorized(message),
            ProviderError::QuotaExceeded(message) => Self::ProviderQuotaExceeded(message),
            ProviderError::UnsupportedLanguagePair { source_lang, target_lang, message } => {
                Self::ProviderUnsupportedLanguagePair { source_lang, target_lang, message }
            }
            other => Self::Provider(other),
        }
    }
}

impl From<zip::result::ZipError> for TranslationError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::MalformedDocument(format!("archive: {}", error))
    }
}

impl From<quick_xml::Error> for TranslationError {
    fn from(error: quick_xml::Error) -> Self {
        Self::MalformedDocument(format!("xml: {}", error))
    }
}

impl TranslationError {
    /// Stable classification used in result records
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedDocument(_) => ErrorKind::MalformedDocument,
            Self::NoTranslatableContent => ErrorKind::NoTranslatableContent,
            Self::ProviderUnauthorized(_) => ErrorKind::ProviderUnauthorized,
            Self::ProviderQuotaExceeded(_) => ErrorKind::ProviderQuotaExceeded,
            Self::ProviderUnsupportedLanguagePair { .. } => ErrorKind::ProviderUnsupportedLanguagePair,
            Self::Provider(_) => ErrorKind::ProviderFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ReconstructionInvalid(_) => ErrorKind::ReconstructionInvalid,
        }
    }
}

/// Error classification exposed in the structured result record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedDocument,
    NoTranslatableContent,
    ProviderUnauthorized,
    ProviderQuotaExceeded,
    ProviderUnsupportedLanguagePair,
    ProviderFailure,
    Timeout,
    Cancelled,
    ReconstructionInvalid,
}

/// Non-fatal conditions attached to a successful result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Some chunks kept their original text because the separator did not survive
    PartialTranslation,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the translation pipeline
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
