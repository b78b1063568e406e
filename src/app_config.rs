use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::document::ArchiveLimits;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Chunk sizing
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Native document job polling
    #[serde(default)]
    pub polling: PollingConfig,

    /// Archive safety limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: DeepL (text and documents)
    #[default]
    DeepL,
    // @provider: Anthropic (text only)
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::DeepL => "DeepL",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::DeepL => "deepl".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    // @returns: Whether the provider accepts whole documents
    pub fn supports_documents(&self) -> bool {
        matches!(self, Self::DeepL)
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "deepl" => Ok(Self::DeepL),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// How documents reach the provider
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranslationMode {
    /// Extract, chunk, translate text, reinsert
    #[default]
    TextBatch,
    /// Upload the whole document and poll for the result
    NativeDocument,
}

impl std::fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextBatch => write!(f, "text_batch"),
            Self::NativeDocument => write!(f, "native_document"),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::DeepL => Self {
                provider_type: "deepl".to_string(),
                model: String::new(),
                api_key: String::new(),
                endpoint: String::new(),
                concurrent_requests: default_concurrent_requests(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Text batches or whole documents
    #[serde(default)]
    pub mode: TranslationMode,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for LLM providers
    /// Placeholders: {source_language}, {target_language}, {separator}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Attempts per provider call, the first one included
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay before the second attempt in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Growth factor of the delay between attempts
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound of the delay between attempts in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Chunk sizing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Character budget of one translation request
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

/// Native document job polling
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollingConfig {
    /// Pause between status requests in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Give up on a job after this many seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Archive safety limits
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Maximum number of entries in an archive
    #[serde(default = "default_max_archive_entries")]
    pub max_archive_entries: usize,

    /// Maximum decompressed size of one archive part in bytes
    #[serde(default = "default_max_part_bytes")]
    pub max_part_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_archive_entries: default_max_archive_entries(),
            max_part_bytes: default_max_part_bytes(),
        }
    }
}

impl From<&LimitsConfig> for ArchiveLimits {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            max_entries: limits.max_archive_entries,
            max_part_bytes: limits.max_part_bytes,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second before the second attempt, doubled on each retry
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_chars() -> usize {
    4500
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_timeout_secs() -> u64 {
    300
}

fn default_max_archive_entries() -> usize {
    10_000
}

fn default_max_part_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_deepl_endpoint(api_key: &str) -> String {
    // free-tier keys only work against the free endpoint
    if api_key.ends_with(":fx") {
        "https://api-free.deepl.com".to_string()
    } else {
        "https://api.deepl.com".to_string()
    }
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional translator. Translate the following text from {source_language} to {target_language}. The text is split into segments by lines containing only {separator}. Keep every {separator} line exactly as it is, translate each segment independently and return nothing but the translation.".to_string()
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let reader = BufReader::new(file);
        let config: Config =
            serde_json::from_reader(reader).context(format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json).context(format!("Failed to write config to file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;
        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Source and target language are the same: {} / {}",
                self.source_language,
                self.target_language
            ));
        }

        // Every supported provider needs an API key
        if self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        if self.translation.mode == TranslationMode::NativeDocument && !self.translation.provider.supports_documents() {
            return Err(anyhow!(
                "{} provider does not support native document translation",
                self.translation.provider.display_name()
            ));
        }

        let endpoint = self.translation.get_endpoint();
        url::Url::parse(&endpoint).context(format!("Invalid provider endpoint: {}", endpoint))?;

        let common = &self.translation.common;
        if common.retry_count == 0 {
            return Err(anyhow!("retry_count must be at least 1"));
        }
        if common.backoff_multiplier < 1.0 {
            return Err(anyhow!("backoff_multiplier must be at least 1.0"));
        }
        if self.chunking.max_chars == 0 {
            return Err(anyhow!("chunking.max_chars must be greater than 0"));
        }
        if self.polling.interval_ms == 0 || self.polling.timeout_secs == 0 {
            return Err(anyhow!("polling interval and timeout must be greater than 0"));
        }
        if self.limits.max_archive_entries == 0 || self.limits.max_part_bytes == 0 {
            return Err(anyhow!("archive limits must be greater than 0"));
        }

        Ok(())
    }

    pub fn archive_limits(&self) -> ArchiveLimits {
        ArchiveLimits::from(&self.limits)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
            translation: TranslationConfig::default(),
            chunking: ChunkingConfig::default(),
            polling: PollingConfig::default(),
            limits: LimitsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    pub fn optimal_concurrent_requests(&self) -> usize {
        // Check if the provider exists in the available_providers
        if let Some(provider_config) = self.get_active_provider_config() {
            return provider_config.concurrent_requests.max(1);
        }

        // Default fallback
        default_concurrent_requests()
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            TranslationProvider::DeepL => String::new(),
            TranslationProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|provider_config| provider_config.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::DeepL => default_deepl_endpoint(&self.get_api_key()),
            TranslationProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout(&self) -> Duration {
        let secs = match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        };
        Duration::from_secs(secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            mode: TranslationMode::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::DeepL),
                ProviderConfig::new(TranslationProvider::Anthropic),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
