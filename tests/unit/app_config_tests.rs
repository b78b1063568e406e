/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use doctrans::app_config::{Config, LogLevel, TranslationMode, TranslationProvider};
use doctrans::document::ArchiveLimits;
use doctrans::translation::{PipelineOptions, RetryPolicy};
use std::time::Duration;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.provider, TranslationProvider::DeepL);
    assert_eq!(config.translation.mode, TranslationMode::TextBatch);

    let common = &config.translation.common;
    assert_eq!(common.retry_count, 3);
    assert_eq!(common.retry_backoff_ms, 1000);
    assert_eq!(common.backoff_multiplier, 2.0);
    assert_eq!(common.max_backoff_ms, 10_000);

    assert_eq!(config.chunking.max_chars, 4500);
    assert_eq!(config.polling.interval(), Duration::from_secs(2));
    assert_eq!(config.polling.timeout(), Duration::from_secs(300));
    assert_eq!(config.archive_limits(), ArchiveLimits::default());
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    // Default config has no API key
    assert!(Config::default().validate().is_err());

    let mut config = common::config_with_key();
    assert!(config.validate().is_ok());

    // Invalid source language
    config.source_language = "e".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    // Same language on both sides, written differently
    config.target_language = "eng".to_string();
    assert!(config.validate().is_err());
    config.target_language = "fr".to_string();

    // Non-positive values
    config.chunking.max_chars = 0;
    assert!(config.validate().is_err());
    config.chunking.max_chars = 4500;

    config.translation.common.retry_count = 0;
    assert!(config.validate().is_err());
    config.translation.common.retry_count = 3;

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_withAnthropicNativeMode_shouldFail() {
    let mut config = common::config_with_key();
    config.translation.provider = TranslationProvider::Anthropic;
    if let Some(provider) = config
        .translation
        .available_providers
        .iter_mut()
        .find(|p| p.provider_type == "anthropic")
    {
        provider.api_key = "sk-ant-test".to_string();
    }
    assert!(config.validate().is_ok());

    config.translation.mode = TranslationMode::NativeDocument;
    assert!(config.validate().is_err());
}

#[test]
fn test_get_endpoint_withFreeKey_shouldUseFreeApi() {
    let config = common::config_with_key();
    assert_eq!(config.translation.get_endpoint(), "https://api-free.deepl.com");

    let mut config = Config::default();
    if let Some(provider) = config.translation.available_providers.iter_mut().find(|p| p.provider_type == "deepl") {
        provider.api_key = "paid-key".to_string();
    }
    assert_eq!(config.translation.get_endpoint(), "https://api.deepl.com");
}

#[test]
fn test_provider_fromStr_shouldAcceptAnyCase() {
    assert_eq!("DeepL".parse::<TranslationProvider>().unwrap(), TranslationProvider::DeepL);
    assert_eq!("anthropic".parse::<TranslationProvider>().unwrap(), TranslationProvider::Anthropic);
    assert!("ollama".parse::<TranslationProvider>().is_err());
}

#[test]
fn test_config_fromMinimalJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "source_language": "de",
        "target_language": "it",
        "translation": { "provider": "deepl", "mode": "native_document" }
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.translation.mode, TranslationMode::NativeDocument);
    assert_eq!(config.translation.common.retry_count, 3);
    assert_eq!(config.chunking.max_chars, 4500);
    assert_eq!(config.limits.max_archive_entries, 10_000);
    Ok(())
}

#[test]
fn test_config_save_then_fromFile_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = common::config_with_key();
    config.chunking.max_chars = 1200;
    config.polling.interval_ms = 500;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.chunking.max_chars, 1200);
    assert_eq!(loaded.polling.interval_ms, 500);
    assert_eq!(loaded.translation.get_api_key(), "test-key:fx");
    Ok(())
}

#[test]
fn test_pipeline_options_fromConfig_shouldCarrySettings() {
    let mut config = common::config_with_key();
    config.translation.common.retry_backoff_ms = 250;
    config.chunking.max_chars = 900;

    let options = PipelineOptions::from(&config);
    assert_eq!(options.max_chars, 900);
    assert_eq!(options.max_concurrent_requests, 4);
    assert_eq!(
        options.retry,
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10_000),
        }
    );
}
