use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::language_utils;

/// Application configuration module
/// This module handles the pipeline configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language codes (ISO) for translation and dubbing
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,

    /// Transcription config
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Dubbing config
    #[serde(default)]
    pub dubbing: DubbingConfig,

    /// Subtitle standards config
    #[serde(default)]
    pub standards: StandardsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Speech-to-text provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SttProvider {
    /// OpenAI-compatible Whisper endpoint
    #[default]
    Whisper,
    /// Deepgram listen API
    Deepgram,
}

impl SttProvider {
    /// Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Whisper => "Whisper",
            Self::Deepgram => "Deepgram",
        }
    }
}

impl std::fmt::Display for SttProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Whisper => write!(f, "whisper"),
            Self::Deepgram => write!(f, "deepgram"),
        }
    }
}

impl std::str::FromStr for SttProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "whisper" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            _ => Err(anyhow!("Invalid speech-to-text provider: {}", s)),
        }
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    /// Anthropic messages API
    #[default]
    Anthropic,
    /// OpenAI chat completions API
    OpenAI,
    /// Local Ollama server
    Ollama,
}

impl TranslationProvider {
    /// Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::OpenAI => "OpenAI",
            Self::Ollama => "Ollama",
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAI => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid translation provider: {}", s)),
        }
    }
}

/// Transcription stage configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Provider fallback chain, in priority order
    #[serde(default = "default_stt_providers")]
    pub providers: Vec<SttProvider>,

    /// Whisper endpoint configuration
    #[serde(default)]
    pub whisper: WhisperConfig,

    /// Deepgram endpoint configuration
    #[serde(default)]
    pub deepgram: DeepgramConfig,

    /// Whole-job timeout in seconds
    #[serde(default = "default_transcription_timeout_secs")]
    pub job_timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            providers: default_stt_providers(),
            whisper: WhisperConfig::default(),
            deepgram: DeepgramConfig::default(),
            job_timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

/// Whisper endpoint configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WhisperConfig {
    /// Service endpoint URL (empty for the public API)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_whisper_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_stt_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: default_whisper_model(),
            timeout_secs: default_stt_timeout_secs(),
        }
    }
}

/// Deepgram endpoint configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeepgramConfig {
    /// Service endpoint URL (empty for the public API)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_deepgram_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_stt_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeepgramConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: default_deepgram_model(),
            timeout_secs: default_stt_timeout_secs(),
        }
    }
}

/// Translation stage configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Provider fallback chain, in priority order
    #[serde(default = "default_translation_providers")]
    pub providers: Vec<TranslationProvider>,

    /// Anthropic configuration
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI configuration
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Maximum segments packed into one batch prompt
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-batch timeout in seconds
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,

    /// Maximum target languages translated concurrently
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            providers: default_translation_providers(),
            anthropic: AnthropicConfig::default(),
            openai: OpenAIConfig::default(),
            ollama: OllamaConfig::default(),
            batch_size: default_batch_size(),
            batch_timeout_secs: default_batch_timeout_secs(),
            max_concurrent_batches: default_max_concurrent_batches(),
        }
    }
}

/// Anthropic service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnthropicConfig {
    /// Service endpoint URL (empty for the public API)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: default_anthropic_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_translation_timeout_secs(),
        }
    }
}

/// OpenAI service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    /// Service endpoint URL (empty for the public API)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_translation_timeout_secs(),
        }
    }
}

/// Ollama service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_ollama_port")]
    pub port: u16,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            port: default_ollama_port(),
            model: default_ollama_model(),
        }
    }
}

/// Dubbing stage configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DubbingConfig {
    /// Service endpoint URL (empty for the public API)
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Synthesis model identifier
    #[serde(default = "default_synthesis_model")]
    pub model_id: String,

    /// Voice used when a job does not carry its own voice id
    #[serde(default = "String::new")]
    pub default_voice_id: String,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DubbingConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model_id: default_synthesis_model(),
            default_voice_id: String::new(),
            timeout_secs: default_translation_timeout_secs(),
        }
    }
}

/// Subtitle standards configuration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct StandardsConfig {
    /// Apply the stricter youth reading-speed cap
    #[serde(default)]
    pub youth_content: bool,
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_languages: default_target_languages(),
            transcription: TranscriptionConfig::default(),
            translation: TranslationConfig::default(),
            dubbing: DubbingConfig::default(),
            standards: StandardsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file if it exists, otherwise use defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate language codes and chain shapes
    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.source_language)
            .context("Invalid source language")?;

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language must be configured"));
        }
        for code in &self.target_languages {
            language_utils::validate_language_code(code)
                .with_context(|| format!("Invalid target language: {}", code))?;
        }

        if self.transcription.providers.is_empty() {
            return Err(anyhow!(
                "At least one speech-to-text provider must be configured"
            ));
        }
        if self.translation.providers.is_empty() {
            return Err(anyhow!(
                "At least one translation provider must be configured"
            ));
        }
        if self.translation.batch_size == 0 {
            return Err(anyhow!("Translation batch size must be positive"));
        }

        Ok(())
    }
}

fn default_source_language() -> String {
    "bn".to_string()
}

fn default_target_languages() -> Vec<String> {
    ["en", "hi", "es", "fr", "ar"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_stt_providers() -> Vec<SttProvider> {
    vec![SttProvider::Whisper, SttProvider::Deepgram]
}

fn default_translation_providers() -> Vec<TranslationProvider> {
    vec![TranslationProvider::Anthropic, TranslationProvider::OpenAI]
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_deepgram_model() -> String {
    "nova-2".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ollama_host() -> String {
    "localhost".to_string()
}

fn default_ollama_port() -> u16 {
    11434
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_synthesis_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_stt_timeout_secs() -> u64 {
    300
}

fn default_translation_timeout_secs() -> u64 {
    120
}

fn default_transcription_timeout_secs() -> u64 {
    600
}

fn default_batch_timeout_secs() -> u64 {
    300
}

fn default_batch_size() -> usize {
    25
}

fn default_max_concurrent_batches() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shouldValidate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.source_language, "bn");
        assert_eq!(config.target_languages.len(), 5);
    }

    #[test]
    fn test_validate_withBadTargetLanguage_shouldReject() {
        let mut config = Config::default();
        config.target_languages = vec!["xx".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_withEmptyProviderChain_shouldReject() {
        let mut config = Config::default();
        config.transcription.providers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fromFile_withPartialJson_shouldFillDefaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.json");
        std::fs::write(&path, r#"{"source_language": "bn", "log_level": "debug"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.translation.batch_size, 25);
        assert_eq!(
            config.transcription.providers,
            vec![SttProvider::Whisper, SttProvider::Deepgram]
        );
    }

    #[test]
    fn test_fromFileOrDefault_withMissingFile_shouldUseDefaults() {
        let config = Config::from_file_or_default("/definitely/not/here/conf.json").unwrap();
        assert_eq!(config.source_language, "bn");
    }

    #[test]
    fn test_saveToFile_shouldRoundTrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.json");

        let mut config = Config::default();
        config.standards.youth_content = true;
        config.save_to_file(&path).unwrap();

        let reloaded = Config::from_file(&path).unwrap();
        assert!(reloaded.standards.youth_content);
    }

    #[test]
    fn test_providerEnums_shouldRoundTripThroughStrings() {
        let stt: SttProvider = "deepgram".parse().unwrap();
        assert_eq!(stt, SttProvider::Deepgram);
        assert_eq!(stt.to_string(), "deepgram");

        let translation: TranslationProvider = "openai".parse().unwrap();
        assert_eq!(translation, TranslationProvider::OpenAI);
        assert_eq!(translation.display_name(), "OpenAI");
    }
}
