//! Application settings
//!
//! Settings are read from the process environment after loading an optional
//! `.env` file. [`Settings::global`] keeps a single instance per process.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is missing or empty
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// A variable could not be parsed into its target type
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Environment variable names
pub mod vars {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_API_BASE: &str = "OPENAI_API_BASE";
    pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";
    pub const TAVILY_MAX_RESULTS: &str = "TAVILY_MAX_RESULTS";
    pub const LLM_MODEL: &str = "LLM_MODEL";
    pub const LLM_TEMPERATURE: &str = "LLM_TEMPERATURE";
    pub const EMBEDDING_MODEL: &str = "EMBEDDING_MODEL";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const FINANCE_CACHE_DIR: &str = "FINANCE_CACHE_DIR";
    pub const FINANCE_CACHE_HOURS: &str = "FINANCE_CACHE_HOURS";
    pub const FINANCE_MAX_RETRIES: &str = "FINANCE_MAX_RETRIES";
    pub const REPORT_LANGUAGE: &str = "REPORT_LANGUAGE";
}

/// API keys and tunables shared by every agent
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    pub openai_api_key: String,
    /// Override for OpenAI-compatible endpoints
    pub openai_api_base: Option<String>,
    pub tavily_api_key: String,
    pub tavily_max_results: usize,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub embedding_model: String,
    pub log_level: String,
    pub finance_cache_dir: PathBuf,
    pub finance_cache_hours: u64,
    pub finance_max_retries: u32,
    /// Language code for prompts and reports ("en" or "ko")
    pub report_language: String,
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

impl Settings {
    pub const DEFAULT_TAVILY_MAX_RESULTS: usize = 5;
    pub const DEFAULT_LLM_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_EMBEDDING_MODEL: &'static str = "text-embedding-3-small";
    pub const DEFAULT_LOG_LEVEL: &'static str = "INFO";
    pub const DEFAULT_CACHE_DIR: &'static str = "./cache";
    pub const DEFAULT_CACHE_HOURS: u64 = 2;
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_REPORT_LANGUAGE: &'static str = "en";

    /// Load settings from the environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to read .env file: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            openai_api_key: required(vars::OPENAI_API_KEY)?,
            openai_api_base: get(vars::OPENAI_API_BASE),
            tavily_api_key: required(vars::TAVILY_API_KEY)?,
            tavily_max_results: parse_or(
                vars::TAVILY_MAX_RESULTS,
                get(vars::TAVILY_MAX_RESULTS),
                Self::DEFAULT_TAVILY_MAX_RESULTS,
            )?,
            llm_model: get(vars::LLM_MODEL).unwrap_or_else(|| Self::DEFAULT_LLM_MODEL.to_string()),
            llm_temperature: parse_or(vars::LLM_TEMPERATURE, get(vars::LLM_TEMPERATURE), 0.0)?,
            embedding_model: get(vars::EMBEDDING_MODEL)
                .unwrap_or_else(|| Self::DEFAULT_EMBEDDING_MODEL.to_string()),
            log_level: get(vars::LOG_LEVEL).unwrap_or_else(|| Self::DEFAULT_LOG_LEVEL.to_string()),
            finance_cache_dir: get(vars::FINANCE_CACHE_DIR)
                .map_or_else(|| PathBuf::from(Self::DEFAULT_CACHE_DIR), PathBuf::from),
            finance_cache_hours: parse_or(
                vars::FINANCE_CACHE_HOURS,
                get(vars::FINANCE_CACHE_HOURS),
                Self::DEFAULT_CACHE_HOURS,
            )?,
            finance_max_retries: parse_or(
                vars::FINANCE_MAX_RETRIES,
                get(vars::FINANCE_MAX_RETRIES),
                Self::DEFAULT_MAX_RETRIES,
            )?,
            report_language: get(vars::REPORT_LANGUAGE)
                .unwrap_or_else(|| Self::DEFAULT_REPORT_LANGUAGE.to_string()),
        })
    }

    /// Process-wide settings, loaded on first access
    pub fn global() -> Result<&'static Self, ConfigError> {
        if let Some(settings) = SETTINGS.get() {
            return Ok(settings);
        }
        let loaded = Self::from_env()?;
        Ok(SETTINGS.get_or_init(|| loaded))
    }

    /// Tracing filter directive matching `log_level`
    pub fn tracing_level(&self) -> &'static str {
        match self.log_level.to_ascii_uppercase().as_str() {
            "TRACE" => "trace",
            "DEBUG" => "debug",
            "WARN" | "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
    }
}

// Keys stay out of logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &"***")
            .field("openai_api_base", &self.openai_api_base)
            .field("tavily_api_key", &"***")
            .field("tavily_max_results", &self.tavily_max_results)
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("embedding_model", &self.embedding_model)
            .field("log_level", &self.log_level)
            .field("finance_cache_dir", &self.finance_cache_dir)
            .field("finance_cache_hours", &self.finance_cache_hours)
            .field("finance_max_retries", &self.finance_max_retries)
            .field("report_language", &self.report_language)
            .finish()
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings =
            Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1"), ("TAVILY_API_KEY", "tv-1")]))
                .unwrap();

        assert_eq!(settings.openai_api_key, "sk-1");
        assert_eq!(settings.tavily_api_key, "tv-1");
        assert_eq!(settings.tavily_max_results, 5);
        assert_eq!(settings.llm_model, "gpt-4o-mini");
        assert!(settings.llm_temperature.abs() < f32::EPSILON);
        assert_eq!(settings.log_level, "INFO");
        assert_eq!(settings.finance_cache_dir, PathBuf::from("./cache"));
        assert_eq!(settings.finance_cache_hours, 2);
        assert_eq!(settings.finance_max_retries, 3);
        assert!(settings.openai_api_base.is_none());
        assert_eq!(settings.report_language, "en");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("TAVILY_API_KEY", "tv-1"),
            ("TAVILY_MAX_RESULTS", "8"),
            ("LLM_MODEL", "gpt-4o"),
            ("LLM_TEMPERATURE", "0.3"),
            ("OPENAI_API_BASE", "http://localhost:1234/v1"),
            ("FINANCE_CACHE_HOURS", "6"),
            ("REPORT_LANGUAGE", "ko"),
        ]))
        .unwrap();

        assert_eq!(settings.tavily_max_results, 8);
        assert_eq!(settings.llm_model, "gpt-4o");
        assert!((settings.llm_temperature - 0.3).abs() < 1e-6);
        assert_eq!(
            settings.openai_api_base.as_deref(),
            Some("http://localhost:1234/v1")
        );
        assert_eq!(settings.finance_cache_hours, 6);
        assert_eq!(settings.report_language, "ko");
    }

    #[test]
    fn test_missing_required_key() {
        let err = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TAVILY_API_KEY")));

        // Blank values count as missing
        let err = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "  "), ("TAVILY_API_KEY", "x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));
    }

    #[test]
    fn test_invalid_number() {
        let err = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("TAVILY_API_KEY", "tv-1"),
            ("TAVILY_MAX_RESULTS", "five"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "TAVILY_MAX_RESULTS",
                ..
            }
        ));
    }

    #[test]
    fn test_tracing_level() {
        let mut settings =
            Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "a"), ("TAVILY_API_KEY", "b")]))
                .unwrap();
        assert_eq!(settings.tracing_level(), "info");

        settings.log_level = "warning".to_string();
        assert_eq!(settings.tracing_level(), "warn");

        settings.log_level = "DEBUG".to_string();
        assert_eq!(settings.tracing_level(), "debug");
    }

    #[test]
    fn test_debug_hides_keys() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-secret"),
            ("TAVILY_API_KEY", "tv-secret"),
        ]))
        .unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("tv-secret"));
    }
}
