//! Configuration for the brain service
//!
//! Loaded from environment variables (via .env file) on top of the
//! ingestion config, with validated, typed sections.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use tx_parser::config::{get_env_bool, get_env_optional, get_env_parsed, get_env_string};
use tx_parser::AppConfig;

use crate::llm::anthropic::DEFAULT_MESSAGES_URL;
use crate::research::ResearchAgentConfig;

const API_KEY_VARS: [&str; 2] = ["MINIMAX_API_KEY", "ANTHROPIC_API_KEY"];

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub app: AppConfig,
    pub llm: LlmConfig,
    pub research: ResearchConfig,
    pub audit: AuditConfig,
    /// Preload well-known entities into memory at startup
    pub seed_entities: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub classifier_model: String,
    pub classifier_temperature: f32,
    pub researcher_model: String,
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchConfig {
    pub enabled: bool,
    pub max_iterations: usize,
    pub concurrency: usize,
    /// Cached research younger than this skips a new run (milliseconds)
    pub freshness_window_ms: i64,
    pub jupiter_api_key: Option<String>,
}

impl ResearchConfig {
    pub fn agent_config(&self) -> ResearchAgentConfig {
        ResearchAgentConfig {
            max_iterations: self.max_iterations,
            concurrency: self.concurrency,
            freshness_window_ms: self.freshness_window_ms,
            ..ResearchAgentConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_map(values: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppConfig::from_lookup(&lookup)?;

        let Some(api_key) = API_KEY_VARS.iter().find_map(|key| get_env_optional(&lookup, key)) else {
            bail!("Missing MINIMAX_API_KEY or ANTHROPIC_API_KEY");
        };

        let config = Config {
            app,
            llm: LlmConfig {
                api_key,
                base_url: get_env_string(&lookup, "LLM_BASE_URL", DEFAULT_MESSAGES_URL),
                classifier_model: get_env_string(&lookup, "CLASSIFIER_MODEL", "MiniMax-M2.5-lightning"),
                classifier_temperature: get_env_parsed(&lookup, "CLASSIFIER_TEMPERATURE", 0.1f32)?,
                researcher_model: get_env_string(&lookup, "RESEARCHER_MODEL", "MiniMax-M2.5"),
                timeout_secs: get_env_parsed(&lookup, "LLM_TIMEOUT_SECS", 60u64)?,
            },
            research: ResearchConfig {
                enabled: get_env_bool(&lookup, "RESEARCH_ENABLED", true)?,
                max_iterations: get_env_parsed(&lookup, "RESEARCH_MAX_ITERATIONS", 8usize)?,
                concurrency: get_env_parsed(&lookup, "RESEARCH_CONCURRENCY", 3usize)?,
                freshness_window_ms: get_env_parsed(&lookup, "RESEARCH_FRESHNESS_WINDOW_MS", 600_000i64)?,
                jupiter_api_key: get_env_optional(&lookup, "JUPITER_API_KEY"),
            },
            audit: AuditConfig {
                enabled: get_env_bool(&lookup, "AUDIT_LOG", true)?,
                path: PathBuf::from(get_env_string(&lookup, "AUDIT_PATH", "./data/audit")),
            },
            seed_entities: get_env_bool(&lookup, "SEED_ENTITIES", true)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.llm.classifier_temperature) {
            bail!("CLASSIFIER_TEMPERATURE must be between 0.0 and 1.0");
        }
        if self.llm.timeout_secs == 0 {
            bail!("LLM_TIMEOUT_SECS must be > 0");
        }
        if self.research.max_iterations == 0 {
            bail!("RESEARCH_MAX_ITERATIONS must be > 0");
        }
        if self.research.concurrency == 0 {
            bail!("RESEARCH_CONCURRENCY must be > 0");
        }
        if self.research.freshness_window_ms <= 0 {
            bail!("RESEARCH_FRESHNESS_WINDOW_MS must be > 0");
        }
        Ok(())
    }
}
