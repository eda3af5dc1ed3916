//! YAML configuration for LexSrt.
//!
//! One file configures the Wikidata client, the matcher, the document
//! resolver and the pre-filters. Every section and field has a default, so an
//! empty document apart from `version` is valid.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "english subtitles"
//!
//! wikidata:
//!   timeout_secs: 10
//!   max_concurrent_requests: 4
//!   retry_config:
//!     max_retries: 3
//!     base_delay: 250
//!   rate_limit_config:
//!     requests_per_second: 5.0
//!     burst_size: 10
//!
//! matcher:
//!   followup_base: "https://ordia.toolforge.org/search?q="
//!   category_overrides:
//!     PROPN: "Q147276"
//!
//! document:
//!   max_concurrency: 4
//!   min_token_length: 3
//!
//! prefilter:
//!   credits:
//!     enabled: true
//!     marker: "subtitles"
//!   tokens:
//!     drop_emails: true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use matcher::MatcherConfig;
use wikidata::WikidataConfig;

use crate::prefilter::{CreditsFilter, TokenFilter};

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LexSrtConfig {
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub wikidata: WikidataConfig,

    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub document: DocumentConfig,

    #[serde(default)]
    pub prefilter: PrefilterConfig,
}

impl LexSrtConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: LexSrtConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.wikidata
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("wikidata: {e}")))?;
        self.matcher
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("matcher: {e}")))?;
        self.document.validate()?;
        self.prefilter
            .credits
            .validate()
            .map_err(ConfigLoadError::Validation)?;
        Ok(())
    }
}

impl Default for LexSrtConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            wikidata: WikidataConfig::default(),
            matcher: MatcherConfig::default(),
            document: DocumentConfig::default(),
            prefilter: PrefilterConfig::default(),
        }
    }
}

/// Document resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Distinct tokens resolved at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Tokens shorter than this many characters are not looked up.
    #[serde(default = "default_min_token_length")]
    pub min_token_length: usize,
}

impl DocumentConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.max_concurrency == 0 {
            return Err(ConfigLoadError::Validation(
                "document.max_concurrency must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            min_token_length: default_min_token_length(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefilterConfig {
    #[serde(default)]
    pub credits: CreditsFilter,

    #[serde(default)]
    pub tokens: TokenFilter,
}

fn default_max_concurrency() -> usize {
    4
}
fn default_min_token_length() -> usize {
    3
}
