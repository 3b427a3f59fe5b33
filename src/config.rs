//! Configuration loading.
//!
//! A single immutable [`Settings`] value is constructed once at startup and
//! threaded explicitly into every component that needs it: the deduplication
//! threshold, the summarization credential and truncation caps, the output
//! directory paths.
//!
//! Settings come from `config.yaml` (path overridable with `--config`),
//! with environment variables overriding the secret-bearing fields:
//! `DIGEST_API_KEY`, `DIGEST_BASE_URL`, `DIGEST_MODEL`, `DIGEST_SYFT_URL`,
//! `DIGEST_SYFT_KEY`. A missing config file yields the defaults; the
//! environment still applies.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Remote summarization endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Bearer credential. Empty means live mode is unavailable.
    pub key: String,
    pub base_url: String,
    pub model: String,
    pub max_output_tokens: u32,
    /// Total-request timeout; a stream still open past this point is
    /// abandoned and the call reported as failed.
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            key: String::new(),
            base_url: "https://api-inference.modelscope.cn/v1".to_string(),
            model: "ZhipuAI/GLM-4.7".to_string(),
            max_output_tokens: 2000,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Cap applied per source at fetch time and to the merged set after
    /// deduplication, never before it.
    pub max_articles: usize,
    /// Titles closer than this edit distance collapse; zero disables fuzzy
    /// matching.
    pub similarity_threshold: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_articles: 14,
            similarity_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizeSettings {
    /// Hard character cap on titles sent to the model and emitted offline.
    pub title_max: usize,
    /// Hard character cap on descriptions.
    pub desc_max: usize,
    /// When true, a failed live call downgrades to the offline formatter
    /// instead of failing the run.
    pub fallback_offline: bool,
    pub prompt_path: String,
}

impl Default for SummarizeSettings {
    fn default() -> Self {
        Self {
            title_max: 150,
            desc_max: 300,
            fallback_offline: false,
            prompt_path: "prompts/daily.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// JSON snapshots, one per calendar day.
    pub data_dir: String,
    /// Markdown reports, one per calendar day.
    pub content_dir: String,
    /// Generated HTML site.
    pub docs_dir: String,
    /// Static assets copied into the site unmodified.
    pub assets_dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            content_dir: "content".to_string(),
            docs_dir: "docs".to_string(),
            assets_dir: "assets".to_string(),
        }
    }
}

/// Credentials for the Syft curated-digest API. Both fields empty disables
/// the source silently.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyftSettings {
    pub web_app_url: String,
    pub secret_key: String,
}

/// Application settings, constructed once at process start.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    /// Enabled-sources mapping; keys are [`crate::sources::SourceId`] names.
    pub sources: BTreeMap<String, bool>,
    pub limits: LimitSettings,
    pub summarize: SummarizeSettings,
    pub output: OutputSettings,
    pub syft: SyftSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            sources: default_sources(),
            limits: LimitSettings::default(),
            summarize: SummarizeSettings::default(),
            output: OutputSettings::default(),
            syft: SyftSettings::default(),
        }
    }
}

fn default_sources() -> BTreeMap<String, bool> {
    BTreeMap::from([
        ("aibase".to_string(), true),
        ("techcrunch".to_string(), true),
        ("theverge".to_string(), true),
        ("syft".to_string(), false),
    ])
}

impl Settings {
    /// Load configuration from a YAML file plus environment overrides.
    ///
    /// An explicitly passed path must exist; the default `config.yaml` is
    /// optional and its absence yields [`Settings::default`].
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(p) => Self::from_file(Path::new(p))?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env();
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("DIGEST_API_KEY") {
            self.api.key = v;
        }
        if let Ok(v) = std::env::var("DIGEST_BASE_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = std::env::var("DIGEST_MODEL") {
            self.api.model = v;
        }
        if let Ok(v) = std::env::var("DIGEST_SYFT_URL") {
            self.syft.web_app_url = v;
        }
        if let Ok(v) = std::env::var("DIGEST_SYFT_KEY") {
            self.syft.secret_key = v;
        }
    }
}
