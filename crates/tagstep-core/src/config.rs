use crate::error::{Result, TagstepError};
use crate::paths;
use crate::retry::RetryPolicy;
use crate::stage::{default_stages, StageEntry, StageMap};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound the batch endpoint accepts per request.
pub const MAX_CHUNK_SIZE: usize = 200;

pub const API_KEY_ENV: &str = "MAILCHIMP_API_KEY";
pub const DATA_CENTER_ENV: &str = "MAILCHIMP_DC";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// MailchimpConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailchimpConfig {
    #[serde(default = "default_data_center")]
    pub data_center: String,
    /// Overrides the URL derived from `data_center`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_data_center() -> String {
    "us14".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for MailchimpConfig {
    fn default() -> Self {
        Self {
            data_center: default_data_center(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

// ---------------------------------------------------------------------------
// BatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    MAX_CHUNK_SIZE
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

impl BatchConfig {
    /// Clamped into `1..=MAX_CHUNK_SIZE`.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.clamp(1, MAX_CHUNK_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub mailchimp: MailchimpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default = "default_stages")]
    pub stages: Vec<StageEntry>,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            mailchimp: MailchimpConfig::default(),
            retry: RetryConfig::default(),
            batch: BatchConfig::default(),
            stages: default_stages(),
        }
    }
}

impl Config {
    /// Load `tagstep.yaml` under `root`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_file(&path)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn stage_map(&self) -> Result<StageMap> {
        StageMap::new(self.stages.clone())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.policy()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.mailchimp.timeout_secs)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.batch.chunk_size == 0 || self.batch.chunk_size > MAX_CHUNK_SIZE {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "batch.chunk_size={} is outside 1..={MAX_CHUNK_SIZE}; {} will be used",
                    self.batch.chunk_size,
                    self.batch.effective_chunk_size()
                ),
            });
        }

        if self.retry.max_attempts == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "retry.max_attempts=0; every call is still attempted once".to_string(),
            });
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "retry.base_delay_ms={} exceeds retry.max_delay_ms={}",
                    self.retry.base_delay_ms, self.retry.max_delay_ms
                ),
            });
        }

        if self.mailchimp.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "mailchimp.timeout_secs must be greater than zero".to_string(),
            });
        }

        match self.stage_map() {
            Ok(map) => {
                if map.is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: "no stages configured; advancement will never change a tag"
                            .to_string(),
                    });
                }
                for next in map.dangling_successors() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "stage '{next}' is a successor but has no entry of its own"
                        ),
                    });
                }
            }
            Err(e) => warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: e.to_string(),
            }),
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// API key plus the data center it belongs to. Fixed for the client's lifetime.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    data_center: String,
    base_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("data_center", &self.data_center)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, data_center: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            data_center: data_center.into(),
            base_url: None,
        }
    }

    /// Point the client somewhere other than the data-center URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Read the API key from `MAILCHIMP_API_KEY`. The data center comes from
    /// `MAILCHIMP_DC` when set, otherwise from the config.
    pub fn from_env(config: &MailchimpConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(TagstepError::MissingCredential(API_KEY_ENV))?;
        let data_center = std::env::var(DATA_CENTER_ENV)
            .ok()
            .filter(|dc| !dc.trim().is_empty())
            .unwrap_or_else(|| config.data_center.clone());
        let mut creds = Self::new(api_key, data_center);
        creds.base_url = config.base_url.clone();
        Ok(creds)
    }

    pub fn data_center(&self) -> &str {
        &self.data_center
    }

    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.mailchimp.com/3.0", self.data_center),
        }
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
