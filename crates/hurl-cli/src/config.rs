//! Layered settings: built-in defaults, then an optional TOML file, then
//! environment variables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use hurl_core::SystemConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HurlEnv {
    #[default]
    Dev,
    Staging,
    Prod,
}

impl HurlEnv {
    pub fn as_str(self) -> &'static str {
        match self {
            HurlEnv::Dev => "dev",
            HurlEnv::Staging => "staging",
            HurlEnv::Prod => "prod",
        }
    }
}

impl FromStr for HurlEnv {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(HurlEnv::Dev),
            "staging" => Ok(HurlEnv::Staging),
            "prod" => Ok(HurlEnv::Prod),
            other => Err(format!("unknown environment '{other}' (dev|staging|prod)")),
        }
    }
}

impl fmt::Display for HurlEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    None,
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(LlmProvider::None),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(format!("unknown llm provider '{other}' (none|ollama)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub env: HurlEnv,
    pub host: String,
    pub port: u16,
    pub allow_origins: Vec<String>,
    pub persist: bool,
    pub db_path: PathBuf,
    pub llm_provider: LlmProvider,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_timeout_ms: u64,
    pub trend_tick_interval_secs: f64,
    pub default_seed: Option<u64>,
    pub max_batch_size: usize,
    pub store_capacity: usize,
    pub catalog_seed: u64,
    pub generated_personas: usize,
    pub toxicity_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: HurlEnv::Dev,
            host: "0.0.0.0".to_string(),
            port: 8000,
            allow_origins: vec![
                "https://hurl.lol".to_string(),
                "http://localhost:3000".to_string(),
            ],
            persist: false,
            db_path: PathBuf::from("hurl.db"),
            llm_provider: LlmProvider::None,
            llm_url: "http://localhost:11434".to_string(),
            llm_model: "llama3.2".to_string(),
            llm_timeout_ms: 150,
            trend_tick_interval_secs: 5.0,
            default_seed: None,
            max_batch_size: 1000,
            store_capacity: 10_000,
            catalog_seed: 42,
            generated_personas: 80,
            toxicity_attempts: 5,
        }
    }
}

impl Settings {
    /// Load from the process environment, reading `file` (or `HURL_CONFIG`)
    /// first when given.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with(file, |key| std::env::var(key).ok())
    }

    /// Same as [`Settings::load`] with an explicit variable lookup.
    pub fn load_with(file: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = file.map(Path::to_path_buf).or_else(|| lookup("HURL_CONFIG").map(PathBuf::from));
        let mut settings = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(&lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("HURL_ENV") {
            self.env = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = lookup("HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = lookup("HURL_ALLOW_ORIGINS") {
            self.allow_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("HURL_PERSIST") {
            self.persist = parse_bool("HURL_PERSIST", &v)?;
        }
        if let Some(v) = lookup("HURL_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("HURL_LLM_PROVIDER") {
            self.llm_provider = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = lookup("HURL_LLM_URL") {
            self.llm_url = v;
        }
        if let Some(v) = lookup("HURL_LLM_MODEL") {
            self.llm_model = v;
        }
        if let Some(v) = lookup("HURL_LLM_TIMEOUT_MS") {
            self.llm_timeout_ms = parse_var("HURL_LLM_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("HURL_TREND_TICK_INTERVAL") {
            self.trend_tick_interval_secs = parse_var("HURL_TREND_TICK_INTERVAL", &v)?;
        }
        if let Some(v) = lookup("HURL_DEFAULT_SEED") {
            self.default_seed = if v.trim().is_empty() {
                None
            } else {
                Some(parse_var("HURL_DEFAULT_SEED", &v)?)
            };
        }
        if let Some(v) = lookup("HURL_MAX_BATCH_SIZE") {
            self.max_batch_size = parse_var("HURL_MAX_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("HURL_STORE_CAPACITY") {
            self.store_capacity = parse_var("HURL_STORE_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("HURL_CATALOG_SEED") {
            self.catalog_seed = parse_var("HURL_CATALOG_SEED", &v)?;
        }
        if let Some(v) = lookup("HURL_GENERATED_PERSONAS") {
            self.generated_personas = parse_var("HURL_GENERATED_PERSONAS", &v)?;
        }
        if let Some(v) = lookup("HURL_TOXICITY_ATTEMPTS") {
            self.toxicity_attempts = parse_var("HURL_TOXICITY_ATTEMPTS", &v)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.trend_tick_interval_secs.is_finite() || self.trend_tick_interval_secs <= 0.0 {
            bail!(
                "trend_tick_interval_secs must be > 0, got {}",
                self.trend_tick_interval_secs
            );
        }
        if Duration::try_from_secs_f64(self.trend_tick_interval_secs).is_err() {
            bail!(
                "trend_tick_interval_secs is too large, got {}",
                self.trend_tick_interval_secs
            );
        }
        if self.max_batch_size == 0 {
            bail!("max_batch_size must be at least 1");
        }
        if self.store_capacity == 0 {
            bail!("store_capacity must be at least 1");
        }
        if self.toxicity_attempts == 0 {
            bail!("toxicity_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm_provider != LlmProvider::None
    }

    pub fn enhancement_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    /// Engine configuration without an enhancer; the caller attaches one.
    pub fn system_config(&self) -> SystemConfig {
        SystemConfig {
            store_capacity: self.store_capacity,
            catalog_seed: self.catalog_seed,
            generated_personas: self.generated_personas,
            tick_interval: Duration::from_secs_f64(self.trend_tick_interval_secs),
            max_batch_size: self.max_batch_size,
            toxicity_attempts: self.toxicity_attempts,
            default_seed: self.default_seed,
            enhancement_timeout: self.enhancement_timeout(),
            ..SystemConfig::default()
        }
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {key}='{value}': {e}"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => bail!("invalid {key}='{value}': expected a boolean"),
    }
}
