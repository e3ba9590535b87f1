use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub completion: CompletionConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MirrorConfig {
    /// Remote repository URL (anything `git clone` accepts).
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Local mirror directory. Defaults to `<data_dir>/mirror/<url-hash>`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_shallow")]
    pub shallow: bool,
    /// Bound on each git invocation; expiry is a sync failure.
    #[serde(default = "default_git_timeout")]
    pub timeout_secs: u64,
}

fn default_branch() -> String {
    "main".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_shallow() -> bool {
    true
}
fn default_git_timeout() -> u64 {
    120
}

impl MirrorConfig {
    /// Resolved mirror directory: the explicit `path`, or a stable
    /// URL-derived directory under `data_dir`.
    pub fn mirror_dir(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => self.data_dir.join("mirror").join(short_hash(&self.url)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["*".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    /// Model identifier passed to the completion endpoint.
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Overrides the built-in system prompt when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_completion_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Opaque application identifier surfaced in health output and logs.
    #[serde(default)]
    pub app_id: Option<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.mirror.url.trim().is_empty() {
        anyhow::bail!("mirror.url must not be empty");
    }
    if config.mirror.timeout_secs == 0 {
        anyhow::bail!("mirror.timeout_secs must be > 0");
    }
    if config.completion.model.trim().is_empty() {
        anyhow::bail!("completion.model must not be empty");
    }
    if config.completion.timeout_secs == 0 {
        anyhow::bail!("completion.timeout_secs must be > 0");
    }

    Ok(config)
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())[..12].to_string()
}
