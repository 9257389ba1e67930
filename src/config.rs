use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::CIDigestError;

/// Configuration file structure for cidigest.
///
/// Every value can also be supplied through environment variables or CLI
/// flags, which take precedence over the file (see [`Overrides`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Jenkins server connection
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    /// Chat summarisation endpoint
    #[serde(default)]
    pub chat: ChatConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Summary cache sizing
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// Jenkins base URL (e.g., "https://jenkins.example.com")
    pub url: Option<String>,

    /// Pipeline job path below the base URL (e.g., "/job/team/job/promotion")
    #[serde(default)]
    pub job_path: String,

    pub user: Option<String>,

    /// API token used as the basic-auth password
    pub token: Option<String>,

    /// Timeout for every Jenkins request, in seconds
    #[serde(default = "default_jenkins_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChatConfig {
    /// Full URL of the send-message endpoint
    pub url: Option<String>,

    #[serde(default = "default_chat_session_id")]
    pub session_id: String,

    #[serde(default = "default_model_provider")]
    pub model_provider: String,

    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Raw `Cookie` header forwarded to the chat endpoint for session auth
    pub cookie: Option<String>,

    /// Skip TLS certificate verification for the chat endpoint
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    /// Maximum number of cached summaries
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Seconds before a cached summary goes stale
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            url: None,
            job_path: String::new(),
            user: None,
            token: None,
            timeout_secs: default_jenkins_timeout_secs(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: None,
            session_id: default_chat_session_id(),
            model_provider: default_model_provider(),
            model_version: default_model_version(),
            cookie: None,
            accept_invalid_certs: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_jenkins_timeout_secs() -> u64 {
    10
}

fn default_chat_session_id() -> String {
    "826989b8-6d04-4d9c-a3a3-dd77c8333503".to_string()
}

fn default_model_provider() -> String {
    "INFA".to_string()
}

fn default_model_version() -> String {
    "qwen2.5-32b-instruct".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cache_capacity() -> usize {
    100
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

/// Values coming from the environment or command line. `None` leaves the
/// file value untouched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub jenkins_url: Option<String>,
    pub job_path: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
    pub chat_url: Option<String>,
    pub chat_session_id: Option<String>,
    pub chat_cookie: Option<String>,
    pub bind: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./cidigest.toml
    /// 3. ./cidigest.json
    /// 4. ./cidigest.yaml
    /// 5. ./cidigest.yml
    /// 6. `<config dir>/cidigest/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let mut candidates: Vec<PathBuf> = ["cidigest.toml", "cidigest.json", "cidigest.yaml", "cidigest.yml"]
            .iter()
            .map(PathBuf::from)
            .collect();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("cidigest").join("config.toml"));
        }

        for candidate in &candidates {
            if candidate.exists() {
                log::debug!("Using config file: {}", candidate.display());
                return Self::load_from_path(candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if overrides.jenkins_url.is_some() {
            self.jenkins.url = overrides.jenkins_url;
        }
        if let Some(job_path) = overrides.job_path {
            self.jenkins.job_path = job_path;
        }
        if overrides.user.is_some() {
            self.jenkins.user = overrides.user;
        }
        if overrides.token.is_some() {
            self.jenkins.token = overrides.token;
        }
        if overrides.chat_url.is_some() {
            self.chat.url = overrides.chat_url;
        }
        if let Some(session_id) = overrides.chat_session_id {
            self.chat.session_id = session_id;
        }
        if overrides.chat_cookie.is_some() {
            self.chat.cookie = overrides.chat_cookie;
        }
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        self
    }

    /// Checks what talking to Jenkins needs. Enough for read-only commands.
    pub fn validate_jenkins(&self) -> std::result::Result<(), CIDigestError> {
        let jenkins_url = self
            .jenkins
            .url
            .as_deref()
            .ok_or_else(|| CIDigestError::Config("Jenkins URL is not set (JENKINS_URL)".into()))?;
        Url::parse(jenkins_url)
            .map_err(|e| CIDigestError::Config(format!("Invalid Jenkins URL '{jenkins_url}': {e}")))?;
        Ok(())
    }

    /// Checks everything the server and summaries need.
    pub fn validate(&self) -> std::result::Result<(), CIDigestError> {
        self.validate_jenkins()?;

        let chat_url = self
            .chat
            .url
            .as_deref()
            .ok_or_else(|| CIDigestError::Config("Chat endpoint is not set (CHAT_API_URL)".into()))?;
        Url::parse(chat_url)
            .map_err(|e| CIDigestError::Config(format!("Invalid chat endpoint '{chat_url}': {e}")))?;

        if self.cache.capacity == 0 {
            return Err(CIDigestError::Config(
                "Cache capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn jenkins_timeout(&self) -> Duration {
        Duration::from_secs(self.jenkins.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
