//! Configuration management.
//!
//! ```toml
//! [api_keys]
//! ncbi = "your-ncbi-key"
//! semantic_scholar = "your-s2-key"
//! reddit_client_id = "id"
//! reddit_client_secret = "secret"
//!
//! [endpoints]
//! crossref = "https://api.crossref.org"
//!
//! [http]
//! timeout_secs = 30
//! crossref_mailto = "you@example.org"
//!
//! [rate_limits]
//! semantic_scholar_interval_ms = 1000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key can be overridden from the environment with the `RESEARCH_HUB_`
//! prefix and `__` as section separator, e.g. `RESEARCH_HUB_HTTP__TIMEOUT_SECS=60`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "research-hub.toml";
const ENV_PREFIX: &str = "RESEARCH_HUB";
const REDACTED: &str = "***";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for the providers
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Provider base URLs
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API keys and credentials for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// NCBI E-utilities key (optional, raises the PubMed quota)
    #[serde(default = "env_ncbi")]
    pub ncbi: Option<String>,

    /// Semantic Scholar API key (optional)
    #[serde(default = "env_semantic_scholar")]
    pub semantic_scholar: Option<String>,

    /// Reddit app credentials (required for the Reddit tools)
    #[serde(default = "env_reddit_client_id")]
    pub reddit_client_id: Option<String>,

    #[serde(default = "env_reddit_client_secret")]
    pub reddit_client_secret: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            ncbi: env_ncbi(),
            semantic_scholar: env_semantic_scholar(),
            reddit_client_id: env_reddit_client_id(),
            reddit_client_secret: env_reddit_client_secret(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_ncbi() -> Option<String> {
    env_var("NCBI_API_KEY")
}

fn env_semantic_scholar() -> Option<String> {
    env_var("S2_API_KEY").or_else(|| env_var("SEMANTIC_SCHOLAR_API_KEY"))
}

fn env_reddit_client_id() -> Option<String> {
    env_var("REDDIT_CLIENT_ID")
}

fn env_reddit_client_secret() -> Option<String> {
    env_var("REDDIT_CLIENT_SECRET")
}

/// Base URLs of every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// E-utilities root (esearch.fcgi / efetch.fcgi live below it)
    pub pubmed: String,
    /// Graph API root
    pub semantic_scholar: String,
    /// arXiv export API root (`/query` is appended)
    pub arxiv: String,
    pub crossref: String,
    /// Host that mints OAuth tokens
    pub reddit_auth: String,
    /// Host that serves authenticated API calls
    pub reddit_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            pubmed: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            semantic_scholar: "https://api.semanticscholar.org/graph/v1".to_string(),
            arxiv: "http://export.arxiv.org/api".to_string(),
            crossref: "https://api.crossref.org".to_string(),
            reddit_auth: "https://www.reddit.com".to_string(),
            reddit_api: "https://oauth.reddit.com".to_string(),
        }
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout applied to every outbound call
    pub timeout_secs: u64,

    pub user_agent: String,

    /// Contact address for the CrossRef polite pool
    pub crossref_mailto: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("research-hub/", env!("CARGO_PKG_VERSION")).to_string(),
            crossref_mailto: None,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum spacing between Semantic Scholar calls
    pub semantic_scholar_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            semantic_scholar_interval_ms: 1000,
        }
    }
}

impl RateLimitConfig {
    pub fn semantic_scholar_interval(&self) -> Duration {
        Duration::from_millis(self.semantic_scholar_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load from an explicit file, or the discovered one, or defaults.
    /// Environment overrides are applied in every case.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => load_config(path),
            None => match find_config_file() {
                Some(found) => load_config(&found),
                None => from_env(),
            },
        }
    }

    /// Copy with every credential replaced by a placeholder
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        let keys = &mut config.api_keys;
        for key in [
            &mut keys.ncbi,
            &mut keys.semantic_scholar,
            &mut keys.reddit_client_id,
            &mut keys.reddit_client_secret,
        ] {
            if key.is_some() {
                *key = Some(REDACTED.to_string());
            }
        }
        config
    }

    /// Render as TOML with secrets redacted
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }
}

/// Load configuration from a file, layering `RESEARCH_HUB_*` overrides on top
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn from_env() -> Result<Config, ConfigError> {
    let settings = config::Config::builder().add_source(environment()).build()?;
    Ok(settings.try_deserialize()?)
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Look for `research-hub.toml` in the working directory, then in the
/// platform config directory (`~/.config/research-hub/config.toml` on Linux).
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("research-hub").join("config.toml"))
        .filter(|path| path.is_file())
}
