use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_CONFIG_PATH: &str = "CLAIM_SCRAPER_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_SUMMARIZER_MODEL: &str = "SUMMARIZER_MODEL";
const DEFAULT_SUMMARIZER_MODEL: &str = "gpt-4o-mini";

const ENV_CHROME: &str = "CHROME";

const DEFAULT_USER_AGENT: &str = "claim-scraper/0.1";

/// Page fetching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Timeout of the static/dynamic classification request
    pub probe_timeout_secs: u64,
    /// Fixed wait after navigation before the rendered HTML is captured
    pub settle_delay_ms: u64,
    /// Upper bound on a whole headless render (launch, navigate, settle, capture)
    pub render_timeout_secs: u64,
    /// Upper bound on fetching a page, whichever path is taken
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Browser binary; falls back to `CHROME` and then platform detection
    pub chrome_executable: Option<PathBuf>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 10,
            settle_delay_ms: 5000,
            render_timeout_secs: 60,
            request_timeout_secs: 90,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_executable: None,
        }
    }
}

impl FetcherConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Keyword shortcut that substitutes a fixed sentence for the proof requirement
#[derive(Debug, Clone, Deserialize)]
pub struct CannedProofConfig {
    /// Matched anywhere in the flattened, lowercased page text
    pub keywords: Vec<String>,
    pub text: String,
}

impl Default for CannedProofConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["deductions".to_string(), "black car fund".to_string()],
            text: "Proof of NY sales tax or Black Car Fund deductions".to_string(),
        }
    }
}

/// Keyword sets driving the extraction rule table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub fund_keywords: Vec<String>,
    pub max_claim_keywords: Vec<String>,
    pub proof_keywords: Vec<String>,
    pub tier_keywords: Vec<String>,
    pub deadline_keyword: String,
    /// Disabled unless present in the config file
    pub canned_proof: Option<CannedProofConfig>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            fund_keywords: strings(&["settlement fund", "total fund", "settlement amount"]),
            max_claim_keywords: strings(&["per person", "maximum"]),
            proof_keywords: strings(&[
                "proof of purchase",
                "no proof required",
                "proof of employment",
            ]),
            tier_keywords: strings(&["tier", "eligible for", "class member"]),
            deadline_keyword: "deadline".to_string(),
            canned_proof: None,
        }
    }
}

/// Summarization assist configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Also requires `OPENAI_API_KEY`
    pub enabled: bool,
    /// Words per summarized chunk
    pub chunk_words: usize,
    /// Characters of raw text kept when summarization fails
    pub fallback_chars: usize,
    /// Upper bound on a single chunk summarization call
    pub chunk_timeout_secs: u64,
    /// Overridden by `SUMMARIZER_MODEL`
    pub model: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_words: 800,
            fallback_chars: 1000,
            chunk_timeout_secs: 30,
            model: DEFAULT_SUMMARIZER_MODEL.to_string(),
        }
    }
}

impl SummarizerConfig {
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub extractor: ExtractorConfig,
    pub summarizer: SummarizerConfig,
    pub openai_api_key: Option<String>,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            extractor: ExtractorConfig::default(),
            summarizer: SummarizerConfig::default(),
            openai_api_key: None,
            port: 8000,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path = std::env::var(ENV_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        let mut fetcher = file.fetcher;
        if fetcher.chrome_executable.is_none() {
            fetcher.chrome_executable = std::env::var_os(ENV_CHROME).map(PathBuf::from);
        }

        let mut summarizer = file.summarizer;
        if let Ok(model) = std::env::var(ENV_SUMMARIZER_MODEL) {
            summarizer.model = model;
        }

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        Self {
            fetcher,
            extractor: file.extractor,
            summarizer,
            openai_api_key,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(path, &contents),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    fn parse_config(path: &Path, contents: &str) -> Option<ConfigFile> {
        let contents = contents.trim();
        if contents.is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Some(ConfigFile::default());
        }

        match serde_yaml::from_str(contents) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded configuration from file");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                None
            }
        }
    }

    /// Summarization runs only when enabled and an API key is available
    pub fn summarization_enabled(&self) -> bool {
        self.summarizer.enabled && self.openai_api_key.is_some()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
