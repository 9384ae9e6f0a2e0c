use serde::Deserialize;

/// Main configuration structure for cheap-home
///
/// Only `[storage]` is required; every other section falls back to defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Builds a configuration with default sections around a database path
    pub fn with_database(path: impl Into<String>) -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            browser: BrowserConfig::default(),
            user_agent: UserAgentConfig::default(),
            storage: StorageConfig {
                database_path: path.into(),
            },
            jobs: JobsConfig::default(),
            endpoints: EndpointsConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

/// Pacing and timeouts for the orchestrator and enrichment stage
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// HTTP request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Pause between discovered targets (milliseconds)
    #[serde(rename = "target-delay")]
    pub target_delay: u64,

    /// Pause between jobs in batch mode (milliseconds)
    #[serde(rename = "job-delay")]
    pub job_delay: u64,

    /// Pause after each geocoding call (milliseconds)
    #[serde(rename = "geocode-delay")]
    pub geocode_delay: u64,

    /// Pause after each language-model call (milliseconds)
    #[serde(rename = "llm-delay")]
    pub llm_delay: u64,

    /// Feed pages fetched when a job does not say otherwise
    #[serde(rename = "feed-pages")]
    pub feed_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout: 30,
            target_delay: 1000,
            job_delay: 2000,
            geocode_delay: 200,
            llm_delay: 500,
            feed_pages: 1,
        }
    }
}

/// Headless browser behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Scroll-and-wait cycles when a job does not say otherwise
    #[serde(rename = "scroll-rounds")]
    pub scroll_rounds: u32,

    /// Wait after each scroll (milliseconds)
    #[serde(rename = "scroll-wait")]
    pub scroll_wait: u64,

    /// Upper bound on waiting for the page's ready selector (milliseconds)
    #[serde(rename = "ready-timeout")]
    pub ready_timeout: u64,

    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            scroll_rounds: 6,
            scroll_wait: 1500,
            ready_timeout: 20_000,
            headless: true,
        }
    }
}

/// Request identity presented to listing sites
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Browser-like User-Agent header
    #[serde(rename = "browser-agent")]
    pub browser_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            browser_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                            (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            accept_language: "vi-VN,vi;q=0.9,en;q=0.8".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file (overridden by `DATABASE_PATH`)
    #[serde(rename = "database-path", default)]
    pub database_path: String,
}

/// Batch job file location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub path: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            path: "crawler/jobs.json".to_string(),
        }
    }
}

/// Base URLs of the external APIs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub geocode: String,
    /// Chat-completions base; `/chat/completions` is appended
    pub llm: String,
    pub serpapi: String,
    /// Graph API base including the version segment
    pub graph: String,
    /// Social site root used for login and group pages
    #[serde(rename = "facebook-web")]
    pub facebook_web: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            geocode: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            llm: "https://api.openai.com/v1".to_string(),
            serpapi: "https://serpapi.com/search".to_string(),
            graph: "https://graph.facebook.com/v19.0".to_string(),
            facebook_web: "https://www.facebook.com".to_string(),
        }
    }
}

/// Language-model settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
        }
    }
}
