//! Job file loading
//!
//! The job file is a JSON array of crawl jobs processed in order by batch
//! mode. Each job names a source and a target, plus optional parameters:
//!
//! ```json
//! [
//!   { "source": "phongtro123", "url": "https://phongtro123.com/tinh-thanh/da-nang" },
//!   { "source": "serpapi", "query": "phòng trọ đà nẵng", "num": 10 }
//! ]
//! ```

use crate::model::{JobParams, Source};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One entry of the job file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlJob {
    /// Adapter identifier, or `serpapi` / `discovery` for a discovery job
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(flatten)]
    pub params: JobParams,
}

impl CrawlJob {
    /// Parses the job's source into what the orchestrator should run
    pub fn kind(&self) -> ConfigResult<JobKind> {
        self.source.parse()
    }

    /// Target for this job: the query (or url) for discovery, the url otherwise
    ///
    /// Blank values count as missing.
    pub fn target(&self) -> Option<&str> {
        fn non_blank(value: &Option<String>) -> Option<&str> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
        }

        match self.kind() {
            Ok(JobKind::Discovery) => non_blank(&self.query).or_else(|| non_blank(&self.url)),
            _ => non_blank(&self.url),
        }
    }
}

/// What a job or crawl request asks the orchestrator to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Search, then crawl every classified result
    Discovery,
    /// Crawl one target with one adapter
    Crawl(Source),
}

impl FromStr for JobKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serpapi" | "discovery" => Ok(Self::Discovery),
            other => other.parse().map(Self::Crawl),
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => f.write_str("discovery"),
            Self::Crawl(source) => write!(f, "{}", source),
        }
    }
}

/// Reads the job file
///
/// # Returns
///
/// * `Ok(jobs)` - Jobs in file order; empty when the file does not exist
/// * `Err(ConfigError::JobFile)` - The file exists but is unreadable or
///   not a JSON array of jobs
pub fn load_jobs(path: &Path) -> ConfigResult<Vec<CrawlJob>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let job_file_error = |message: String| ConfigError::JobFile {
        path: path.display().to_string(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| job_file_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| job_file_error(e.to_string()))
}
