//! Crawl orchestration
//!
//! The orchestrator ties the pipeline together for one invocation:
//! - Dispatching a target to its source adapter (or discovering targets first)
//! - Running the enrichment stage over the collected batch
//! - Persisting the batch through the listing store
//! - Recording the invocation in the run ledger
//!
//! Work is strictly sequential, with fixed pauses between targets and jobs.

use crate::config::{Config, Secrets};
use crate::crawler::jobs::{load_jobs, CrawlJob, JobKind};
use crate::discovery::discover;
use crate::enrichment::Enricher;
use crate::model::{DiscoveryTarget, JobParams, ListingRecord, Source};
use crate::sources::html::dedupe_by_url;
use crate::sources::{build_http_client, AdapterContext};
use crate::storage::{ListingStore, RunCounts, RunMode, RunStatus, SqliteStorage};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Totals for one crawl, discovery or job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    /// Targets returned by discovery (0 outside discovery mode)
    pub discovered: usize,
    /// Valid listings produced by adapters
    pub crawled: usize,
    /// Listings inserted or modified in the store
    pub upserted: usize,
    /// Adapters that produced listings, in crawl order
    pub sources_crawled: Vec<String>,
    /// Degradations reported along the way
    pub warnings: Vec<String>,
}

impl CrawlReport {
    /// Adds another report's totals to this one
    pub fn absorb(&mut self, other: &CrawlReport) {
        self.discovered += other.discovered;
        self.crawled += other.crawled;
        self.upserted += other.upserted;
        for source in &other.sources_crawled {
            if !self.sources_crawled.contains(source) {
                self.sources_crawled.push(source.clone());
            }
        }
        self.warnings.extend(other.warnings.iter().cloned());
    }

    fn counts(&self) -> RunCounts {
        RunCounts {
            discovered: self.discovered,
            crawled: self.crawled,
            upserted: self.upserted,
            warnings: self.warnings.len(),
        }
    }
}

/// Result of one job in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    /// Source identifier as written in the job file
    pub source: String,
    pub target: String,
    pub report: CrawlReport,
    /// Set when the job could not run or aborted
    pub error: Option<String>,
}

/// Result of a batch run over the job file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub jobs: Vec<JobReport>,
    pub totals: CrawlReport,
}

impl BatchReport {
    pub fn jobs_total(&self) -> usize {
        self.jobs.len()
    }

    pub fn jobs_failed(&self) -> usize {
        self.jobs.iter().filter(|job| job.error.is_some()).count()
    }
}

/// Runs crawls against an open listing store
pub struct Orchestrator {
    config: Config,
    secrets: Secrets,
    storage: SqliteStorage,
    client: Client,
    config_hash: String,
}

impl Orchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `secrets` - API keys and credentials
    /// * `storage` - Open listing store; the orchestrator becomes its only writer
    /// * `config_hash` - Hash of the configuration file, recorded per run
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(
        config: Config,
        secrets: Secrets,
        storage: SqliteStorage,
        config_hash: impl Into<String>,
    ) -> crate::Result<Self> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;

        Ok(Self {
            config,
            secrets,
            storage,
            client,
            config_hash: config_hash.into(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read access to the listing store
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    fn context(&self) -> AdapterContext<'_> {
        AdapterContext {
            client: &self.client,
            config: &self.config,
            secrets: &self.secrets,
        }
    }

    /// Crawls one target with one adapter, then enriches and persists
    pub async fn run_single(
        &mut self,
        source: Source,
        target: &str,
        params: &JobParams,
    ) -> crate::Result<CrawlReport> {
        let run_id = self.storage.create_run(RunMode::Single, &self.config_hash)?;
        let result = self.crawl_source(source, target, params).await;
        self.finish_run(run_id, &result)?;
        result
    }

    /// Discovers targets for `query` and crawls each of them
    pub async fn run_discovery(
        &mut self,
        query: &str,
        params: &JobParams,
    ) -> crate::Result<CrawlReport> {
        let run_id = self
            .storage
            .create_run(RunMode::Discovery, &self.config_hash)?;
        let result = self.discover_and_crawl(query, params).await;
        self.finish_run(run_id, &result)?;
        result
    }

    /// Crawls already-resolved targets as one discovery run
    ///
    /// Same fan-out as [`Orchestrator::run_discovery`] without the search
    /// step; `discovered` is the number of targets given.
    pub async fn run_targets(
        &mut self,
        targets: &[DiscoveryTarget],
        params: &JobParams,
    ) -> crate::Result<CrawlReport> {
        let run_id = self
            .storage
            .create_run(RunMode::Discovery, &self.config_hash)?;
        let mut report = CrawlReport {
            discovered: targets.len(),
            ..Default::default()
        };
        let crawled = self.crawl_targets(targets, params, &mut report).await;
        let result = crawled.map(|()| report);
        self.finish_run(run_id, &result)?;
        result
    }

    /// Runs a named source (adapter identifier, `serpapi` or `discovery`)
    ///
    /// An unknown name fails with `ConfigError::UnknownSource` before any
    /// work is done or any run is recorded.
    pub async fn run_named(
        &mut self,
        source: &str,
        target: &str,
        params: &JobParams,
    ) -> crate::Result<CrawlReport> {
        match source.parse::<JobKind>()? {
            JobKind::Discovery => self.run_discovery(target, params).await,
            JobKind::Crawl(source) => self.run_single(source, target, params).await,
        }
    }

    /// Processes every job in the job file, in order
    ///
    /// A missing file is an empty batch. A file that cannot be read or
    /// parsed aborts the batch. Each job is isolated: an unknown source, a
    /// missing target or a persistence failure marks that job failed and
    /// the batch moves on.
    pub async fn run_jobs(&mut self, path: &Path) -> crate::Result<BatchReport> {
        let jobs = load_jobs(path)?;
        if jobs.is_empty() {
            info!("No jobs found at {}", path.display());
            return Ok(BatchReport::default());
        }

        info!("Running {} jobs from {}", jobs.len(), path.display());
        let run_id = self.storage.create_run(RunMode::Batch, &self.config_hash)?;
        let job_delay = Duration::from_millis(self.config.crawler.job_delay);
        let mut batch = BatchReport::default();

        for (index, job) in jobs.iter().enumerate() {
            if index > 0 {
                pause(job_delay).await;
            }

            let job_report = self.run_job(job).await;
            if let Some(error) = &job_report.error {
                warn!("Job {} ({}) failed: {}", index + 1, job.source, error);
            }
            batch.totals.absorb(&job_report.report);
            batch.jobs.push(job_report);
        }

        let status = if batch.jobs_failed() == batch.jobs_total() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        self.storage
            .finish_run(run_id, status, &batch.totals.counts())?;

        info!(
            "Batch finished: {} jobs ({} failed), crawled {}, upserted {}",
            batch.jobs_total(),
            batch.jobs_failed(),
            batch.totals.crawled,
            batch.totals.upserted
        );
        Ok(batch)
    }

    async fn run_job(&mut self, job: &CrawlJob) -> JobReport {
        let mut job_report = JobReport {
            source: job.source.clone(),
            target: job.target().unwrap_or_default().to_string(),
            report: CrawlReport::default(),
            error: None,
        };

        let kind = match job.kind() {
            Ok(kind) => kind,
            Err(e) => {
                job_report.error = Some(e.to_string());
                return job_report;
            }
        };

        let Some(target) = job.target() else {
            job_report.error = Some(format!("Missing target for {} job", kind));
            return job_report;
        };

        let result = match kind {
            JobKind::Discovery => self.discover_and_crawl(target, &job.params).await,
            JobKind::Crawl(source) => self.crawl_source(source, target, &job.params).await,
        };

        match result {
            Ok(report) => job_report.report = report,
            Err(e) => job_report.error = Some(e.to_string()),
        }
        job_report
    }

    async fn crawl_source(
        &mut self,
        source: Source,
        target: &str,
        params: &JobParams,
    ) -> crate::Result<CrawlReport> {
        info!("[{}] crawling {}", source, target);
        let outcome = source.crawl(&self.context(), target, params).await;

        let mut report = CrawlReport {
            sources_crawled: vec![source.as_str().to_string()],
            ..Default::default()
        };
        if let Some(error) = outcome.error {
            warn!("[{}] crawl error: {}", source, error);
            report.warnings.push(format!("{}: {}", source, error));
        }

        report.crawled = outcome.items.len();
        if outcome.items.is_empty() {
            info!("[{}] no items", source);
            return Ok(report);
        }

        let upserted = self.enrich_and_persist(outcome.items, &mut report).await?;
        report.upserted = upserted;
        info!(
            "[{}] crawled {}, upserted {}",
            source, report.crawled, report.upserted
        );
        Ok(report)
    }

    async fn discover_and_crawl(
        &mut self,
        query: &str,
        params: &JobParams,
    ) -> crate::Result<CrawlReport> {
        let outcome = discover(&self.context(), query, &params.search).await;
        let mut report = CrawlReport {
            discovered: outcome.discovered.len(),
            ..Default::default()
        };
        if let Some(error) = outcome.error {
            warn!("[discovery] error: {}", error);
            report.warnings.push(format!("discovery: {}", error));
        }
        info!(
            "[discovery] '{}' yielded {} targets",
            query, report.discovered
        );

        self.crawl_targets(&outcome.discovered, params, &mut report)
            .await?;

        info!(
            "[discovery] discovered {}, crawled {}, upserted {}",
            report.discovered, report.crawled, report.upserted
        );
        Ok(report)
    }

    /// Crawls each target in order, then enriches and persists the combined
    /// items once
    ///
    /// A failing target adds a warning and is skipped. Items shared by
    /// several targets are kept once, and `crawled` counts them once.
    async fn crawl_targets(
        &mut self,
        targets: &[DiscoveryTarget],
        params: &JobParams,
        report: &mut CrawlReport,
    ) -> crate::Result<()> {
        let target_delay = Duration::from_millis(self.config.crawler.target_delay);
        let mut items: Vec<ListingRecord> = Vec::new();

        for (index, target) in targets.iter().enumerate() {
            if index > 0 {
                pause(target_delay).await;
            }

            let crawled = target.source.crawl(&self.context(), &target.url, params).await;
            if let Some(error) = crawled.error {
                warn!("[{}] {} skipped: {}", target.source, target.url, error);
                report
                    .warnings
                    .push(format!("{} {}: {}", target.source, target.url, error));
                continue;
            }
            if crawled.items.is_empty() {
                continue;
            }

            let name = target.source.as_str().to_string();
            if !report.sources_crawled.contains(&name) {
                report.sources_crawled.push(name);
            }
            items.extend(crawled.items);
        }

        let items = dedupe_by_url(items);
        report.crawled += items.len();
        if !items.is_empty() {
            let upserted = self.enrich_and_persist(items, report).await?;
            report.upserted += upserted;
        }
        Ok(())
    }

    async fn enrich_and_persist(
        &mut self,
        mut items: Vec<ListingRecord>,
        report: &mut CrawlReport,
    ) -> crate::Result<usize> {
        Enricher::new(&self.client, &self.config, &self.secrets)
            .enrich(&mut items, Utc::now())
            .await;

        let summary = self.storage.upsert_many(&items)?;
        if summary.failed > 0 {
            report
                .warnings
                .push(format!("{} listings failed to persist", summary.failed));
        }
        Ok(summary.upserted())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        result: &crate::Result<CrawlReport>,
    ) -> crate::Result<()> {
        match result {
            Ok(report) => {
                self.storage
                    .finish_run(run_id, RunStatus::Completed, &report.counts())?
            }
            Err(e) => {
                warn!("Run {} failed: {}", run_id, e);
                self.storage
                    .finish_run(run_id, RunStatus::Failed, &RunCounts::default())?
            }
        }
        Ok(())
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
