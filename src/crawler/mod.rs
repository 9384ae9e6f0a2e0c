//! Crawler module for orchestrating crawl runs
//!
//! This module contains the pipeline driver, including:
//! - Single-source, discovery-driven and batch crawl modes
//! - Job file loading
//! - The crawl trigger that maps JSON requests onto runs

mod coordinator;
mod jobs;
mod request;

pub use coordinator::{BatchReport, CrawlReport, JobReport, Orchestrator};
pub use jobs::{load_jobs, CrawlJob, JobKind};
pub use request::{handle_crawl_request, CrawlRequest, TriggerResponse};
