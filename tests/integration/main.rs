//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for listing sites and external APIs
//! and exercise the pipeline end-to-end against a temporary SQLite store.

mod common;
mod crawl_tests;
mod discovery_tests;
mod enrichment_tests;
mod jobs_tests;
mod trigger_tests;
