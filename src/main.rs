//! cheap-home main entry point
//!
//! This is the command-line interface for the cheap-home listing crawler.

use cheap_home::config::{load_config_with_hash, resolve_database_path, Config, Secrets};
use cheap_home::crawler::{handle_crawl_request, Orchestrator};
use cheap_home::model::{JobParams, SearchParams};
use cheap_home::output::{
    load_statistics, print_batch, print_listings, print_meta, print_report, print_statistics,
};
use cheap_home::storage::{ListingQuery, ListingStore, SortOrder, SqliteStorage};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// cheap-home: a rental listing crawler for Đà Nẵng
///
/// cheap-home crawls rental listings from listing sites, a marketplace and
/// social groups, enriches them with geocoding and language-model metadata,
/// and keeps one row per listing URL in a SQLite store.
#[derive(Parser, Debug)]
#[command(name = "cheap-home")]
#[command(version = "1.0.0")]
#[command(about = "A rental listing crawler for Đà Nẵng", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl one target with one source adapter
    Crawl {
        /// Adapter identifier (phongtro123, batdongsan, chotot, facebook_group,
        /// facebook_group_pw) or serpapi for discovery
        #[arg(long)]
        source: String,

        /// Listing page URL, group id/URL, or search query for serpapi
        #[arg(long)]
        target: String,

        #[command(flatten)]
        adapter: AdapterArgs,
    },

    /// Search for listing pages and crawl every known result
    Discover {
        /// Search query
        #[arg(long)]
        query: String,

        #[command(flatten)]
        search: SearchArgs,

        #[command(flatten)]
        adapter: AdapterArgs,
    },

    /// Run every job in the job file
    Jobs {
        /// Job file (defaults to the configured path)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Handle a JSON crawl request and print the JSON response
    Trigger {
        /// Request body, e.g. '{"source":"chotot","url":"https://..."}'
        body: String,
    },

    /// List stored listings
    List(ListArgs),

    /// Show filter metadata for stored listings
    Meta {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show listing counts and recent runs
    Stats,
}

#[derive(Args, Debug, Default)]
struct AdapterArgs {
    /// Scroll-and-wait rounds for browser-driven sources
    #[arg(long)]
    scroll: Option<u32>,

    /// Feed pages to follow for the group feed API
    #[arg(long)]
    pages: Option<u32>,
}

#[derive(Args, Debug, Default)]
struct SearchArgs {
    #[arg(long)]
    engine: Option<String>,
    #[arg(long)]
    hl: Option<String>,
    #[arg(long)]
    gl: Option<String>,
    #[arg(long)]
    num: Option<u32>,
    #[arg(long)]
    start: Option<u32>,
    #[arg(long)]
    location: Option<String>,
}

impl AdapterArgs {
    fn into_params(self, search: SearchParams) -> JobParams {
        JobParams {
            scroll: self.scroll,
            pages: self.pages,
            search,
        }
    }
}

impl From<SearchArgs> for SearchParams {
    fn from(args: SearchArgs) -> Self {
        SearchParams {
            engine: args.engine,
            hl: args.hl,
            gl: args.gl,
            num: args.num,
            start: args.start,
            location: args.location,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Text to find in title or address
    #[arg(long)]
    q: Option<String>,
    #[arg(long)]
    min_price: Option<i64>,
    #[arg(long)]
    max_price: Option<i64>,
    /// Only listings at or below the cheap threshold
    #[arg(long)]
    cheap: bool,
    #[arg(long)]
    cheap_threshold: Option<i64>,
    #[arg(long)]
    district: Option<String>,
    /// Origin filter, repeatable (phongtro123, batdongsan, chotot, facebook)
    #[arg(long = "source")]
    sources: Vec<String>,
    #[arg(long)]
    min_area: Option<f64>,
    #[arg(long)]
    max_area: Option<f64>,
    /// Only listings posted by owners
    #[arg(long)]
    owner: bool,
    /// Only listings with images
    #[arg(long)]
    has_images: bool,
    /// price_asc, price_desc, recent, area_asc or area_desc
    #[arg(long, default_value = "price_asc")]
    sort: SortOrder,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl From<&ListArgs> for ListingQuery {
    fn from(args: &ListArgs) -> Self {
        ListingQuery {
            q: args.q.clone(),
            min_price: args.min_price,
            max_price: args.max_price,
            cheap_only: args.cheap,
            cheap_threshold: args.cheap_threshold,
            district: args.district.clone(),
            sources: args.sources.clone(),
            min_area: args.min_area,
            max_area: args.max_area,
            owner_only: args.owner,
            has_images: args.has_images,
            sort: args.sort,
            page: args.page,
            limit: args.limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let secrets = Secrets::from_env();
    let database_path = resolve_database_path(&config, &secrets)?;
    tracing::info!("Database: {}", database_path);
    let storage = SqliteStorage::new(Path::new(&database_path))?;

    match cli.command {
        Command::List(args) => handle_list(&storage, &args)?,
        Command::Meta { json } => handle_meta(&storage, json)?,
        Command::Stats => print_statistics(&load_statistics(&storage)?),
        command => {
            let orchestrator = Orchestrator::new(config, secrets, storage, config_hash)?;
            handle_crawl(orchestrator, command).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cheap_home=info,warn"),
            1 => EnvFilter::new("cheap_home=debug,info"),
            2 => EnvFilter::new("cheap_home=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the crawling subcommands
async fn handle_crawl(
    mut orchestrator: Orchestrator,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Crawl {
            source,
            target,
            adapter,
        } => {
            let params = adapter.into_params(SearchParams::default());
            let report = orchestrator.run_named(&source, &target, &params).await?;
            print_report(&report);
        }
        Command::Discover {
            query,
            search,
            adapter,
        } => {
            let params = adapter.into_params(search.into());
            let report = orchestrator.run_discovery(&query, &params).await?;
            print_report(&report);
        }
        Command::Jobs { file } => {
            let path = file.unwrap_or_else(|| job_file_path(orchestrator.config()));
            let batch = orchestrator.run_jobs(&path).await?;
            print_batch(&batch);
        }
        Command::Trigger { body } => {
            let response = handle_crawl_request(&mut orchestrator, &body).await;
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            if !response.is_success() {
                return Err(format!("crawl request failed with status {}", response.status).into());
            }
        }
        Command::List(_) | Command::Meta { .. } | Command::Stats => {}
    }

    Ok(())
}

fn job_file_path(config: &Config) -> PathBuf {
    PathBuf::from(&config.jobs.path)
}

/// Handles the list subcommand: one page of the read API
fn handle_list(storage: &SqliteStorage, args: &ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let page = storage.query_listings(&ListingQuery::from(args))?;

    if args.json {
        let records: Vec<_> = page.items.iter().map(|listing| &listing.record).collect();
        let body = serde_json::json!({
            "items": records,
            "total": page.total,
            "page": page.page,
            "limit": page.limit,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_listings(&page);
    }
    Ok(())
}

/// Handles the meta subcommand
fn handle_meta(storage: &SqliteStorage, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let meta = storage.listing_meta()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        print_meta(&meta);
    }
    Ok(())
}
