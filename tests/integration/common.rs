use cheap_home::config::{Config, Secrets};
use cheap_home::crawler::Orchestrator;
use cheap_home::storage::SqliteStorage;
use std::path::Path;
use tempfile::TempDir;

/// Creates a test configuration pointing every external API at `server_uri`
///
/// All pauses are zero so tests run quickly.
pub fn test_config(server_uri: &str, db_path: &Path) -> Config {
    let mut config = Config::with_database(db_path.to_string_lossy());
    config.crawler.target_delay = 0;
    config.crawler.job_delay = 0;
    config.crawler.geocode_delay = 0;
    config.crawler.llm_delay = 0;
    config.endpoints.geocode = format!("{}/geocode/json", server_uri);
    config.endpoints.llm = format!("{}/v1", server_uri);
    config.endpoints.serpapi = format!("{}/search", server_uri);
    config.endpoints.graph = format!("{}/graph", server_uri);
    config
}

/// Opens a fresh store inside `dir` and wraps it in an orchestrator
pub fn orchestrator(server_uri: &str, dir: &TempDir, secrets: Secrets) -> Orchestrator {
    let db_path = dir.path().join("rooms.db");
    let config = test_config(server_uri, &db_path);
    let storage = SqliteStorage::new(&db_path).expect("Failed to open storage");
    Orchestrator::new(config, secrets, storage, "test-config-hash")
        .expect("Failed to build orchestrator")
}

/// One well-formed phongtro123 listing block
pub fn listing_block(slug: &str, title: &str, price: &str, address: &str) -> String {
    format!(
        r#"<li class="post-item">
             <figure><img data-src="/img/{slug}.jpg" src="/img/placeholder.gif"></figure>
             <h3><a href="/{slug}.html">{title}</a></h3>
             <div class="post-meta">
               <span class="post-price">{price}</span>
               <span class="acreage">20m2</span>
               <span class="address">{address}</span>
             </div>
           </li>"#,
        slug = slug,
        title = title,
        price = price,
        address = address
    )
}

/// A listing page wrapping the given blocks
pub fn listing_page(blocks: &[String]) -> String {
    format!(
        "<html><head><title>Phòng trọ Đà Nẵng</title></head><body><ul>{}</ul></body></html>",
        blocks.join("\n")
    )
}

/// Five valid listings plus one without a price, under a shared slug prefix
pub fn five_good_one_bad(prefix: &str) -> String {
    let mut blocks: Vec<String> = (1..=5)
        .map(|i| {
            listing_block(
                &format!("{}-{}", prefix, i),
                &format!("Phòng trọ {} số {}", prefix, i),
                &format!("{},5 triệu/tháng", i),
                "Đường Lê Duẩn, Hải Châu, Đà Nẵng",
            )
        })
        .collect();
    blocks.push(listing_block(
        &format!("{}-no-price", prefix),
        "Phòng trọ giá thỏa thuận",
        "Thỏa thuận",
        "Sơn Trà, Đà Nẵng",
    ));
    listing_page(&blocks)
}
