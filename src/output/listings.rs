//! Terminal rendering of listings, metadata and crawl reports

use crate::crawler::{BatchReport, CrawlReport};
use crate::storage::{ListingMeta, ListingPage};

/// Formats whole VND with dot grouping (`2.500.000 đ`)
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if price < 0 { "-" } else { "" };
    format!("{}{} đ", sign, grouped)
}

/// Prints one page of listings
pub fn print_listings(page: &ListingPage) {
    let pages = if page.limit == 0 {
        0
    } else {
        page.total.div_ceil(u64::from(page.limit))
    };
    println!(
        "=== Listings (page {} of {}, {} total) ===\n",
        page.page, pages, page.total
    );

    for listing in &page.items {
        let record = &listing.record;
        println!("{} | {}", format_price(record.price), record.title);

        let mut details = vec![record.source.to_string()];
        if let Some(district) = record.district_text() {
            details.push(district.to_string());
        }
        if let Some(area) = record.area {
            details.push(format!("{} m²", area));
        }
        if record.is_owner == Some(true) {
            details.push("owner".to_string());
        }
        println!("  {}", details.join(" · "));
        if let Some(address) = record.address_text() {
            println!("  {}", address);
        }
        println!("  {}", record.url);
    }
}

/// Prints the store metadata used for filters
pub fn print_meta(meta: &ListingMeta) {
    println!("=== Listing Metadata ===\n");
    println!("  Listings: {}", meta.count);
    println!(
        "  Price range: {} - {}",
        format_price(meta.price_range.min),
        format_price(meta.price_range.max)
    );
    println!(
        "  Area range: {} - {} m²",
        meta.area_range.min, meta.area_range.max
    );
    println!("  Districts: {}", meta.districts.join(", "));
    println!("  Sources: {}", meta.sources.join(", "));
}

/// Prints the totals of one crawl or discovery run
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");
    if report.discovered > 0 {
        println!("  Discovered targets: {}", report.discovered);
    }
    println!("  Crawled listings: {}", report.crawled);
    println!("  Upserted listings: {}", report.upserted);
    println!("  Sources crawled: {}", report.sources_crawled.join(", "));

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }
}

/// Prints per-job results followed by batch totals
pub fn print_batch(batch: &BatchReport) {
    println!(
        "=== Batch: {} jobs, {} failed ===\n",
        batch.jobs_total(),
        batch.jobs_failed()
    );

    for (index, job) in batch.jobs.iter().enumerate() {
        match &job.error {
            Some(error) => println!("  {}. [{}] {}: FAILED {}", index + 1, job.source, job.target, error),
            None => println!(
                "  {}. [{}] {}: crawled {}, upserted {}",
                index + 1,
                job.source,
                job.target,
                job.report.crawled,
                job.report.upserted
            ),
        }
    }
    println!();

    print_report(&batch.totals);
}
