//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ListingStore trait.

use crate::model::{GeoPoint, ListingRecord, Origin};
use crate::storage::query::{ListingMeta, ListingPage, ListingQuery, NumericRange};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ListingStore, StorageError, StorageResult};
use crate::storage::{RunCounts, RunMode, RunRecord, RunStatus, StoredListing, UpsertSummary};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Statement};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

const LISTING_COLUMNS: &str = "id, url, title, price, address, district, area, images, posted_at, \
     source, lng, lat, amenities, room_type, is_owner, spam_score, raw_description, source_id, \
     crawled_at, created_at, updated_at, is_active";

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, mode, config_hash, status, discovered, crawled, upserted, warnings";

/// How an incoming value combines with the stored one on conflict
#[derive(Clone, Copy)]
enum Merge {
    /// Always take the incoming value
    Replace,
    /// Keep the stored value when the incoming one is NULL
    KeepIfNull,
    /// Keep the stored list when the incoming JSON list is empty
    KeepIfEmptyList,
}

const UPSERT_COLUMNS: &[(&str, Merge)] = &[
    ("title", Merge::Replace),
    ("search_text", Merge::Replace),
    ("price", Merge::Replace),
    ("address", Merge::KeepIfNull),
    ("district", Merge::KeepIfNull),
    ("area", Merge::KeepIfNull),
    ("images", Merge::KeepIfEmptyList),
    ("posted_at", Merge::Replace),
    ("source", Merge::Replace),
    ("lng", Merge::KeepIfNull),
    ("lat", Merge::KeepIfNull),
    ("amenities", Merge::KeepIfNull),
    ("room_type", Merge::KeepIfNull),
    ("is_owner", Merge::KeepIfNull),
    ("spam_score", Merge::KeepIfNull),
    ("raw_description", Merge::KeepIfNull),
    ("source_id", Merge::KeepIfNull),
    ("crawled_at", Merge::KeepIfNull),
];

fn merged_value(column: &str, merge: Merge) -> String {
    match merge {
        Merge::Replace => format!("excluded.{c}", c = column),
        Merge::KeepIfNull => format!("COALESCE(excluded.{c}, listings.{c})", c = column),
        Merge::KeepIfEmptyList => format!(
            "CASE WHEN excluded.{c} = '[]' THEN listings.{c} ELSE excluded.{c} END",
            c = column
        ),
    }
}

/// Insert-or-update statement; the update only fires when a value changes,
/// so the affected row count separates modified from unchanged rows
fn upsert_sql() -> &'static str {
    static SQL: OnceLock<String> = OnceLock::new();
    SQL.get_or_init(|| {
        let assignments: Vec<String> = UPSERT_COLUMNS
            .iter()
            .map(|(column, merge)| format!("{} = {}", column, merged_value(column, *merge)))
            .collect();
        let changes: Vec<String> = UPSERT_COLUMNS
            .iter()
            .map(|(column, merge)| {
                format!("listings.{} IS NOT {}", column, merged_value(column, *merge))
            })
            .collect();

        format!(
            "INSERT INTO listings (url, title, search_text, price, address, district, area, images, \
             posted_at, source, lng, lat, amenities, room_type, is_owner, spam_score, \
             raw_description, source_id, crawled_at, created_at, updated_at, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
             ?18, ?19, ?20, ?20, 1) \
             ON CONFLICT(url) DO UPDATE SET {}, updated_at = excluded.updated_at, is_active = 1 \
             WHERE {} OR listings.is_active = 0",
            assignments.join(", "),
            changes.join(" OR ")
        )
    })
}

/// Formats a timestamp the way every TEXT time column stores it
pub(crate) fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn from_db_time(raw: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, format!("bad timestamp '{}': {}", raw, e)))
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

fn search_text(title: &str, address: Option<&str>) -> String {
    match address {
        Some(address) => format!("{} {}", title, address).to_lowercase(),
        None => title.to_lowercase(),
    }
}

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlError)` - Failed to open database
    pub fn new(path: &Path) -> crate::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn upsert_one(
        tx: &Connection,
        stmt: &mut Statement<'_>,
        record: &ListingRecord,
        now: &str,
    ) -> StorageResult<UpsertOutcome> {
        let stored_address: Option<Option<String>> = tx
            .query_row(
                "SELECT address FROM listings WHERE url = ?1",
                params![record.url],
                |row| row.get(0),
            )
            .optional()?;
        let exists = stored_address.is_some();

        let effective_address = record
            .address
            .clone()
            .or_else(|| stored_address.flatten());

        let images = serde_json::to_string(&record.images)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let amenities = record
            .amenities
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let changed = stmt.execute(params![
            record.url,
            record.title,
            search_text(&record.title, effective_address.as_deref()),
            record.price,
            record.address,
            record.district,
            record.area,
            images,
            to_db_time(&record.posted_at),
            record.source.to_db_string(),
            record.location.map(|p| p.lng),
            record.location.map(|p| p.lat),
            amenities,
            record.room_type,
            record.is_owner,
            record.spam_score,
            record.raw_description,
            record.source_id,
            record.crawled_at.as_ref().map(to_db_time),
            now,
        ])?;

        let outcome = match (exists, changed) {
            (false, _) => UpsertOutcome::Inserted,
            (true, 0) => UpsertOutcome::Unchanged,
            (true, _) => UpsertOutcome::Modified,
        };
        debug!("{:?} {}", outcome, record.url);
        Ok(outcome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpsertOutcome {
    Inserted,
    Modified,
    Unchanged,
}

fn row_to_listing(row: &Row<'_>) -> rusqlite::Result<StoredListing> {
    let images_json: String = row.get(7)?;
    let images: Vec<String> = serde_json::from_str(&images_json)
        .map_err(|e| conversion_error(7, format!("bad images JSON: {}", e)))?;

    let amenities: Option<Vec<String>> = row
        .get::<_, Option<String>>(12)?
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| conversion_error(12, format!("bad amenities JSON: {}", e)))?;

    let source_raw: String = row.get(9)?;
    let source = Origin::from_db_string(&source_raw)
        .ok_or_else(|| conversion_error(9, format!("unknown source '{}'", source_raw)))?;

    let location = match (row.get::<_, Option<f64>>(10)?, row.get::<_, Option<f64>>(11)?) {
        (Some(lng), Some(lat)) => Some(GeoPoint { lng, lat }),
        _ => None,
    };

    let crawled_at = row
        .get::<_, Option<String>>(18)?
        .map(|raw| from_db_time(&raw, 18))
        .transpose()?;

    let record = ListingRecord {
        url: row.get(1)?,
        title: row.get(2)?,
        price: row.get(3)?,
        address: row.get(4)?,
        district: row.get(5)?,
        area: row.get(6)?,
        images,
        posted_at: from_db_time(&row.get::<_, String>(8)?, 8)?,
        source,
        location,
        amenities,
        room_type: row.get(13)?,
        is_owner: row.get(14)?,
        spam_score: row.get(15)?,
        raw_description: row.get(16)?,
        source_id: row.get(17)?,
        crawled_at,
    };

    Ok(StoredListing {
        id: row.get(0)?,
        record,
        created_at: from_db_time(&row.get::<_, String>(19)?, 19)?,
        updated_at: from_db_time(&row.get::<_, String>(20)?, 20)?,
        is_active: row.get(21)?,
    })
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let count = |idx: usize| -> rusqlite::Result<usize> {
        Ok(row.get::<_, i64>(idx)?.max(0) as usize)
    };

    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        mode: RunMode::from_db_string(&row.get::<_, String>(3)?).unwrap_or(RunMode::Single),
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Running),
        counts: RunCounts {
            discovered: count(6)?,
            crawled: count(7)?,
            upserted: count(8)?,
            warnings: count(9)?,
        },
    })
}

impl ListingStore for SqliteStorage {
    // ===== Listings =====

    fn upsert_many(&mut self, records: &[ListingRecord]) -> StorageResult<UpsertSummary> {
        let mut summary = UpsertSummary::default();
        if records.is_empty() {
            return Ok(summary);
        }

        let now = to_db_time(&Utc::now());
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(upsert_sql())?;
            for record in records {
                match Self::upsert_one(&tx, &mut stmt, record, &now) {
                    Ok(UpsertOutcome::Inserted) => summary.inserted += 1,
                    Ok(UpsertOutcome::Modified) => summary.modified += 1,
                    Ok(UpsertOutcome::Unchanged) => summary.unchanged += 1,
                    Err(e) => {
                        warn!("Failed to upsert {}: {}", record.url, e);
                        summary.failed += 1;
                    }
                }
            }
        }
        tx.commit()?;

        debug!(
            "Upserted {} records: {} inserted, {} modified, {} unchanged, {} failed",
            records.len(),
            summary.inserted,
            summary.modified,
            summary.unchanged,
            summary.failed
        );
        Ok(summary)
    }

    fn get_by_url(&self, url: &str) -> StorageResult<Option<StoredListing>> {
        let listing = self
            .conn
            .query_row(
                &format!("SELECT {} FROM listings WHERE url = ?1", LISTING_COLUMNS),
                params![url],
                row_to_listing,
            )
            .optional()?;
        Ok(listing)
    }

    fn count_listings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_origin(&self) -> StorageResult<Vec<(Origin, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM listings GROUP BY source ORDER BY source")?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|(source, count)| {
                Origin::from_db_string(&source).map(|origin| (origin, count as u64))
            })
            .collect();

        Ok(counts)
    }

    // ===== Read API =====

    fn query_listings(&self, query: &ListingQuery) -> StorageResult<ListingPage> {
        let (clause, values) = query.where_clause();
        let limit = query.effective_limit();

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM listings WHERE {}", clause),
            params_from_iter(values.clone()),
            |row| row.get(0),
        )?;

        let mut page_values = values;
        page_values.push(Value::Integer(i64::from(limit)));
        page_values.push(Value::Integer(query.offset()));

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM listings WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            LISTING_COLUMNS,
            clause,
            query.sort.order_by()
        ))?;

        let items = stmt
            .query_map(params_from_iter(page_values), row_to_listing)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListingPage {
            items,
            total: total as u64,
            page: query.effective_page(),
            limit,
        })
    }

    fn listing_meta(&self) -> StorageResult<ListingMeta> {
        let distinct = |column: &str| -> StorageResult<Vec<String>> {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT DISTINCT {c} FROM listings WHERE {c} IS NOT NULL AND {c} <> '' ORDER BY {c}",
                c = column
            ))?;
            let values = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(values)
        };

        let (min_price, max_price, count): (Option<i64>, Option<i64>, i64) = self.conn.query_row(
            "SELECT MIN(price), MAX(price), COUNT(*) FROM listings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let (min_area, max_area): (Option<f64>, Option<f64>) = self.conn.query_row(
            "SELECT MIN(area), MAX(area) FROM listings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(ListingMeta {
            districts: distinct("district")?,
            sources: distinct("source")?,
            price_range: NumericRange {
                min: min_price.unwrap_or(0),
                max: max_price.unwrap_or(0),
            },
            area_range: NumericRange {
                min: min_area.unwrap_or(0.0),
                max: max_area.unwrap_or(0.0),
            },
            count: count as u64,
        })
    }

    // ===== Run Ledger =====

    fn create_run(&mut self, mode: RunMode, config_hash: &str) -> StorageResult<i64> {
        let now = to_db_time(&Utc::now());
        self.conn.execute(
            "INSERT INTO crawl_runs (started_at, mode, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                mode.to_db_string(),
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counts: &RunCounts,
    ) -> StorageResult<()> {
        let now = to_db_time(&Utc::now());
        let updated = self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, discovered = ?3, crawled = ?4,
             upserted = ?5, warnings = ?6 WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                counts.discovered as i64,
                counts.crawled as i64,
                counts.upserted as i64,
                counts.warnings as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM crawl_runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                row_to_run,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        Ok(self.recent_runs(1)?.into_iter().next())
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![limit as i64], row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
