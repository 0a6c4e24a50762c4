//! The domain-indexed SQLite rule store.
//!
//! Single table, single-writer/many-reader (spec §5): one writer
//! `Connection` behind a `Mutex` for `ingest`/`finalize_for_read`, and an
//! `r2d2`-pooled set of read-only connections for
//! `get_filters_for_domain`, so concurrent lookups never serialise behind
//! one handle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use abp_core::{Filter, UrlFilter};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};

use crate::cache::{CacheOptions, LookupCache};
use crate::error::StoreError;

const GLOBAL_KEY: &str = "global";

/// Outcome of a bulk `ingest` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub loaded: u64,
    pub failed: u64,
}

type Pool = r2d2::Pool<SqliteConnectionManager>;

pub struct Store {
    path: String,
    writer: Mutex<Connection>,
    readers: Pool,
    cache: LookupCache,
    finalized: AtomicBool,
}

impl Store {
    /// Open (creating if necessary) a store at `path`, or an in-memory
    /// store when `use_memory` is true. `overwrite` truncates any existing
    /// on-disk file first.
    pub fn open(path: &str, overwrite: bool, use_memory: bool, cache: CacheOptions) -> Result<Self, StoreError> {
        if overwrite && !use_memory {
            let _ = std::fs::remove_file(path);
        }

        // Shared-cache mode is requested through the connection URI rather
        // than a PRAGMA, per SQLite's own API surface; enabling it lets the
        // writer and reader pool see the same database, whether on disk or
        // (each `Store` gets its own named in-memory database) in memory.
        static MEMORY_DB_COUNTER: AtomicU64 = AtomicU64::new(0);
        let uri = if use_memory {
            let id = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("file:abp-store-{id}?mode=memory&cache=shared")
        } else {
            format!("file:{path}?cache=shared")
        };

        let writer = Connection::open_with_flags(
            &uri,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI,
        )?;
        tune_for_bulk_write(&writer)?;
        create_table(&writer)?;

        let manager = SqliteConnectionManager::file(&uri)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI);
        let readers = r2d2::Pool::builder().max_size(8).build(manager)?;

        let path = path.to_string();

        Ok(Self {
            path,
            writer: Mutex::new(writer),
            readers,
            cache: LookupCache::new(cache),
            finalized: AtomicBool::new(false),
        })
    }

    /// Bulk-load `lines` under `category_id` inside a single transaction.
    /// Element-hide rules are counted as parser failures of URL-filter
    /// ingest, per spec §4.5's preserved numeric contract. Invalidates the
    /// lookup cache on return.
    pub fn ingest<'a>(
        &self,
        lines: impl Iterator<Item = &'a str>,
        category_id: u16,
    ) -> Result<IngestReport, StoreError> {
        if self.finalized.load(Ordering::Acquire) {
            return Err(StoreError::ReadOnly);
        }

        let mut conn = self.writer.lock().expect("writer mutex poisoned");
        let tx = conn.transaction()?;
        let mut report = IngestReport::default();
        let mut parse_failures_in_batch = 0u64;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO UrlFiltersIndex (Domains, CategoryId, IsWhitelist, Source) VALUES (?1, ?2, ?3, ?4)",
            )?;

            for line in lines {
                match abp_parser::parse_rule(line, category_id) {
                    Ok(Filter::Url(filter)) => {
                        let is_whitelist = filter.meta.is_exception;
                        let source = filter.meta.original_rule.as_deref().unwrap_or(line);
                        if filter.applicable_domains.is_empty() {
                            stmt.execute((GLOBAL_KEY, category_id, is_whitelist, source))?;
                        } else {
                            for domain in &filter.applicable_domains {
                                stmt.execute((domain.as_str(), category_id, is_whitelist, source))?;
                            }
                        }
                        report.loaded += 1;
                    }
                    Ok(Filter::Html(_)) | Err(_) => {
                        report.failed += 1;
                        parse_failures_in_batch += 1;
                    }
                }
            }
        }

        tx.commit()?;
        if parse_failures_in_batch > 0 {
            log::warn!("ingest: {parse_failures_in_batch} line(s) did not produce a url filter");
        }

        self.cache.clear();
        Ok(report)
    }

    /// Create the supporting indexes and mark the store read-only.
    pub fn finalize_for_read(&self) -> Result<(), StoreError> {
        if self.finalized.swap(true, Ordering::AcqRel) {
            return Err(StoreError::AlreadyFinalized);
        }
        let conn = self.writer.lock().expect("writer mutex poisoned");
        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_domains ON UrlFiltersIndex (Domains);
             CREATE INDEX IF NOT EXISTS idx_whitelist ON UrlFiltersIndex (IsWhitelist);
             CREATE INDEX IF NOT EXISTS idx_domains_whitelist ON UrlFiltersIndex (Domains, IsWhitelist);",
        )?;
        Ok(())
    }

    /// Look up rules applicable to `host`, expanding to every parent-domain
    /// suffix (spec §4.6), re-parsing each stored row, and caching the
    /// combined result under `(host, want_whitelist)`.
    pub fn get_filters_for_domain(&self, host: &str, want_whitelist: bool) -> Result<Arc<Vec<UrlFilter>>, StoreError> {
        if let Some(cached) = self.cache.get(host, want_whitelist) {
            return Ok(cached);
        }

        let conn = self.readers.get()?;
        let mut stmt = conn.prepare(
            "SELECT CategoryId, Source FROM UrlFiltersIndex WHERE Domains = ?1 AND IsWhitelist = ?2",
        )?;

        let mut filters = Vec::new();
        for suffix in abp_core::text::walk_domain_suffixes(host) {
            let rows = stmt.query_map((suffix, want_whitelist), |row| {
                let category_id: u16 = row.get(0)?;
                let source: String = row.get(1)?;
                Ok((category_id, source))
            })?;

            for row in rows {
                let (category_id, source) = row?;
                match abp_parser::parse_rule(&source, category_id) {
                    Ok(Filter::Url(filter)) => filters.push(filter),
                    Ok(Filter::Html(_)) => {}
                    Err(_) => {
                        log::error!("get_filters_for_domain: stored row failed to re-parse: {source:?}");
                    }
                }
            }
        }

        let filters = Arc::new(filters);
        self.cache.insert(host, want_whitelist, filters.clone());
        Ok(filters)
    }

    /// Look up rules stored under the sentinel `"global"` bucket: rules
    /// with no applicable domain.
    pub fn get_global_filters(&self, want_whitelist: bool) -> Result<Arc<Vec<UrlFilter>>, StoreError> {
        self.get_filters_for_domain(GLOBAL_KEY, want_whitelist)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn tune_for_bulk_write(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA synchronous = OFF;
         PRAGMA journal_mode = OFF;
         PRAGMA cache_size = -64000;",
    )?;
    Ok(())
}

fn create_table(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS UrlFiltersIndex (
            Domains VARCHAR(255) NOT NULL,
            CategoryId INTEGER NOT NULL,
            IsWhitelist BOOLEAN NOT NULL,
            Source TEXT NOT NULL
        );",
    )?;
    Ok(())
}
