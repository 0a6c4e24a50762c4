//! ABP filtering engine CLI
//!
//! CLI tool for loading filter lists into a rule store and querying it.

use std::fs;
use std::time::Instant;

use clap::{Parser, Subcommand};

use abp_core::HeaderBag;
use abp_store::{CacheOptions, Store};

#[derive(Parser)]
#[command(name = "abp-cli")]
#[command(about = "ABP filter list loader and query tool")]
struct Cli {
    /// Path to the rule store (SQLite file, or ":memory:")
    #[arg(short, long, global = true, default_value = "rules.db")]
    store: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load one or more filter list files into the store
    Ingest {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Truncate any existing store file first
        #[arg(long)]
        overwrite: bool,

        /// Category id to tag every rule loaded in this batch with
        #[arg(long, default_value = "0")]
        category: u16,

        /// Build lookup indexes and switch the store read-only once done
        #[arg(long)]
        finalize: bool,
    },

    /// Look up the filters applicable to a host, and optionally test a request
    Query {
        /// Host to look up (subdomains fan out to every parent suffix)
        host: String,

        /// Look up exception (whitelist) rules instead of blocking rules
        #[arg(long)]
        whitelist: bool,

        /// Full request URI to test matched filters against
        #[arg(long)]
        uri: Option<String>,

        /// Referer header to include when testing a request
        #[arg(long)]
        referer: Option<String>,

        /// Content-Type header to include when testing a request
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Load filter lists and report parse/ingest statistics (CI gate)
    Stats {
        /// Input filter list files
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Fail if the loaded ratio drops below threshold (0.0-1.0)
        #[arg(long, default_value = "0.8")]
        min_load_ratio: f64,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest { input, overwrite, category, finalize } => {
            cmd_ingest(&cli.store, &input, overwrite, category, finalize)
        }
        Commands::Query { host, whitelist, uri, referer, content_type } => {
            cmd_query(&cli.store, &host, whitelist, uri.as_deref(), referer.as_deref(), content_type.as_deref())
        }
        Commands::Stats { input, min_load_ratio } => cmd_stats(&input, min_load_ratio),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_ingest(store_path: &str, inputs: &[String], overwrite: bool, category: u16, finalize: bool) -> Result<(), String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }

    let use_memory = store_path == ":memory:";
    let store = Store::open(store_path, overwrite, use_memory, CacheOptions::default())
        .map_err(|e| format!("Failed to open store '{}': {}", store_path, e))?;

    let start = Instant::now();
    let mut total_loaded = 0u64;
    let mut total_failed = 0u64;

    for path in inputs {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?;

        let report = store
            .ingest(content.lines(), category)
            .map_err(|e| format!("Failed to ingest '{}': {}", path, e))?;

        log::info!("{}: loaded {} rules, {} failed", path, report.loaded, report.failed);
        total_loaded += report.loaded;
        total_failed += report.failed;
    }

    if finalize {
        store.finalize_for_read().map_err(|e| format!("Failed to finalize store: {}", e))?;
    }

    println!("Ingested {} filter list(s) into '{}'", inputs.len(), store_path);
    println!("  Loaded:   {}", total_loaded);
    println!("  Failed:   {}", total_failed);
    println!("  Time:     {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);

    Ok(())
}

fn cmd_query(
    store_path: &str,
    host: &str,
    whitelist: bool,
    uri: Option<&str>,
    referer: Option<&str>,
    content_type: Option<&str>,
) -> Result<(), String> {
    let use_memory = store_path == ":memory:";
    let store = Store::open(store_path, false, use_memory, CacheOptions::default())
        .map_err(|e| format!("Failed to open store '{}': {}", store_path, e))?;

    let filters = store
        .get_filters_for_domain(host, whitelist)
        .map_err(|e| format!("Lookup failed: {}", e))?;

    println!("{} filter(s) applicable to '{}' (whitelist={})", filters.len(), host, whitelist);

    let Some(uri) = uri else {
        return Ok(());
    };

    let mut headers = HeaderBag::new();
    if let Some(referer) = referer {
        headers.insert("Referer", referer);
    }
    if let Some(content_type) = content_type {
        headers.insert("Content-Type", content_type);
    }

    let mut matched = 0usize;
    for filter in filters.iter() {
        if filter.is_match(uri, &headers) {
            matched += 1;
            println!("  MATCH: {:?}", filter.meta.original_rule.as_deref().unwrap_or("<trimmed>"));
        }
    }
    println!("{} of {} filter(s) matched '{}'", matched, filters.len(), uri);

    Ok(())
}

fn cmd_stats(inputs: &[String], min_load_ratio: f64) -> Result<(), String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }

    let store = Store::open(":memory:", false, true, CacheOptions::default())
        .map_err(|e| format!("Failed to open scratch store: {}", e))?;

    let start = Instant::now();
    let mut total_content_lines = 0usize;
    let mut total_loaded = 0u64;
    let mut total_failed = 0u64;

    println!("Checking {} filter list(s)...\n", inputs.len());

    for (category, path) in inputs.iter().enumerate() {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?;

        let content_lines = content
            .lines()
            .filter(|l| {
                let t = l.trim();
                !t.is_empty() && !t.starts_with('!') && !t.starts_with('[')
            })
            .count();
        total_content_lines += content_lines;

        let report = store
            .ingest(content.lines(), category as u16)
            .map_err(|e| format!("Failed to ingest '{}': {}", path, e))?;

        let ratio = if content_lines > 0 { report.loaded as f64 / content_lines as f64 } else { 1.0 };
        let status = if ratio >= min_load_ratio { "OK" } else { "WARN" };

        println!(
            "[{}] {} - {} content lines -> {} loaded, {} failed ({:.1}%)",
            status,
            path,
            content_lines,
            report.loaded,
            report.failed,
            ratio * 100.0
        );

        total_loaded += report.loaded;
        total_failed += report.failed;
    }

    let total_time = start.elapsed();
    let overall_ratio = if total_content_lines > 0 {
        total_loaded as f64 / total_content_lines as f64
    } else {
        1.0
    };

    println!("\n--- Summary ---");
    println!("Content lines:   {}", total_content_lines);
    println!("Rules loaded:    {}", total_loaded);
    println!("Rules failed:    {}", total_failed);
    println!("Load ratio:      {:.2}%", overall_ratio * 100.0);
    println!("Time:            {:.1}ms", total_time.as_secs_f64() * 1000.0);

    if overall_ratio < min_load_ratio {
        return Err(format!(
            "Load ratio {:.2}% is below threshold {:.2}%",
            overall_ratio * 100.0,
            min_load_ratio * 100.0
        ));
    }

    println!("\nAll checks passed");
    Ok(())
}
