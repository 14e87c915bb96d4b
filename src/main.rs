mod document;
mod parser;
mod store;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use store::{FieldMap, Store};

#[derive(Parser)]
#[command(name = "student_extractor", about = "Student record extraction from OCR'd documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract student records from documents and upsert them into the store
    Ingest {
        /// OCR text documents: .txt files (form-feed page breaks) or
        /// directories of per-page .txt files
        #[arg(required = true)]
        documents: Vec<PathBuf>,
        /// Store file path
        #[arg(long, default_value = "student_database.json")]
        db: PathBuf,
        /// Print per-document reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search stored records by name (case-insensitive substring)
    Search {
        query: String,
        /// Store file path
        #[arg(long, default_value = "student_database.json")]
        db: PathBuf,
    },
    /// Show store statistics
    Stats {
        /// Store file path
        #[arg(long, default_value = "student_database.json")]
        db: PathBuf,
    },
    /// List stored records
    List {
        /// Store file path
        #[arg(long, default_value = "student_database.json")]
        db: PathBuf,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest { documents, db, json } => ingest(&documents, &db, json),
        Commands::Search { query, db } => search(&query, &db),
        Commands::Stats { db } => stats(&db),
        Commands::List { db, limit } => list(&db, limit),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn ingest(documents: &[PathBuf], db: &Path, json: bool) -> Result<()> {
    let store = Store::open(db)?;
    if !json {
        println!("Store: {} ({} records)", db.display(), store.len());
    }

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")?
            .progress_chars("=> "),
    );

    let mut reports = Vec::new();
    let mut failed = 0usize;
    for path in documents {
        match document::load(path) {
            Ok(doc) => reports.push(parser::extract_and_consolidate(&doc, &store)),
            Err(e) => {
                warn!("skipping document {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let added: usize = reports.iter().map(|r| r.added_count).sum();
    let updated: usize = reports.iter().map(|r| r.updated_count).sum();
    if added > 0 || updated > 0 {
        store.save()?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "{}: {} pages with data, {} records ({} added, {} updated)",
            report.source_file,
            report.per_page_trace.len(),
            report.completed_records.len(),
            report.added_count,
            report.updated_count,
        );
    }
    println!(
        "\nProcessed {} documents ({} failed). Added {} new students, updated {} existing records ({} total in store).",
        reports.len(),
        failed,
        added,
        updated,
        store.len(),
    );
    Ok(())
}

fn search(query: &str, db: &Path) -> Result<()> {
    let store = Store::open(db)?;
    let results = store.search(query);
    if results.is_empty() {
        println!("No students matching '{}'.", query);
        return Ok(());
    }

    print_record_table(&results);
    println!("\n{} matching records", results.len());
    Ok(())
}

fn stats(db: &Path) -> Result<()> {
    let store = Store::open(db)?;
    let stats = store.stats();
    println!("Records: {}", stats.entries);
    if !stats.field_coverage.is_empty() {
        println!("\nField coverage:");
        for (field, count) in &stats.field_coverage {
            println!("  {:<18} {}", field, count);
        }
    }
    Ok(())
}

fn list(db: &Path, limit: usize) -> Result<()> {
    let store = Store::open(db)?;
    let entries = store.entries();
    if entries.is_empty() {
        println!("Store is empty. Run 'ingest' first.");
        return Ok(());
    }

    let shown = &entries[..entries.len().min(limit)];
    print_record_table(shown);
    println!("\n{} of {} records", shown.len(), entries.len());
    Ok(())
}

fn print_record_table(records: &[FieldMap]) {
    println!(
        "{:>3} | {:<24} | {:<14} | {:<24} | {:<20}",
        "#", "Name", "Student ID", "Course", "Source"
    );
    println!("{}", "-".repeat(97));

    for (i, record) in records.iter().enumerate() {
        let get = |field: &str| record.get(field).map(String::as_str).unwrap_or("-");
        println!(
            "{:>3} | {:<24} | {:<14} | {:<24} | {:<20}",
            i + 1,
            truncate(get("name"), 24),
            truncate(get("student_id"), 14),
            truncate(get("course"), 24),
            truncate(get("source_file"), 20),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
