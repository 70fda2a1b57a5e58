//! Dynamic search demo.
//!
//! Seeds a SQLite table with sample operating systems, registers the entity
//! with a [`SearchService`] and runs one criteria document against it.
//!
//! ```text
//! dynsearch-demo '{"filters":[{"key":"kernel","operator":"STARTS_WITH","value":"linux"}],
//!                  "sorts":[{"key":"usages","direction":"DESC"}],
//!                  "page":{"number":0,"size":5}}'
//! ```

mod model;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use dynamic_search::backends::sqlite::SqliteRepository;
use dynamic_search::{RegistrationLatch, SearchCriteria, SearchService};

use model::{DDL, OperatingSystem, TABLE, sample_rows};

static BOOTSTRAP: RegistrationLatch = RegistrationLatch::new();

/// Command line configuration.
#[derive(Debug, Parser)]
#[command(name = "dynsearch-demo", version, about = "Run a search criteria document against sample data")]
struct Args {
    /// Criteria document as JSON.
    #[arg(default_value = "{}")]
    criteria: String,

    /// SQLite database path.
    #[arg(long, env = "DYNSEARCH_DATABASE", default_value = ":memory:")]
    database: String,

    /// Number of sample rows to seed.
    #[arg(long, env = "DYNSEARCH_SAMPLE_SIZE", default_value = "1000")]
    sample_size: usize,

    /// Print the available filters instead of searching.
    #[arg(long)]
    filters: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "DYNSEARCH_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Installs the tracing subscriber.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("dynamic_search={},dynsearch_demo={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Opens the database and seeds it with the sample rows.
fn create_repository(args: &Args) -> anyhow::Result<SqliteRepository<OperatingSystem>> {
    info!(database = %args.database, "Initializing SQLite repository");

    let repository = if args.database == ":memory:" {
        SqliteRepository::in_memory(TABLE)?
    } else {
        SqliteRepository::open(&args.database, TABLE)?
    };
    repository.execute_batch(DDL)?;
    repository.execute_batch(&format!("DELETE FROM {}", TABLE))?;

    let rows = sample_rows(args.sample_size);
    for row in &rows {
        repository.insert(row)?;
    }
    info!(rows = rows.len(), "Seeded sample data");

    Ok(repository)
}

/// Registers every searchable entity once.
fn bootstrap(service: &SearchService, args: &Args) -> anyhow::Result<()> {
    BOOTSTRAP
        .run_once(|| -> anyhow::Result<()> {
            let repository = create_repository(args)?;
            service.register_entity::<OperatingSystem>(Arc::new(repository))?;
            Ok(())
        })
        .transpose()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let service = SearchService::new();
    bootstrap(&service, &args)?;

    if args.filters {
        let filters = service.available_filters::<OperatingSystem>();
        println!("{}", serde_json::to_string_pretty(&filters)?);
        return Ok(());
    }

    let criteria: SearchCriteria =
        serde_json::from_str(&args.criteria).context("invalid criteria document")?;
    let result = service.search::<OperatingSystem>(&criteria).await?;

    info!(
        total = result.total_elements,
        pages = result.total_pages,
        "Search complete"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
