//! Legisync CLI
//!
//! One-shot reconciliation of the legislation listing into a spreadsheet:
//! - `run`: fetch, diff, and write
//! - `plan`: fetch and diff, print what would be written
//! - `fields`: print the raw keys of the first listed record

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use legisync_core::writer::failed_stage;
use legisync_core::{
    JsonFileRowStore, RecordSource, RowStore, RunSummary, SyncConfig, SyncError, SyncPipeline,
    SyncPlan,
};
use legisync_remote::{LegisClient, SheetsRowStore};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "legisync")]
#[command(author, version, about = "Keep a spreadsheet in sync with the legislature's bill listing")]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every record, reconcile against the store, and write the changes.
    Run {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Like `run`, but stop before writing and print the plan.
    Plan {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print the raw field names of the first record the source returns.
    Fields {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// JSON config file (see `SyncConfig`)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// General Assembly to list (overrides config)
    #[arg(long)]
    ga: Option<u32>,

    /// Records per page (overrides config)
    #[arg(long)]
    page_size: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
    Sheets,
    File,
}

#[derive(Args)]
struct StoreArgs {
    #[arg(long, value_enum, default_value = "sheets")]
    store: StoreKind,

    /// Path of the JSON grid for `--store file`
    #[arg(long, default_value = "legisync.json")]
    file: PathBuf,

    /// Spreadsheet id for `--store sheets`
    #[arg(long, conflicts_with = "spreadsheet_name")]
    spreadsheet_id: Option<String>,

    /// Spreadsheet title; found through Drive or created
    #[arg(long)]
    spreadsheet_name: Option<String>,

    /// Tab within the spreadsheet
    #[arg(long, default_value = "Sheet1")]
    sheet: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run { source, store } => cmd_run(&source, &store),
        Commands::Plan { source, store } => cmd_plan(&source, &store),
        Commands::Fields { source } => cmd_fields(&source),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============================================================================
// Setup
// ============================================================================

fn load_config(args: &SourceArgs) -> Result<SyncConfig> {
    let mut config = match &args.config {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SyncConfig::default(),
    };
    if let Some(ga) = args.ga {
        config.partition_key = ga;
    }
    if let Some(size) = args.page_size {
        config.page_size = size;
    }
    config.validate()?;
    Ok(config)
}

fn open_store(args: &StoreArgs) -> Result<Box<dyn RowStore>> {
    match args.store {
        StoreKind::File => Ok(Box::new(JsonFileRowStore::new(&args.file))),
        StoreKind::Sheets => {
            let token = SheetsRowStore::token_from_env()?;
            let store = match (&args.spreadsheet_id, &args.spreadsheet_name) {
                (Some(id), _) => SheetsRowStore::new(&token, id, &args.sheet)?,
                (None, Some(name)) => SheetsRowStore::open_by_name(&token, name, &args.sheet)
                    .with_context(|| format!("failed to open spreadsheet `{name}`"))?,
                (None, None) => {
                    return Err(anyhow!(
                        "--store sheets needs --spreadsheet-id or --spreadsheet-name"
                    ))
                }
            };
            Ok(Box::new(store))
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_run(source_args: &SourceArgs, store_args: &StoreArgs) -> Result<()> {
    let pipeline = SyncPipeline::new(load_config(source_args)?)?;
    let mut source = LegisClient::new()?;
    let mut store = open_store(store_args)?;

    println!(
        "{} ga={} page_size={}",
        "Syncing".green().bold(),
        pipeline.config().partition_key,
        pipeline.config().page_size
    );
    let summary = pipeline.run_once(&mut source, &mut *store).map_err(|err| {
        let stage = match &err {
            SyncError::StoreWrite(failure) => failed_stage(failure),
            _ => None,
        };
        match stage {
            Some(stage) => anyhow::Error::new(err).context(format!("{stage} write failed")),
            None => err.into(),
        }
    })?;
    print_summary(&summary);
    Ok(())
}

fn cmd_plan(source_args: &SourceArgs, store_args: &StoreArgs) -> Result<()> {
    let pipeline = SyncPipeline::new(load_config(source_args)?)?;
    let mut source = LegisClient::new()?;
    let mut store = open_store(store_args)?;

    let plan = pipeline.plan(&mut source, &mut *store)?;
    print_plan(&plan, pipeline.config().update_batch_size);
    Ok(())
}

fn cmd_fields(source_args: &SourceArgs) -> Result<()> {
    let config = load_config(source_args)?;
    let mut source = LegisClient::new()?;
    let page = source
        .fetch_page(config.partition_key, 1, 1)
        .context("failed to fetch first page")?;
    let record = page
        .records
        .first()
        .ok_or_else(|| anyhow!("source returned no records (total={})", page.total))?;

    println!("{} total={}", "Fields".green().bold(), page.total);
    for key in record.keys() {
        let value = record
            .get(key)
            .map(|v| serde_json::to_string(v).unwrap_or_default())
            .unwrap_or_default();
        println!("  {} = {}", key.bold(), value.dimmed());
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_summary(summary: &RunSummary) {
    if summary.schema_mismatch {
        println!(
            "{} store header does not match; all records were appended",
            "warning:".yellow().bold()
        );
    }
    println!(
        "{} fetched={} inserted={} updated={} unchanged={} skipped={} duplicates={}{}",
        "ok".green().bold(),
        summary.fetched,
        summary.inserted,
        summary.updated,
        summary.unchanged,
        summary.skipped,
        summary.duplicates,
        if summary.header_written { " (header written)" } else { "" }
    );
}

fn print_plan(plan: &SyncPlan, batch_size: usize) {
    if let Some(mismatch) = &plan.schema_mismatch {
        println!("{} {}", "warning:".yellow().bold(), mismatch);
    }
    println!(
        "{} fetched={} new={} updates={} unchanged={} skipped={} duplicates={} batches={}",
        "Plan".cyan().bold(),
        plan.fetched,
        plan.write.new_rows.len(),
        plan.write.updates.len(),
        plan.unchanged,
        plan.skipped,
        plan.duplicates,
        plan.write.batch_count(batch_size),
    );
    if plan.write.write_header {
        println!("  {} header row", "write".green());
    }
    if !plan.write.new_rows.is_empty() {
        println!(
            "  {} {} rows at position {}",
            "append".green(),
            plan.write.new_rows.len(),
            plan.write.append_at
        );
    }
    for update in &plan.write.updates {
        let changed: Vec<&str> = update.changed.iter().map(|c| c.label()).collect();
        println!(
            "  {} row {} ({}): {}",
            "update".yellow(),
            update.position,
            update.row.sort_key,
            changed.join(", ")
        );
    }
}
