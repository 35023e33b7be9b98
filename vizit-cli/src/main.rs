//! Vizit CLI - visit ledger bookkeeping in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{import, migrate, report, visit};
use vizit_core::services::DEFAULT_PAGE_SIZE;

/// Vizit - visit ledger bookkeeping in your terminal
#[derive(Parser)]
#[command(name = "vz", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import visits from a CSV/TSV or JSON export
    Import {
        /// Path to the input file ("-" reads piped stdin)
        #[arg(long)]
        file: PathBuf,
        /// Owner uid stamped onto every parsed row
        #[arg(long)]
        uid: Option<String>,
        /// Input format (auto checks the extension, then the content)
        #[arg(long, value_enum, default_value_t = import::FormatArg::Auto)]
        format: import::FormatArg,
        /// Write the parsed visits (default is a dry run)
        #[arg(long)]
        apply: bool,
        /// Firestore collection
        #[arg(long)]
        collection: Option<String>,
        /// Firebase project id
        #[arg(long)]
        project_id: Option<String>,
        /// Path to a service account key JSON file
        #[arg(long)]
        service_account: Option<PathBuf>,
        /// Cell delimiter for tabular input
        #[arg(long, value_enum, default_value_t = import::DelimiterArg::Auto)]
        delimiter: import::DelimiterArg,
        /// Procedure recorded when a row names none
        #[arg(long)]
        default_procedure: Option<String>,
        /// Year assumed for dates written without one
        #[arg(long, value_parser = clap::value_parser!(i32).range(2000..=2100))]
        year: Option<i32>,
    },

    /// Backfill owner uids on documents imported before per-user ownership
    MigrateOwners {
        /// Write the resolved uids (default is a dry run)
        #[arg(long)]
        apply: bool,
        /// Firestore collection
        #[arg(long)]
        collection: Option<String>,
        /// Firebase project id
        #[arg(long)]
        project_id: Option<String>,
        /// Path to a service account key JSON file
        #[arg(long)]
        service_account: Option<PathBuf>,
        /// Assign every ownerless document to this uid
        #[arg(long)]
        all_to_uid: Option<String>,
        /// JSON uid map: {"defaultUid", "byDocId"} or a flat {docId: uid}
        #[arg(long)]
        map_file: Option<PathBuf>,
        /// Documents per scan page (max: 500)
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Stop after assigning this many documents (0 means no limit)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },

    /// Monthly report: summary, trend, top days and the visit ledger
    Report {
        /// Owner uid to report on (default: defaultUid from settings)
        #[arg(long)]
        uid: Option<String>,
        /// Month to report, YYYY-MM (default: the current month)
        #[arg(long)]
        month: Option<String>,
        /// Case-insensitive search over patient, procedure, notes and date
        #[arg(long)]
        search: Option<String>,
        /// Ledger order
        #[arg(long, value_enum, default_value_t = report::SortArg::DateDesc)]
        sort: report::SortArg,
        /// Firestore collection
        #[arg(long)]
        collection: Option<String>,
        /// Firebase project id
        #[arg(long)]
        project_id: Option<String>,
        /// Path to a service account key JSON file
        #[arg(long)]
        service_account: Option<PathBuf>,
    },

    /// Record one visit
    Add {
        /// Owner uid the visit belongs to (default: defaultUid from settings)
        #[arg(long)]
        uid: Option<String>,
        /// Patient full name
        #[arg(long)]
        patient: String,
        /// Visit amount
        #[arg(long)]
        amount: Decimal,
        /// Visit date, ISO or D.M[.Y] (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Procedure name
        #[arg(long)]
        procedure: Option<String>,
        /// Doctor share percent
        #[arg(long, default_value_t = Decimal::from(30))]
        percent: Decimal,
        /// Free-form note
        #[arg(long)]
        notes: Option<String>,
        /// Firestore collection
        #[arg(long)]
        collection: Option<String>,
        /// Firebase project id
        #[arg(long)]
        project_id: Option<String>,
        /// Path to a service account key JSON file
        #[arg(long)]
        service_account: Option<PathBuf>,
    },

    /// Delete one visit by document id
    Delete {
        /// Document id to delete
        id: String,
        /// Firestore collection
        #[arg(long)]
        collection: Option<String>,
        /// Firebase project id
        #[arg(long)]
        project_id: Option<String>,
        /// Path to a service account key JSON file
        #[arg(long)]
        service_account: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout and exit 0; argument errors
            // go to stderr and exit 1.
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vizit_core=warn,vizit_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            if e.chain()
                .any(|cause| cause.to_string().contains("Unable to detect a project id"))
            {
                eprintln!("Hint: run from project root with .firebaserc, or pass --project-id, or pass --service-account.");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Import {
            file,
            uid,
            format,
            apply,
            collection,
            project_id,
            service_account,
            delimiter,
            default_procedure,
            year,
        } => import::run(
            file,
            uid,
            format,
            apply,
            collection,
            project_id,
            service_account,
            delimiter,
            default_procedure,
            year,
        )
        .context("Import failed"),
        Commands::MigrateOwners {
            apply,
            collection,
            project_id,
            service_account,
            all_to_uid,
            map_file,
            page_size,
            limit,
        } => migrate::run(
            apply,
            collection,
            project_id,
            service_account,
            all_to_uid,
            map_file,
            page_size,
            limit,
        )
        .context("Migration failed"),
        Commands::Report {
            uid,
            month,
            search,
            sort,
            collection,
            project_id,
            service_account,
        } => report::run(
            uid,
            month,
            search,
            sort,
            collection,
            project_id,
            service_account,
        )
        .context("Report failed"),
        Commands::Add {
            uid,
            patient,
            amount,
            date,
            procedure,
            percent,
            notes,
            collection,
            project_id,
            service_account,
        } => visit::add(
            uid,
            patient,
            amount,
            date,
            procedure,
            percent,
            notes,
            collection,
            project_id,
            service_account,
        )
        .context("Create failed"),
        Commands::Delete {
            id,
            collection,
            project_id,
            service_account,
        } => visit::delete(id, collection, project_id, service_account).context("Delete failed"),
    }
}
