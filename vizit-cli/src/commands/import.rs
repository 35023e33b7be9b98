//! Import command - load a CSV/TSV or JSON visit export into Firestore

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::ValueEnum;
use colored::Colorize;

use vizit_core::ingest::{self, Delimiter, InputFormat, ParseContext};
use vizit_core::services::{ImportService, ImportSummary};

use super::{build_store, load_config};
use crate::output;

/// Warnings shown on the console before the rest is elided.
const MAX_WARNINGS_SHOWN: usize = 20;

/// Parsed rows shown in the preview table.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Auto,
    Csv,
    Json,
}

impl FormatArg {
    fn as_format(self) -> Option<InputFormat> {
        match self {
            FormatArg::Auto => None,
            FormatArg::Csv => Some(InputFormat::Csv),
            FormatArg::Json => Some(InputFormat::Json),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DelimiterArg {
    Auto,
    Comma,
    Semicolon,
    Tab,
}

impl DelimiterArg {
    fn as_delimiter(self) -> Option<Delimiter> {
        match self {
            DelimiterArg::Auto => None,
            DelimiterArg::Comma => Some(Delimiter::Comma),
            DelimiterArg::Semicolon => Some(Delimiter::Semicolon),
            DelimiterArg::Tab => Some(Delimiter::Tab),
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    uid: Option<String>,
    format: FormatArg,
    apply: bool,
    collection: Option<String>,
    project_id: Option<String>,
    service_account: Option<PathBuf>,
    delimiter: DelimiterArg,
    default_procedure: Option<String>,
    year: Option<i32>,
) -> Result<()> {
    let config = load_config()?;

    let raw_text = read_input(&file)?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    let input_format = ingest::detect_input_format(&file_name, &raw_text, format.as_format());
    if input_format == InputFormat::Csv && uid.as_deref().unwrap_or("").is_empty() {
        bail!("For CSV input provide --uid (JSON rows can carry ownerUid directly).");
    }

    let default_year = year.unwrap_or_else(|| chrono::Local::now().year());
    let mut ctx = ParseContext::new(default_year).with_procedure(
        default_procedure
            .as_deref()
            .unwrap_or_else(|| config.default_procedure()),
    );
    if let Some(uid) = &uid {
        ctx = ctx.with_owner(uid.clone());
    }

    let (_, outcome) = ingest::parse_input(
        &file_name,
        &raw_text,
        &ctx,
        Some(input_format),
        delimiter.as_delimiter(),
    )?;

    let summary = ImportSummary::from_outcome(&outcome);
    let collection_name = collection.as_deref().unwrap_or_else(|| config.collection());

    println!("{}", "Import summary".bold());
    println!("Mode: {}", if apply { "APPLY" } else { "DRY-RUN" });
    println!("File: {}", file.display());
    println!("Input format: {}", input_format.name());
    if let Some(csv) = &outcome.csv {
        println!("Delimiter: {}", csv.delimiter.name());
        println!("Header detected: {}", if csv.has_header { "yes" } else { "no" });
    }
    if let Some(uid) = &uid {
        println!("UID override: {}", uid);
    }
    println!(
        "Target UIDs: {}",
        if summary.target_uids.is_empty() {
            "(none)".to_string()
        } else {
            summary.target_uids.join(", ")
        }
    );
    println!("Collection: {}", collection_name);
    println!("Parsed rows: {}", summary.parsed_rows);
    println!("Total amount: {}", summary.total_amount);
    println!("Total doctor income: {}", summary.total_income);

    if !summary.warnings.is_empty() {
        println!("{}", format!("Warnings: {}", summary.warnings.len()).yellow());
        for warning in summary.warnings.iter().take(MAX_WARNINGS_SHOWN) {
            println!("  - {}", warning);
        }
        if summary.warnings.len() > MAX_WARNINGS_SHOWN {
            println!(
                "  ...and {} more warnings.",
                summary.warnings.len() - MAX_WARNINGS_SHOWN
            );
        }
    }

    if !outcome.drafts.is_empty() {
        println!();
        println!("Preview (first {} rows):", PREVIEW_ROWS);
        let mut table = output::create_table();
        table.set_header(vec!["date", "patient", "amount", "percent", "income", "procedure"]);
        for draft in outcome.drafts.iter().take(PREVIEW_ROWS) {
            table.add_row(vec![
                draft.visit_date.to_string(),
                draft.patient_name.clone(),
                draft.amount.to_string(),
                draft.percent.to_string(),
                draft.doctor_income.to_string(),
                draft.procedure_name.clone(),
            ]);
        }
        println!("{}", table);
    }

    if !apply {
        println!();
        output::warning("No changes were written. Re-run with --apply to import.");
        return Ok(());
    }

    if outcome.drafts.is_empty() {
        println!();
        println!("Nothing to import.");
        return Ok(());
    }

    // Credentials are only needed once there is something to write.
    let store = Arc::new(build_store(
        project_id.as_deref(),
        Some(collection_name),
        service_account.as_deref(),
        &config,
    )?);
    let service = ImportService::new(store);
    let created = service.write_drafts(&outcome.drafts)?;

    println!();
    output::success(&format!("Imported documents: {}", created));
    Ok(())
}

/// Read the input file, or piped stdin when the path is `-`.
fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        if atty::is(atty::Stream::Stdin) {
            bail!("Reading from \"-\" requires piped input on stdin");
        }
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Cannot read stdin")?;
        return Ok(raw);
    }

    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read file {}: {}", path.display(), e))
}
