//! Migrate-owners command - backfill owner uids across the collection

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use colored::Colorize;

use vizit_core::services::{MigrationOptions, MigrationService, OwnerMap};

use super::{build_store, load_config};
use crate::output;

#[allow(clippy::too_many_arguments)]
pub fn run(
    apply: bool,
    collection: Option<String>,
    project_id: Option<String>,
    service_account: Option<PathBuf>,
    all_to_uid: Option<String>,
    map_file: Option<PathBuf>,
    page_size: usize,
    limit: usize,
) -> Result<()> {
    let all_to_uid = all_to_uid
        .as_deref()
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(str::to_string);

    if all_to_uid.is_none() && map_file.is_none() {
        bail!("Provide either --all-to-uid or --map-file.");
    }

    let map = match &map_file {
        Some(path) => Some(OwnerMap::load(path)?),
        None => None,
    };

    let config = load_config()?;
    let collection_name = collection
        .as_deref()
        .unwrap_or_else(|| config.collection())
        .to_string();

    let store = Arc::new(build_store(
        project_id.as_deref(),
        Some(&collection_name),
        service_account.as_deref(),
        &config,
    )?);
    let service = MigrationService::new(store);

    let summary = service.run(&MigrationOptions {
        apply,
        all_to_uid,
        map,
        page_size,
        limit,
    })?;

    println!("{}", "Migration summary".bold());
    println!("Collection: {}", collection_name);
    println!("Mode: {}", if apply { "APPLY" } else { "DRY-RUN" });
    println!("Scanned docs: {}", summary.scanned);
    println!("Already owned: {}", summary.already_owned);
    println!("Ownerless docs: {}", summary.ownerless);
    println!("Assignable docs: {}", summary.assigned);
    println!("Skipped (no uid mapping): {}", summary.skipped_no_uid);
    println!("Updated docs: {}", summary.updated);

    if !apply {
        output::warning("No changes were written. Re-run with --apply to persist updates.");
    }

    Ok(())
}
