//! Add and delete commands - single-visit maintenance on the ledger

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use rust_decimal::Decimal;

use vizit_core::ingest::fields;
use vizit_core::services::{prepare_draft, VisitsService};
use vizit_core::VisitDraft;

use super::{build_store, load_config};
use crate::output;

#[allow(clippy::too_many_arguments)]
pub fn add(
    uid: Option<String>,
    patient: String,
    amount: Decimal,
    date: Option<String>,
    procedure: Option<String>,
    percent: Decimal,
    notes: Option<String>,
    collection: Option<String>,
    project_id: Option<String>,
    service_account: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;

    let owner_uid = match uid.or_else(|| config.default_uid.clone()) {
        Some(uid) if !uid.trim().is_empty() => uid.trim().to_string(),
        _ => bail!("Provide --uid or set defaultUid in settings.json"),
    };

    let today = Local::now().date_naive();
    let visit_date = match date.as_deref() {
        Some(raw) => fields::parse_date(raw, today.year())
            .with_context(|| format!("Invalid visit date \"{}\"", raw))?,
        None => today,
    };

    let draft = VisitDraft {
        owner_uid,
        visit_date,
        patient_name: patient,
        procedure_name: procedure.unwrap_or_else(|| config.default_procedure().to_string()),
        amount,
        percent,
        // Recomputed from amount and percent before the write.
        doctor_income: Decimal::ZERO,
        notes: notes.unwrap_or_default(),
        created_at: None,
        updated_at: None,
    };
    let prepared = prepare_draft(&draft);

    let store = Arc::new(build_store(
        project_id.as_deref(),
        collection.as_deref(),
        service_account.as_deref(),
        &config,
    )?);
    let service = VisitsService::new(store);
    let id = service.create(&draft)?;

    output::success(&format!("Created visit {}", id));
    println!("  Date: {}", prepared.visit_date);
    println!("  Patient: {}", prepared.patient_name);
    println!("  Procedure: {}", prepared.procedure_name);
    println!("  Amount: {}", output::format_uah(prepared.amount));
    println!("  Percent: {}%", prepared.percent);
    println!("  Doctor income: {}", output::format_uah(prepared.doctor_income));
    Ok(())
}

pub fn delete(
    id: String,
    collection: Option<String>,
    project_id: Option<String>,
    service_account: Option<PathBuf>,
) -> Result<()> {
    let id = id.trim().to_string();
    if id.is_empty() {
        bail!("Document id cannot be empty");
    }

    let config = load_config()?;
    let store = Arc::new(build_store(
        project_id.as_deref(),
        collection.as_deref(),
        service_account.as_deref(),
        &config,
    )?);
    let service = VisitsService::new(store);
    service.delete(&id)?;

    output::success(&format!("Deleted visit {}", id));
    Ok(())
}
