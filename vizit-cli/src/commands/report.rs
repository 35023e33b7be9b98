//! Report command - monthly summary, trend, top days and the ledger

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::ValueEnum;
use colored::Colorize;
use rust_decimal::Decimal;

use vizit_core::analytics::{self, VisitsSort};
use vizit_core::services::VisitsService;

use super::{build_store, load_config};
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    DateDesc,
    IncomeDesc,
    AmountDesc,
    PatientAsc,
}

impl SortArg {
    fn as_sort(self) -> VisitsSort {
        match self {
            SortArg::DateDesc => VisitsSort::DateDesc,
            SortArg::IncomeDesc => VisitsSort::IncomeDesc,
            SortArg::AmountDesc => VisitsSort::AmountDesc,
            SortArg::PatientAsc => VisitsSort::PatientAsc,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    uid: Option<String>,
    month: Option<String>,
    search: Option<String>,
    sort: SortArg,
    collection: Option<String>,
    project_id: Option<String>,
    service_account: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;

    let owner_uid = match uid.or_else(|| config.default_uid.clone()) {
        Some(uid) if !uid.trim().is_empty() => uid.trim().to_string(),
        _ => bail!("Provide --uid or set defaultUid in settings.json"),
    };
    let month = month.unwrap_or_else(analytics::current_month);

    let store = Arc::new(build_store(
        project_id.as_deref(),
        collection.as_deref(),
        service_account.as_deref(),
        &config,
    )?);
    let service = VisitsService::new(store);

    let visits = service.visits_for_month(&owner_uid, &month)?;

    // Previous month's income feeds the trend; a malformed month falls
    // back onto itself and skips the extra query.
    let previous_month = analytics::add_months(&month, -1, &month);
    let previous_income = if previous_month == month {
        None
    } else {
        let previous = service.visits_for_month(&owner_uid, &previous_month)?;
        if previous.is_empty() {
            None
        } else {
            Some(previous.iter().map(|visit| visit.doctor_income).sum::<Decimal>())
        }
    };

    let vm = analytics::build_dashboard_vm(visits);

    let label = analytics::month_label(&month);
    let title = if label.is_empty() { month.clone() } else { label };
    println!("{}", title.bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Visits", &vm.summary.total_visits.to_string()]);
    table.add_row(vec!["Unique patients", &vm.summary.unique_patients.to_string()]);
    table.add_row(vec!["Total amount", &output::format_uah(vm.summary.total_amount)]);
    table.add_row(vec!["Doctor income", &output::format_uah(vm.summary.total_income)]);
    table.add_row(vec!["Average check", &output::format_uah(vm.summary.average_check)]);
    table.add_row(vec!["Average percent", &format!("{}%", vm.summary.average_percent)]);
    println!("{}", table);

    if let Some(trend) = analytics::trend_percent(vm.summary.total_income, previous_income) {
        let sign = if trend > 0 { "+" } else { "" };
        println!("Income trend vs previous month: {}{}%", sign, trend);
    }

    if !vm.top_days.is_empty() {
        println!();
        println!("{}", "Top days".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Date", "Visits", "Income"]);
        for day in &vm.top_days {
            table.add_row(vec![
                day.date.to_string(),
                day.visits.to_string(),
                output::format_uah(day.income),
            ]);
        }
        println!("{}", table);
    }

    println!();
    if vm.visits.is_empty() {
        output::info("No visits this month.");
        return Ok(());
    }

    let query = search.as_deref().unwrap_or("");
    let ledger = analytics::sort_visits(&analytics::filter_visits(&vm.visits, query), sort.as_sort());
    if ledger.is_empty() {
        output::info("No visits match the search.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Date", "Patient", "Procedure", "Amount", "%", "Income", "Notes"]);
    for visit in &ledger {
        table.add_row(vec![
            visit.visit_date.to_string(),
            visit.patient_name.clone(),
            visit.procedure_name.clone(),
            visit.amount.to_string(),
            visit.percent.to_string(),
            visit.doctor_income.to_string(),
            visit.notes.clone(),
        ]);
    }
    println!("{}", table);

    if !query.is_empty() {
        println!("{} of {} visits match the search.", ledger.len(), vm.visits.len());
    }

    Ok(())
}
