//! Row normalizer for the tabular pipeline
//!
//! One input row becomes either a draft, a skip-with-warning, or a silent
//! skip (noise rows). Date carry-forward for spreadsheet-style grouped rows
//! is threaded through `RowAccumulator` by an explicit fold rather than
//! mutable loop state.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::fields::{
    clean_patient_name, derive_percent, income_from, parse_date, parse_number, pick_procedure,
};
use super::locale::{is_meta_row_name, looks_like_header};
use super::ParseContext;
use crate::domain::{round2, VisitDraft};

/// Resolved column indices for one input file. Optional columns stay `None`
/// when no header claimed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub patient_name: usize,
    pub amount: usize,
    pub percent_or_income: usize,
    pub procedure_name: Option<usize>,
    pub notes: Option<usize>,
}

impl Default for ColumnMap {
    /// Positional fallback for headerless files.
    fn default() -> Self {
        Self {
            date: 0,
            patient_name: 1,
            amount: 2,
            percent_or_income: 3,
            procedure_name: None,
            notes: None,
        }
    }
}

/// What one row contributed.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Draft(VisitDraft),
    Skip(String),
    /// Header repeats, meta/total rows and blank names vanish without a
    /// warning.
    Silent,
}

/// Fold state for the row loop.
#[derive(Debug, Default)]
pub struct RowAccumulator {
    pub drafts: Vec<VisitDraft>,
    pub warnings: Vec<String>,
    pub current_date: Option<NaiveDate>,
}

impl RowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one row's outcome and the carried date it leaves behind.
    pub fn absorb(mut self, outcome: RowOutcome, next_date: Option<NaiveDate>) -> Self {
        self.current_date = next_date;
        match outcome {
            RowOutcome::Draft(draft) => self.drafts.push(draft),
            RowOutcome::Skip(warning) => self.warnings.push(warning),
            RowOutcome::Silent => {}
        }
        self
    }
}

fn cell<'a>(cells: &'a [String], index: usize) -> &'a str {
    cells.get(index).map(|s| s.as_str()).unwrap_or("").trim()
}

/// Normalize one tabular row. Returns the outcome plus the date the next
/// row should inherit; a failed date parse leaves the inherited date alone.
pub fn normalize_row(
    cells: &[String],
    line_number: usize,
    columns: &ColumnMap,
    ctx: &ParseContext,
    current_date: Option<NaiveDate>,
) -> (RowOutcome, Option<NaiveDate>) {
    if looks_like_header(cells) {
        return (RowOutcome::Silent, current_date);
    }

    let raw_name = cell(cells, columns.patient_name);
    if raw_name.is_empty() {
        return (RowOutcome::Silent, current_date);
    }

    if is_meta_row_name(raw_name) {
        return (RowOutcome::Silent, current_date);
    }

    let mut carried = current_date;
    let raw_date = cell(cells, columns.date);
    if !raw_date.is_empty() {
        match parse_date(raw_date, ctx.default_year) {
            Some(parsed) => carried = Some(parsed),
            None => {
                return (
                    RowOutcome::Skip(format!(
                        "Line {}: invalid date \"{}\" -> skipped.",
                        line_number, raw_date
                    )),
                    current_date,
                );
            }
        }
    }

    let visit_date = match carried {
        Some(date) => date,
        None => {
            return (
                RowOutcome::Skip(format!(
                    "Line {}: missing date (and no previous date to reuse) -> skipped.",
                    line_number
                )),
                carried,
            );
        }
    };

    let raw_amount = cell(cells, columns.amount);
    let amount = match parse_number(raw_amount) {
        Some(value) if value > Decimal::ZERO => value,
        _ => {
            return (
                RowOutcome::Skip(format!(
                    "Line {}: invalid amount \"{}\" -> skipped.",
                    line_number, raw_amount
                )),
                carried,
            );
        }
    };

    let raw_percent_or_income = cell(cells, columns.percent_or_income);
    let percent_or_income = match parse_number(raw_percent_or_income) {
        Some(value) if value >= Decimal::ZERO => value,
        _ => {
            return (
                RowOutcome::Skip(format!(
                    "Line {}: invalid %/income \"{}\" -> skipped.",
                    line_number, raw_percent_or_income
                )),
                carried,
            );
        }
    };

    let percent = match derive_percent(amount, percent_or_income) {
        Some(value) if value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED => value,
        Some(out_of_range) => {
            return (
                RowOutcome::Skip(format!(
                    "Line {}: derived percent \"{}\" out of range -> skipped.",
                    line_number, out_of_range
                )),
                carried,
            );
        }
        None => {
            return (
                RowOutcome::Skip(format!(
                    "Line {}: derived percent \"{}\" out of range -> skipped.",
                    line_number, percent_or_income
                )),
                carried,
            );
        }
    };

    let patient_name = clean_patient_name(raw_name);
    if patient_name.is_empty() {
        return (
            RowOutcome::Skip(format!(
                "Line {}: empty patient name after normalization -> skipped.",
                line_number
            )),
            carried,
        );
    }

    let doctor_income = match income_from(amount, percent) {
        Some(value) => value,
        None => {
            return (
                RowOutcome::Skip(format!(
                    "Line {}: invalid amount \"{}\" -> skipped.",
                    line_number, raw_amount
                )),
                carried,
            );
        }
    };

    let raw_procedure = columns
        .procedure_name
        .map(|index| cell(cells, index))
        .unwrap_or("");
    let procedure_name = pick_procedure(&patient_name, raw_procedure, &ctx.default_procedure);
    let notes = columns.notes.map(|index| cell(cells, index)).unwrap_or("");

    let draft = VisitDraft {
        owner_uid: ctx.owner_uid.clone().unwrap_or_default(),
        visit_date,
        patient_name,
        procedure_name,
        amount: round2(amount),
        percent,
        doctor_income,
        notes: notes.to_string(),
        created_at: None,
        updated_at: None,
    };

    (RowOutcome::Draft(draft), carried)
}
