//! Delimited-text ingest pipeline
//!
//! Lines of CSV/TSV text in, `ImportOutcome` out. Delimiter and header row
//! are detected heuristically unless forced; rows run through the row
//! normalizer as a fold so grouped rows inherit their date.

use tracing::debug;

use super::locale::{cell_matches_field, looks_like_header, normalize_header, ColumnField};
use super::row::{normalize_row, ColumnMap, RowAccumulator};
use super::{CsvMetadata, Delimiter, ImportOutcome, ParseContext};
use crate::domain::result::{Error, Result};

/// Tokenize one line with the configured delimiter. Standard quoting rules
/// apply; each cell is trimmed.
fn split_cells(line: &str, delimiter: Delimiter) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(|field| field.trim().to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Score each candidate by the mean field count over the first 8 lines
/// (single-field parses carry no signal and are ignored). Strictly-highest
/// wins; semicolon when nothing splits.
fn detect_delimiter(lines: &[&str]) -> Delimiter {
    let mut best = Delimiter::Semicolon;
    let mut best_score = -1.0f64;

    for candidate in [Delimiter::Comma, Delimiter::Semicolon, Delimiter::Tab] {
        let lengths: Vec<usize> = lines
            .iter()
            .take(8)
            .map(|line| split_cells(line, candidate).len())
            .filter(|len| *len > 1)
            .collect();
        if lengths.is_empty() {
            continue;
        }

        let score = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }

    best
}

/// Walk header cells left to right; each cell claims the first still-open
/// field its keywords match. Unclaimed required fields fall back to the
/// conventional positions.
fn resolve_column_map(header_cells: &[String]) -> ColumnMap {
    let mut date = None;
    let mut patient_name = None;
    let mut amount = None;
    let mut percent_or_income = None;
    let mut procedure_name = None;
    let mut notes = None;

    for (index, raw_cell) in header_cells.iter().enumerate() {
        let cell = normalize_header(raw_cell);
        if cell.is_empty() {
            continue;
        }

        if date.is_none() && cell_matches_field(&cell, ColumnField::Date) {
            date = Some(index);
            continue;
        }
        if patient_name.is_none() && cell_matches_field(&cell, ColumnField::PatientName) {
            patient_name = Some(index);
            continue;
        }
        if amount.is_none() && cell_matches_field(&cell, ColumnField::Amount) {
            amount = Some(index);
            continue;
        }
        if percent_or_income.is_none() && cell_matches_field(&cell, ColumnField::PercentOrIncome) {
            percent_or_income = Some(index);
            continue;
        }
        if procedure_name.is_none() && cell_matches_field(&cell, ColumnField::ProcedureName) {
            procedure_name = Some(index);
            continue;
        }
        if notes.is_none() && cell_matches_field(&cell, ColumnField::Notes) {
            notes = Some(index);
        }
    }

    ColumnMap {
        date: date.unwrap_or(0),
        patient_name: patient_name.unwrap_or(1),
        amount: amount.unwrap_or(2),
        percent_or_income: percent_or_income.unwrap_or(3),
        procedure_name,
        notes,
    }
}

/// Parse delimited text into drafts and warnings.
///
/// Line numbers in warnings are 1-based positions after blank lines are
/// dropped, so they match what a spreadsheet user sees in a trimmed export.
pub fn parse_tabular(
    raw_text: &str,
    ctx: &ParseContext,
    forced_delimiter: Option<Delimiter>,
) -> Result<ImportOutcome> {
    let text = raw_text.strip_prefix('\u{feff}').unwrap_or(raw_text);
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(Error::input("input file is empty"));
    }

    let delimiter = forced_delimiter.unwrap_or_else(|| detect_delimiter(&lines));
    let parsed_lines: Vec<Vec<String>> = lines
        .iter()
        .map(|line| split_cells(line, delimiter))
        .collect();

    let has_header = looks_like_header(&parsed_lines[0]);
    let columns = if has_header {
        resolve_column_map(&parsed_lines[0])
    } else {
        ColumnMap::default()
    };
    let start_index = if has_header { 1 } else { 0 };
    debug!(
        "tabular input: {} lines, delimiter {}, header {}",
        lines.len(),
        delimiter.name(),
        if has_header { "yes" } else { "no" }
    );

    let acc = parsed_lines
        .iter()
        .enumerate()
        .skip(start_index)
        .fold(RowAccumulator::new(), |acc, (index, cells)| {
            let (outcome, next_date) = normalize_row(cells, index + 1, &columns, ctx, acc.current_date);
            acc.absorb(outcome, next_date)
        });

    Ok(ImportOutcome {
        drafts: acc.drafts,
        warnings: acc.warnings,
        csv: Some(CsvMetadata {
            delimiter,
            has_header,
        }),
    })
}
