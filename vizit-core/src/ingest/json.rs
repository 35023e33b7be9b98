//! JSON ingest pipeline
//!
//! Accepts a bare array of row objects or `{"visits": [...]}`, the shape the
//! app's export produces. Rows reuse the tabular field helpers; warnings say
//! `Row N` because JSON input has no meaningful line numbers.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use super::fields::{
    clean_patient_name, income_from, parse_date, parse_date_time, parse_number, pick_procedure,
};
use super::{ImportOutcome, ParseContext};
use crate::domain::result::{Error, Result};
use crate::domain::{round2, VisitDraft};

/// Text of a JSON field: strings pass through, numbers and booleans are
/// stringified, everything else is empty.
fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

/// Numeric value of a JSON field. Native numbers convert directly so large
/// values do not take the lossy text route; strings go through the usual
/// cleanup.
fn value_number(value: Option<&Value>) -> Option<Decimal> {
    match value {
        Some(Value::Number(number)) => {
            if let Some(integer) = number.as_i64() {
                Some(Decimal::from(integer))
            } else {
                number.as_f64().and_then(Decimal::from_f64)
            }
        }
        Some(Value::String(text)) => parse_number(text),
        _ => None,
    }
}

/// Parse JSON text into drafts and warnings.
pub fn parse_json(raw_text: &str, ctx: &ParseContext) -> Result<ImportOutcome> {
    let text = raw_text.strip_prefix('\u{feff}').unwrap_or(raw_text).trim();
    let root: Value = serde_json::from_str(text)?;

    let rows = match &root {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => match map.get("visits") {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => {
                return Err(Error::input(
                    "JSON root must be an array, or an object with \"visits\" array.",
                ))
            }
        },
        _ => {
            return Err(Error::input(
                "JSON root must be an array, or an object with \"visits\" array.",
            ))
        }
    };

    let mut drafts = Vec::new();
    let mut warnings = Vec::new();

    for (index, value) in rows.iter().enumerate() {
        let row_number = index + 1;
        let row = match value.as_object() {
            Some(map) => map,
            None => {
                warnings.push(format!("Row {}: invalid object -> skipped.", row_number));
                continue;
            }
        };

        let override_uid = ctx
            .owner_uid
            .as_deref()
            .map(str::trim)
            .filter(|uid| !uid.is_empty());
        let row_uid = value_text(row.get("ownerUid"));
        let row_uid = row_uid.trim();
        let owner_uid = match override_uid.or_else(|| (!row_uid.is_empty()).then_some(row_uid)) {
            Some(uid) => uid.to_string(),
            None => {
                warnings.push(format!(
                    "Row {}: missing ownerUid (and no --uid override) -> skipped.",
                    row_number
                ));
                continue;
            }
        };

        let patient_name = clean_patient_name(&value_text(row.get("patientName")));
        if patient_name.is_empty() {
            warnings.push(format!("Row {}: empty patientName -> skipped.", row_number));
            continue;
        }

        let raw_date = value_text(row.get("visitDate"));
        let visit_date = match parse_date(&raw_date, ctx.default_year) {
            Some(date) => date,
            None => {
                warnings.push(format!(
                    "Row {}: invalid visitDate \"{}\" -> skipped.",
                    row_number, raw_date
                ));
                continue;
            }
        };

        let amount = match value_number(row.get("amount")) {
            Some(amount) if amount > Decimal::ZERO => amount,
            _ => {
                warnings.push(format!(
                    "Row {}: invalid amount \"{}\" -> skipped.",
                    row_number,
                    value_text(row.get("amount"))
                ));
                continue;
            }
        };

        let raw_percent = value_number(row.get("percent"));
        let raw_income = value_number(row.get("doctorIncome"));
        let percent_value = match (raw_percent, raw_income) {
            (Some(percent), _) => Some(percent),
            (None, Some(income)) => income
                .checked_div(amount)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map(round2),
            (None, None) => {
                warnings.push(format!(
                    "Row {}: both percent and doctorIncome are missing -> skipped.",
                    row_number
                ));
                continue;
            }
        };

        // a percent given directly is range-checked as written, not rounded
        let percent = match percent_value {
            Some(percent) if percent >= Decimal::ZERO && percent <= Decimal::ONE_HUNDRED => percent,
            Some(percent) => {
                warnings.push(format!(
                    "Row {}: percent \"{}\" out of range -> skipped.",
                    row_number, percent
                ));
                continue;
            }
            None => {
                warnings.push(format!(
                    "Row {}: percent \"{}\" out of range -> skipped.",
                    row_number,
                    value_text(row.get("doctorIncome"))
                ));
                continue;
            }
        };

        let doctor_income = match raw_income {
            Some(income) => round2(income),
            None => match income_from(amount, percent) {
                Some(income) => income,
                None => {
                    warnings.push(format!(
                        "Row {}: invalid amount \"{}\" -> skipped.",
                        row_number,
                        value_text(row.get("amount"))
                    ));
                    continue;
                }
            },
        };

        let raw_procedure = value_text(row.get("procedureName"));
        let procedure_name =
            pick_procedure(&patient_name, raw_procedure.trim(), &ctx.default_procedure);
        let notes = value_text(row.get("notes")).trim().to_string();

        drafts.push(VisitDraft {
            owner_uid,
            visit_date,
            patient_name,
            procedure_name,
            amount: round2(amount),
            percent: round2(percent),
            doctor_income,
            notes,
            created_at: parse_date_time(&value_text(row.get("createdAt"))),
            updated_at: parse_date_time(&value_text(row.get("updatedAt"))),
        });
    }

    Ok(ImportOutcome {
        drafts,
        warnings,
        csv: None,
    })
}
