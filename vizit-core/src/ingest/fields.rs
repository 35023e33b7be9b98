//! Field-level parsers shared by both ingest pipelines
//!
//! Every function here is total: malformed input yields `None` (or an empty
//! string), never an error. Row-level policy - which failures warn, which
//! skip silently - lives in the row normalizer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;

use super::locale;
use crate::domain::round2;

/// Procedure recorded when a patient name hints at surgery.
pub const SURGERY_PROCEDURE: &str = "Операція";

/// Parse a localized decimal: non-breaking and interior spaces dropped,
/// first comma treated as the decimal point, currency symbols stripped.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let despaced: String = raw
        .replace('\u{a0}', " ")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let normalized: String = despaced
        .replacen(',', ".", 1)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if normalized.is_empty() {
        return None;
    }

    normalized.parse().ok()
}

/// Parse a visit date in one of three shapes:
/// ISO `YYYY-MM-DD`, numeric `D.M[.Y]` (also `/` and `-` separators,
/// two-digit years meaning `20YY`, missing years meaning `default_year`),
/// or `D <month name> [YYYY]` with month names resolved through the locale
/// tables. Dates that do not exist on the calendar are rejected.
pub fn parse_date(raw: &str, default_year: i32) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let iso_re = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    if iso_re.is_match(value) {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
    }

    let numeric_re = Regex::new(r"^(\d{1,2})[./-](\d{1,2})(?:[./-](\d{2,4}))?$").unwrap();
    if let Some(caps) = numeric_re.captures(value) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = match caps.get(3) {
            Some(m) if m.as_str().len() == 2 => 2000 + m.as_str().parse::<i32>().ok()?,
            Some(m) => m.as_str().parse::<i32>().ok()?,
            None => default_year,
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let token_re =
        Regex::new(r"(?i)^(\d{1,2})\s*[-\s]\s*([a-zа-яіїєґ.]+)(?:\s*[-\s,]?\s*(\d{4}))?$").unwrap();
    if let Some(caps) = token_re.captures(value) {
        let day: u32 = caps[1].parse().ok()?;
        let month = locale::resolve_month(&caps[2])?;
        let year = match caps.get(3) {
            Some(m) => m.as_str().parse::<i32>().ok()?,
            None => default_year,
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

/// Parse an optional record timestamp (structured imports carry these).
/// Accepts RFC 3339, `Y-m-dTH:M:S`, `Y-m-d H:M:S` and bare dates; anything
/// else resolves to `None` so the store assigns its own write time.
pub fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Interpret the %/income cell. Values up to 100 are a percentage; larger
/// values are an absolute income amount and the percentage is derived from
/// the visit amount. The caller range-checks the result so its warning can
/// cite the derived value.
pub fn derive_percent(amount: Decimal, percent_or_income: Decimal) -> Option<Decimal> {
    if percent_or_income > Decimal::ONE_HUNDRED {
        let ratio = percent_or_income.checked_div(amount)?;
        Some(round2(ratio.checked_mul(Decimal::ONE_HUNDRED)?))
    } else {
        Some(round2(percent_or_income))
    }
}

/// Doctor income for a visit: `amount * percent / 100`, rounded.
pub fn income_from(amount: Decimal, percent: Decimal) -> Option<Decimal> {
    let product = amount.checked_mul(percent)?;
    Some(round2(product.checked_div(Decimal::ONE_HUNDRED)?))
}

/// Drop parenthetical surgery annotations from a patient name and collapse
/// whitespace: `"Коротін Д.С. (операція септопластика)"` -> `"Коротін Д.С."`.
pub fn clean_patient_name(raw: &str) -> String {
    let paren_re = Regex::new(&format!(
        r"(?i)\s*\([^)]*(?:{})[^)]*\)\s*",
        locale::surgery_pattern()
    ))
    .unwrap();
    let stripped = paren_re.replace_all(raw, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pick the procedure name: an explicit cell value wins, then a surgery
/// hint in the (already cleaned) patient name, then the configured fallback.
pub fn pick_procedure(patient_name: &str, raw_procedure: &str, fallback: &str) -> String {
    let procedure = raw_procedure.trim();
    if !procedure.is_empty() {
        return procedure.to_string();
    }

    let surgery_re = Regex::new(&format!(r"(?i)\b(?:{})", locale::surgery_pattern())).unwrap();
    if surgery_re.is_match(patient_name) {
        return SURGERY_PROCEDURE.to_string();
    }

    fallback.to_string()
}
