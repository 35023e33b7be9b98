//! Pure aggregation over persisted visits.
//!
//! Everything here is synchronous and side-effect free: callers pass a slice
//! of visits and get a new value back. The dashboard view model, search,
//! sorting and month arithmetic all live in this module.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{round2, Visit};

/// One calendar day's share of the month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyInsight {
    pub date: NaiveDate,
    pub visits: usize,
    pub income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySummary {
    pub total_amount: Decimal,
    pub total_income: Decimal,
    pub total_visits: usize,
    pub unique_patients: usize,
    pub average_check: Decimal,
    pub average_percent: Decimal,
}

/// Everything the dashboard needs for one month of visits.
#[derive(Debug, Clone)]
pub struct DashboardVm {
    pub visits: Vec<Visit>,
    pub summary: MonthlySummary,
    pub top_days: Vec<DailyInsight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitsSort {
    DateDesc,
    IncomeDesc,
    AmountDesc,
    PatientAsc,
}

pub fn build_dashboard_vm(visits: Vec<Visit>) -> DashboardVm {
    let total_amount: Decimal = visits.iter().map(|visit| visit.amount).sum();
    let total_income: Decimal = visits.iter().map(|visit| visit.doctor_income).sum();
    let total_percent: Decimal = visits.iter().map(|visit| visit.percent).sum();
    let total_visits = visits.len();

    let (average_check, average_percent) = if total_visits == 0 {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let count = Decimal::from(total_visits);
        (
            total_amount
                .checked_div(count)
                .map(round2)
                .unwrap_or(Decimal::ZERO),
            total_percent
                .checked_div(count)
                .map(round2)
                .unwrap_or(Decimal::ZERO),
        )
    };

    let summary = MonthlySummary {
        total_amount,
        total_income,
        total_visits,
        unique_patients: unique_patients(&visits),
        average_check,
        average_percent,
    };
    let top_days = top_days(&visits);

    DashboardVm {
        visits,
        summary,
        top_days,
    }
}

fn unique_patients(visits: &[Visit]) -> usize {
    visits
        .iter()
        .map(|visit| visit.patient_name.trim().to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

/// Group visits by day, sum income, keep the five best days. Days with equal
/// income keep their first-seen order.
pub fn top_days(visits: &[Visit]) -> Vec<DailyInsight> {
    let mut grouped: Vec<DailyInsight> = Vec::new();

    for visit in visits {
        match grouped.iter_mut().find(|day| day.date == visit.visit_date) {
            Some(day) => {
                day.visits += 1;
                day.income += visit.doctor_income;
            }
            None => grouped.push(DailyInsight {
                date: visit.visit_date,
                visits: 1,
                income: visit.doctor_income,
            }),
        }
    }

    grouped.sort_by(|left, right| right.income.cmp(&left.income));
    grouped.truncate(5);
    grouped
}

/// Month-over-month change in percent, rounded to a whole number. `None`
/// when there is no previous value to compare against or it is zero.
pub fn trend_percent(current: Decimal, previous: Option<Decimal>) -> Option<i32> {
    let previous = previous.filter(|value| !value.is_zero())?;
    let ratio = current.checked_sub(previous)?.checked_div(previous)?;
    ratio
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()
}

/// Case-insensitive substring search over name, procedure, notes and the ISO
/// date. An empty query returns the input unchanged.
pub fn filter_visits(visits: &[Visit], query: &str) -> Vec<Visit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return visits.to_vec();
    }

    visits
        .iter()
        .filter(|visit| {
            let haystack = format!(
                "{} {} {} {}",
                visit.patient_name, visit.procedure_name, visit.notes, visit.visit_date
            )
            .to_lowercase();
            haystack.contains(&needle)
        })
        .cloned()
        .collect()
}

/// Return a sorted copy. All orders are stable; date order additionally
/// breaks ties by most recent creation first, with timestamp-less records
/// last.
pub fn sort_visits(visits: &[Visit], sort: VisitsSort) -> Vec<Visit> {
    let mut next = visits.to_vec();

    match sort {
        VisitsSort::IncomeDesc => {
            next.sort_by(|left, right| right.doctor_income.cmp(&left.doctor_income))
        }
        VisitsSort::AmountDesc => next.sort_by(|left, right| right.amount.cmp(&left.amount)),
        VisitsSort::PatientAsc => {
            next.sort_by(|left, right| compare_patient_names(&left.patient_name, &right.patient_name))
        }
        VisitsSort::DateDesc => next.sort_by(|left, right| {
            right
                .visit_date
                .cmp(&left.visit_date)
                .then_with(|| right.created_at.cmp(&left.created_at))
        }),
    }

    next
}

const UKRAINIAN_ALPHABET: &str = "абвгґдеєжзиіїйклмнопрстуфхцчшщьюя";

/// Collation weight: digits, then Latin, then the Ukrainian alphabet in its
/// dictionary order, then everything else by code point.
fn letter_rank(ch: char) -> (u8, u32) {
    let lower = ch.to_lowercase().next().unwrap_or(ch);
    if lower.is_ascii_digit() {
        return (0, lower as u32);
    }
    if lower.is_ascii_alphabetic() {
        return (1, lower as u32);
    }
    if let Some(position) = UKRAINIAN_ALPHABET.chars().position(|letter| letter == lower) {
        return (2, position as u32);
    }
    (3, lower as u32)
}

fn compare_patient_names(left: &str, right: &str) -> Ordering {
    left.chars().map(letter_rank).cmp(right.chars().map(letter_rank))
}

/// Shift a `YYYY-MM` month by `delta` months with year rollover. Malformed
/// input returns the fallback unchanged.
pub fn add_months(month: &str, delta: i32, fallback: &str) -> String {
    match parse_month(month) {
        Some((year, month_number)) => {
            let total = year * 12 + (month_number - 1) + delta;
            format!("{:04}-{:02}", total.div_euclid(12), total.rem_euclid(12) + 1)
        }
        None => fallback.to_string(),
    }
}

fn parse_month(month: &str) -> Option<(i32, i32)> {
    let re = Regex::new(r"^(\d{4})-(\d{2})$").unwrap();
    let caps = re.captures(month)?;
    let year = caps[1].parse().ok()?;
    let month_number = caps[2].parse().ok()?;
    Some((year, month_number))
}

/// First and last day of a `YYYY-MM` month. Input that does not name a real
/// month falls back to the current one.
pub fn month_bounds(month: &str) -> (NaiveDate, NaiveDate) {
    let parsed = parse_month(month).and_then(|(year, month_number)| {
        let number = u32::try_from(month_number).ok()?;
        NaiveDate::from_ymd_opt(year, number, 1)
    });

    let start = match parsed {
        Some(start) => start,
        None => {
            let today = Local::now().date_naive();
            NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
        }
    };

    (start, last_day_of_month(start))
}

fn last_day_of_month(start: NaiveDate) -> NaiveDate {
    let next_month = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    next_month
        .and_then(|first| first.pred_opt())
        .unwrap_or(start)
}

/// The current calendar month as `YYYY-MM`.
pub fn current_month() -> String {
    let today = Local::now().date_naive();
    format!("{:04}-{:02}", today.year(), today.month())
}

const MONTH_NAMES_UK: [&str; 12] = [
    "січень",
    "лютий",
    "березень",
    "квітень",
    "травень",
    "червень",
    "липень",
    "серпень",
    "вересень",
    "жовтень",
    "листопад",
    "грудень",
];

/// Display label for a `YYYY-MM` month, e.g. `Лютий 2026`. Malformed input
/// yields an empty string.
pub fn month_label(month: &str) -> String {
    let parsed = parse_month(month).filter(|(_, number)| (1..=12).contains(number));
    match parsed {
        Some((year, number)) => {
            let name = MONTH_NAMES_UK[(number - 1) as usize];
            let mut chars = name.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            };
            format!("{} {}", capitalized, year)
        }
        None => String::new(),
    }
}

/// Projected income for a visit entry form. Non-finite inputs yield zero.
pub fn calculate_income(amount: f64, percent: f64) -> Decimal {
    let amount = match Decimal::from_f64(amount) {
        Some(value) => value,
        None => return Decimal::ZERO,
    };
    let percent = match Decimal::from_f64(percent) {
        Some(value) => value,
        None => return Decimal::ZERO,
    };

    amount
        .checked_mul(percent)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
        .map(round2)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn visit(
        name: &str,
        date: &str,
        amount: i64,
        percent: i64,
        income: i64,
        created_minutes: i64,
    ) -> Visit {
        Visit {
            id: format!("visit-{}", created_minutes),
            owner_uid: "uid-1".to_string(),
            visit_date: date.parse().unwrap(),
            patient_name: name.to_string(),
            procedure_name: "Консультація".to_string(),
            amount: Decimal::from(amount),
            percent: Decimal::from(percent),
            doctor_income: Decimal::from(income),
            notes: String::new(),
            created_at: Some(
                Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap()
                    + Duration::minutes(created_minutes),
            ),
            updated_at: None,
        }
    }

    fn sample_month() -> Vec<Visit> {
        vec![
            visit("Коротін Д.С.", "2026-02-19", 1150, 30, 345, 0),
            visit("Іваненко П.П.", "2026-02-20", 2000, 25, 500, 1),
            visit("коротін д.с.", "2026-02-21", 1000, 20, 200, 2),
        ]
    }

    #[test]
    fn test_build_dashboard_vm_summary() {
        let vm = build_dashboard_vm(sample_month());

        assert_eq!(vm.summary.total_amount, Decimal::from(4150));
        assert_eq!(vm.summary.total_income, Decimal::from(1045));
        assert_eq!(vm.summary.total_visits, 3);
        // case-insensitive collapse of the two Коротін spellings
        assert_eq!(vm.summary.unique_patients, 2);
        assert_eq!(
            vm.summary.average_check,
            "1383.33".parse::<Decimal>().unwrap()
        );
        assert_eq!(vm.summary.average_percent, Decimal::from(25));
        assert_eq!(vm.visits.len(), 3);
    }

    #[test]
    fn test_build_dashboard_vm_empty() {
        let vm = build_dashboard_vm(Vec::new());
        assert_eq!(vm.summary.total_visits, 0);
        assert_eq!(vm.summary.average_check, Decimal::ZERO);
        assert_eq!(vm.summary.average_percent, Decimal::ZERO);
        assert!(vm.top_days.is_empty());
    }

    #[test]
    fn test_top_days_ranking() {
        let visits = vec![
            visit("Коротін Д.С.", "2026-02-19", 1150, 30, 345, 0),
            visit("Іваненко П.П.", "2026-02-20", 2000, 25, 500, 1),
            visit("Петренко О.О.", "2026-02-19", 1000, 20, 200, 2),
        ];
        let days = top_days(&visits);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date.to_string(), "2026-02-19");
        assert_eq!(days[0].visits, 2);
        assert_eq!(days[0].income, Decimal::from(545));
        assert_eq!(days[1].income, Decimal::from(500));
    }

    #[test]
    fn test_top_days_tie_keeps_first_seen() {
        let visits = vec![
            visit("Коротін Д.С.", "2026-02-19", 1000, 30, 300, 0),
            visit("Іваненко П.П.", "2026-02-20", 1000, 30, 300, 1),
        ];
        let days = top_days(&visits);
        assert_eq!(days[0].date.to_string(), "2026-02-19");
    }

    #[test]
    fn test_top_days_truncates_to_five() {
        let visits: Vec<Visit> = (1..=7)
            .map(|day| {
                visit(
                    "Коротін Д.С.",
                    &format!("2026-02-{:02}", day),
                    1000,
                    30,
                    300 + day,
                    day,
                )
            })
            .collect();
        let days = top_days(&visits);
        assert_eq!(days.len(), 5);
        assert_eq!(days[0].income, Decimal::from(307));
    }

    #[test]
    fn test_trend_percent() {
        assert_eq!(
            trend_percent(Decimal::from(1100), Some(Decimal::from(1000))),
            Some(10)
        );
        assert_eq!(
            trend_percent(Decimal::from(900), Some(Decimal::from(1000))),
            Some(-10)
        );
        // midpoint rounds away from zero
        assert_eq!(
            trend_percent(Decimal::from(1125), Some(Decimal::from(1000))),
            Some(13)
        );
        assert_eq!(trend_percent(Decimal::from(1100), None), None);
        assert_eq!(trend_percent(Decimal::from(1100), Some(Decimal::ZERO)), None);
    }

    #[test]
    fn test_filter_visits_empty_query_is_noop() {
        let visits = sample_month();
        let filtered = filter_visits(&visits, "");
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[0].patient_name, visits[0].patient_name);

        let filtered = filter_visits(&visits, "   ");
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_filter_visits_matches_notes_and_date() {
        let mut visits = sample_month();
        visits[1].notes = "повторний прийом".to_string();

        let filtered = filter_visits(&visits, "Повторний");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].patient_name, "Іваненко П.П.");

        let filtered = filter_visits(&visits, "2026-02-21");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].patient_name, "коротін д.с.");
    }

    #[test]
    fn test_sort_visits_date_desc_breaks_ties_by_creation() {
        let visits = vec![
            visit("Коротін Д.С.", "2026-02-19", 1150, 30, 345, 0),
            visit("Іваненко П.П.", "2026-02-19", 2000, 25, 500, 5),
            visit("Петренко О.О.", "2026-02-20", 1000, 20, 200, 1),
        ];
        let sorted = sort_visits(&visits, VisitsSort::DateDesc);

        assert_eq!(sorted[0].patient_name, "Петренко О.О.");
        // same date: the more recently created record wins
        assert_eq!(sorted[1].patient_name, "Іваненко П.П.");
        assert_eq!(sorted[2].patient_name, "Коротін Д.С.");
    }

    #[test]
    fn test_sort_visits_missing_created_at_loses_ties() {
        let mut visits = vec![
            visit("Коротін Д.С.", "2026-02-19", 1150, 30, 345, 0),
            visit("Іваненко П.П.", "2026-02-19", 2000, 25, 500, 5),
        ];
        visits[1].created_at = None;

        let sorted = sort_visits(&visits, VisitsSort::DateDesc);
        assert_eq!(sorted[0].patient_name, "Коротін Д.С.");
        assert_eq!(sorted[1].patient_name, "Іваненко П.П.");
    }

    #[test]
    fn test_sort_visits_numeric_orders() {
        let visits = sample_month();

        let by_income = sort_visits(&visits, VisitsSort::IncomeDesc);
        assert_eq!(by_income[0].doctor_income, Decimal::from(500));
        assert_eq!(by_income[2].doctor_income, Decimal::from(200));

        let by_amount = sort_visits(&visits, VisitsSort::AmountDesc);
        assert_eq!(by_amount[0].amount, Decimal::from(2000));
    }

    #[test]
    fn test_sort_visits_patient_collation() {
        let visits = vec![
            visit("Коротін Д.С.", "2026-02-19", 1150, 30, 345, 0),
            visit("Іваненко П.П.", "2026-02-19", 2000, 25, 500, 1),
            visit("Smith J.", "2026-02-19", 900, 30, 270, 2),
            visit("Ґудзенко Л.Л.", "2026-02-19", 800, 30, 240, 3),
        ];
        let sorted = sort_visits(&visits, VisitsSort::PatientAsc);

        // Latin before Cyrillic, then Ukrainian dictionary order with
        // Ґ before І before К
        assert_eq!(sorted[0].patient_name, "Smith J.");
        assert_eq!(sorted[1].patient_name, "Ґудзенко Л.Л.");
        assert_eq!(sorted[2].patient_name, "Іваненко П.П.");
        assert_eq!(sorted[3].patient_name, "Коротін Д.С.");
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let visits = sample_month();
        let _ = sort_visits(&visits, VisitsSort::IncomeDesc);
        assert_eq!(visits[0].patient_name, "Коротін Д.С.");
    }

    #[test]
    fn test_add_months() {
        assert_eq!(add_months("2026-12", 1, "2026-02"), "2027-01");
        assert_eq!(add_months("2026-01", -1, "2026-02"), "2025-12");
        assert_eq!(add_months("2026-02", 25, "2026-02"), "2028-03");
        assert_eq!(add_months("bad", 1, "2026-02"), "2026-02");
        assert_eq!(add_months("2026-2", 1, "2026-02"), "2026-02");
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds("2026-02");
        assert_eq!(start.to_string(), "2026-02-01");
        assert_eq!(end.to_string(), "2026-02-28");

        let (_, end) = month_bounds("2024-02");
        assert_eq!(end.to_string(), "2024-02-29");

        let (_, end) = month_bounds("2026-12");
        assert_eq!(end.to_string(), "2026-12-31");

        // malformed input falls back to the current month
        let (start, end) = month_bounds("not-a-month");
        assert_eq!(start.day(), 1);
        assert!(end >= start);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2026-02"), "Лютий 2026");
        assert_eq!(month_label("2026-11"), "Листопад 2026");
        assert_eq!(month_label("nope"), "");
        assert_eq!(month_label("2026-13"), "");
    }

    #[test]
    fn test_calculate_income() {
        assert_eq!(calculate_income(1150.0, 30.0), Decimal::from(345));
        assert_eq!(
            calculate_income(999.99, 33.0),
            "330.00".parse::<Decimal>().unwrap()
        );
        assert_eq!(calculate_income(f64::NAN, 30.0), Decimal::ZERO);
        assert_eq!(calculate_income(1150.0, f64::INFINITY), Decimal::ZERO);
    }
}
