//! Integration tests for the import and migration flows
//!
//! Raw text goes through the ingest pipelines, the import service and the
//! in-memory store, then comes back out through the month query and the
//! dashboard aggregator. No network IO is involved.
//!
//! Run with: cargo test --test import_flow -- --nocapture

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use vizit_core::adapters::MemoryStore;
use vizit_core::analytics;
use vizit_core::ingest::{self, ParseContext};
use vizit_core::ports::VisitStore;
use vizit_core::services::{
    ImportService, MigrationOptions, MigrationService, VisitsService,
};
use vizit_core::{Visit, VisitDraft};

// ============================================================================
// Test Helpers
// ============================================================================

fn ctx(uid: &str) -> ParseContext {
    ParseContext::new(2026).with_owner(uid)
}

fn parse(file_name: &str, raw: &str, ctx: &ParseContext) -> Vec<VisitDraft> {
    let (_, outcome) = ingest::parse_input(file_name, raw, ctx, None, None).unwrap();
    assert!(outcome.warnings.is_empty(), "unexpected warnings: {:?}", outcome.warnings);
    outcome.drafts
}

fn seeded_visit(id: &str, owner: &str, date: (i32, u32, u32)) -> Visit {
    let draft = VisitDraft {
        owner_uid: owner.to_string(),
        visit_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        patient_name: "Пацієнт".to_string(),
        procedure_name: "Консультація".to_string(),
        amount: Decimal::from(1000),
        percent: Decimal::from(30),
        doctor_income: Decimal::from(300),
        notes: String::new(),
        created_at: None,
        updated_at: None,
    };
    Visit::from_draft(id, &draft)
}

// ============================================================================
// CSV to Dashboard
// ============================================================================

/// Grouped CSV rows land in the store and come back out of the month
/// query with the dashboard numbers intact.
#[test]
fn test_csv_import_end_to_end() {
    let raw = "Дата;ПІБ;Сума;%\n\
               19.02;Коротін Д.С.;1150;30\n\
               ;Іваненко П.;2000;500\n\
               ;КОРОТІН Д.С.;1000;20\n";

    let (_, outcome) = ingest::parse_input("feb.csv", raw, &ctx("uid-1"), None, None).unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.drafts.len(), 3);
    let csv = outcome.csv.unwrap();
    assert!(csv.has_header);

    // the date from the first row carries into the blank cells below it
    let date = NaiveDate::from_ymd_opt(2026, 2, 19).unwrap();
    assert!(outcome.drafts.iter().all(|draft| draft.visit_date == date));

    // the 500 in the percent column is an absolute income figure
    assert_eq!(outcome.drafts[1].percent, Decimal::from(25));
    assert_eq!(outcome.drafts[1].doctor_income, Decimal::from(500));

    let store = Arc::new(MemoryStore::new());
    let created = ImportService::with_batch_size(store.clone(), 2)
        .write_drafts(&outcome.drafts)
        .unwrap();
    assert_eq!(created, 3);
    // 2 + 1
    assert_eq!(store.batch_commits(), 2);

    let service = VisitsService::new(store);
    let visits = service.visits_for_month("uid-1", "2026-02").unwrap();
    assert_eq!(visits.len(), 3);

    let vm = analytics::build_dashboard_vm(visits);
    assert_eq!(vm.summary.total_amount, Decimal::from(4150));
    assert_eq!(vm.summary.total_income, Decimal::from(1045));
    assert_eq!(vm.summary.total_visits, 3);
    // case-insensitive name collision collapses two entries
    assert_eq!(vm.summary.unique_patients, 2);
    assert_eq!(vm.top_days.len(), 1);
    assert_eq!(vm.top_days[0].income, Decimal::from(1045));
}

/// Rows parsed under another owner stay invisible to the month query.
#[test]
fn test_month_query_is_owner_scoped() {
    let store = Arc::new(MemoryStore::new());
    let service = ImportService::new(store.clone());

    let mine = parse("mine.csv", "19.02;Коротін Д.С.;1150;30", &ctx("uid-1"));
    let theirs = parse("theirs.csv", "20.02;Іваненко П.;2000;25", &ctx("uid-2"));
    service.write_drafts(&mine).unwrap();
    service.write_drafts(&theirs).unwrap();

    let visits = VisitsService::new(store)
        .visits_for_month("uid-1", "2026-02")
        .unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].patient_name, "Коротін Д.С.");
}

// ============================================================================
// JSON Re-import
// ============================================================================

/// A JSON export that carries its own timestamps keeps them through a
/// re-import instead of getting fresh write-time ones.
#[test]
fn test_json_reimport_preserves_timestamps() {
    let raw = r#"[
        {
            "ownerUid": "uid-1",
            "patientName": "Коротін Д.С.",
            "procedureName": "Операція",
            "amount": 1150,
            "percent": 30,
            "visitDate": "2026-02-19",
            "createdAt": "2026-02-19T10:30:00Z",
            "updatedAt": "2026-02-20T08:00:00Z"
        },
        {
            "ownerUid": "uid-1",
            "patientName": "Іваненко П.",
            "amount": 2000,
            "doctorIncome": 500,
            "visitDate": "2026-02-20"
        }
    ]"#;

    let (_, outcome) = ingest::parse_input("export.json", raw, &ctx("uid-1"), None, None).unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.drafts.len(), 2);
    assert!(outcome.csv.is_none());

    let store = Arc::new(MemoryStore::new());
    ImportService::new(store.clone())
        .write_drafts(&outcome.drafts)
        .unwrap();

    let visits = store
        .visits_between(
            "uid-1",
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
        )
        .unwrap();
    assert_eq!(visits.len(), 2);

    let carried = visits
        .iter()
        .find(|visit| visit.patient_name == "Коротін Д.С.")
        .unwrap();
    assert_eq!(
        carried.created_at,
        Some(Utc.with_ymd_and_hms(2026, 2, 19, 10, 30, 0).unwrap())
    );
    assert_eq!(
        carried.updated_at,
        Some(Utc.with_ymd_and_hms(2026, 2, 20, 8, 0, 0).unwrap())
    );

    // the row without timestamps gets write-time ones
    let fresh = visits
        .iter()
        .find(|visit| visit.patient_name == "Іваненко П.")
        .unwrap();
    assert!(fresh.created_at.is_some());
    // income-only row back-derives its percent
    assert_eq!(fresh.percent, Decimal::from(25));
}

// ============================================================================
// Owner Migration
// ============================================================================

/// A dry run reports the same classification as the apply run and
/// leaves the store untouched; the apply run stamps the owners.
#[test]
fn test_migration_dry_run_then_apply() {
    let store = Arc::new(MemoryStore::new());
    store.seed(vec![
        seeded_visit("doc-a", "uid-1", (2026, 2, 19)),
        seeded_visit("doc-b", "", (2026, 2, 19)),
        seeded_visit("doc-c", "", (2026, 2, 20)),
        seeded_visit("doc-d", "", (2026, 2, 21)),
    ]);
    let service = MigrationService::new(store.clone());

    let options = MigrationOptions {
        all_to_uid: Some("uid-9".to_string()),
        page_size: 2,
        ..Default::default()
    };

    let dry = service.run(&options).unwrap();
    assert_eq!(dry.scanned, 4);
    assert_eq!(dry.already_owned, 1);
    assert_eq!(dry.ownerless, 3);
    assert_eq!(dry.assigned, 3);
    assert_eq!(dry.updated, 0);
    assert_eq!(store.batch_commits(), 0);

    let applied = service
        .run(&MigrationOptions {
            apply: true,
            ..options
        })
        .unwrap();
    assert_eq!(applied.scanned, dry.scanned);
    assert_eq!(applied.ownerless, dry.ownerless);
    assert_eq!(applied.assigned, dry.assigned);
    assert_eq!(applied.updated, 3);

    let owned: Vec<Visit> = store
        .all_visits()
        .into_iter()
        .filter(|visit| visit.owner_uid == "uid-9")
        .collect();
    assert_eq!(owned.len(), 3);
    // the refreshed update stamp marks the migrated documents
    assert!(owned.iter().all(|visit| visit.updated_at.is_some()));
}

/// Migrated documents join the owner's month query like any other.
#[test]
fn test_migrated_documents_become_queryable() {
    let store = Arc::new(MemoryStore::new());
    store.seed(vec![seeded_visit("doc-a", "", (2026, 2, 19))]);

    let visits_service = VisitsService::new(store.clone());
    assert!(visits_service
        .visits_for_month("uid-1", "2026-02")
        .unwrap()
        .is_empty());

    MigrationService::new(store)
        .run(&MigrationOptions {
            apply: true,
            all_to_uid: Some("uid-1".to_string()),
            ..Default::default()
        })
        .unwrap();

    let visits = visits_service.visits_for_month("uid-1", "2026-02").unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].id, "doc-a");
}
