//! Visit service - interactive create/edit/delete and the month ledger

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::analytics::{month_bounds, sort_visits, VisitsSort};
use crate::domain::{round2, Error, Visit, VisitDraft};
use crate::ports::VisitStore;

/// Normalize a form draft before it is written: trim the text fields,
/// round amount and percent, then derive the income from the rounded
/// values so the stored triple is always internally consistent.
pub fn prepare_draft(draft: &VisitDraft) -> VisitDraft {
    let amount = round2(draft.amount);
    let percent = round2(draft.percent);
    let doctor_income = round2(amount * percent / Decimal::ONE_HUNDRED);

    VisitDraft {
        owner_uid: draft.owner_uid.trim().to_string(),
        visit_date: draft.visit_date,
        patient_name: draft.patient_name.trim().to_string(),
        procedure_name: draft.procedure_name.trim().to_string(),
        amount,
        percent,
        doctor_income,
        notes: draft.notes.trim().to_string(),
        created_at: draft.created_at,
        updated_at: draft.updated_at,
    }
}

/// Visit service for single-record operations and month queries
pub struct VisitsService<S: VisitStore> {
    store: Arc<S>,
}

impl<S: VisitStore> VisitsService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Visits for one owner and one month (`YYYY-MM`), newest first with
    /// the creation-time tie-break applied on top of the store's order.
    /// A malformed month falls back to the current one.
    pub fn visits_for_month(&self, owner_uid: &str, month: &str) -> Result<Vec<Visit>> {
        let (start, end) = month_bounds(month);
        let visits = self.store.visits_between(owner_uid, start, end)?;
        Ok(sort_visits(&visits, VisitsSort::DateDesc))
    }

    /// Create a visit from a form draft. The creation time is stamped
    /// here; the update time is left to the store.
    pub fn create(&self, draft: &VisitDraft) -> Result<String> {
        let mut prepared = prepare_draft(draft);
        prepared.validate().map_err(Error::validation)?;
        prepared.created_at = Some(Utc::now());
        prepared.updated_at = None;
        Ok(self.store.create_visit(&prepared)?)
    }

    /// Replace the visit fields of an existing record. Owner and
    /// timestamps are not touched.
    pub fn update(&self, id: &str, draft: &VisitDraft) -> Result<()> {
        let prepared = prepare_draft(draft);
        prepared.validate().map_err(Error::validation)?;
        Ok(self.store.update_visit(id, &prepared)?)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        Ok(self.store.delete_visit(id)?)
    }
}
