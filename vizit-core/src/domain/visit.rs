//! Visit domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round money and percent values to two decimal places.
/// Midpoints round away from zero ("round half up" for the positive
/// values this system deals in), trailing zeros stripped.
pub fn round2(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// A normalized visit row ready to be written to the store.
/// Produced by the ingest pipelines and by interactive draft preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitDraft {
    pub owner_uid: String,
    pub visit_date: NaiveDate,
    pub patient_name: String,
    pub procedure_name: String,
    pub amount: Decimal,
    pub percent: Decimal,
    pub doctor_income: Decimal,
    pub notes: String,
    /// Carried through from structured re-imports; absent drafts get the
    /// store's write time instead.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VisitDraft {
    /// Validate draft data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.owner_uid.trim().is_empty() {
            return Err("owner uid cannot be empty");
        }
        if self.patient_name.trim().is_empty() {
            return Err("patient name cannot be empty");
        }
        if self.amount <= Decimal::ZERO {
            return Err("amount must be greater than zero");
        }
        if self.percent < Decimal::ZERO || self.percent > Decimal::ONE_HUNDRED {
            return Err("percent must be between 0 and 100");
        }
        Ok(())
    }
}

/// A persisted visit document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    pub owner_uid: String,
    pub visit_date: NaiveDate,
    pub patient_name: String,
    pub procedure_name: String,
    pub amount: Decimal,
    pub percent: Decimal,
    pub doctor_income: Decimal,
    pub notes: String,
    /// Missing on documents written before timestamps were recorded;
    /// such visits lose date-sort ties.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Visit {
    /// Build a persisted visit from a draft and its assigned document id
    pub fn from_draft(id: impl Into<String>, draft: &VisitDraft) -> Self {
        Self {
            id: id.into(),
            owner_uid: draft.owner_uid.clone(),
            visit_date: draft.visit_date,
            patient_name: draft.patient_name.clone(),
            procedure_name: draft.procedure_name.clone(),
            amount: draft.amount,
            percent: draft.percent,
            doctor_income: draft.doctor_income,
            notes: draft.notes.clone(),
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        }
    }
}
