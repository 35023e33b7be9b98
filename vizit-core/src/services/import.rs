//! Import service - batch persistence of parsed visit drafts

use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{round2, VisitDraft};
use crate::ingest::ImportOutcome;
use crate::ports::{VisitStore, MAX_BATCH_WRITES};

/// Documents per commit batch unless the caller asks otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 400;

/// Aggregate numbers shown to the operator before and after a run.
/// A dry run produces exactly the same summary as an apply run.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub parsed_rows: usize,
    /// Distinct owner uids across the drafts, in first-seen order.
    pub target_uids: Vec<String>,
    pub total_amount: Decimal,
    pub total_income: Decimal,
    pub warnings: Vec<String>,
}

impl ImportSummary {
    pub fn from_outcome(outcome: &ImportOutcome) -> Self {
        let mut target_uids: Vec<String> = Vec::new();
        for draft in &outcome.drafts {
            if !draft.owner_uid.is_empty() && !target_uids.contains(&draft.owner_uid) {
                target_uids.push(draft.owner_uid.clone());
            }
        }

        let total_amount: Decimal = outcome.drafts.iter().map(|draft| draft.amount).sum();
        let total_income: Decimal = outcome.drafts.iter().map(|draft| draft.doctor_income).sum();

        Self {
            parsed_rows: outcome.drafts.len(),
            target_uids,
            total_amount: round2(total_amount),
            total_income: round2(total_income),
            warnings: outcome.warnings.clone(),
        }
    }
}

/// Import service for bulk visit writes
pub struct ImportService<S: VisitStore> {
    store: Arc<S>,
    batch_size: usize,
}

impl<S: VisitStore> ImportService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the batch size, clamped to the store's commit limit.
    pub fn with_batch_size(store: Arc<S>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.clamp(1, MAX_BATCH_WRITES),
        }
    }

    /// Persist drafts in order, committing a full batch every `batch_size`
    /// documents and a final partial batch at the end. Returns the number
    /// of documents written.
    pub fn write_drafts(&self, drafts: &[VisitDraft]) -> Result<usize> {
        let mut created = 0;
        for chunk in drafts.chunks(self.batch_size) {
            created += self.store.commit_drafts(chunk)?;
            debug!("Committed a batch of {} drafts", chunk.len());
        }
        Ok(created)
    }
}
