//! In-memory visit store for testing
//!
//! Implements the same contract as the Firestore adapter against a plain
//! map, allowing comprehensive service and CLI testing without a project
//! or an emulator. Documents are keyed by id in a `BTreeMap`, so scan
//! pages come back ordered by document id like the real store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Visit, VisitDraft};
use crate::ports::{DocumentStub, OwnerAssignment, VisitStore};

/// In-memory visit store
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, Visit>>,
    batch_commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert visits directly, bypassing the write path.
    pub fn seed(&self, visits: Vec<Visit>) {
        let mut documents = self.documents.lock().unwrap();
        for visit in visits {
            documents.insert(visit.id.clone(), visit);
        }
    }

    /// Number of batch commits performed (`commit_drafts` and
    /// `assign_owners` calls; single-document writes are not batches).
    pub fn batch_commits(&self) -> usize {
        self.batch_commits.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored visit, ordered by document id.
    pub fn all_visits(&self) -> Vec<Visit> {
        self.documents.lock().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.lock().unwrap().is_empty()
    }

    /// Mirror of the server-side timestamp fill on create.
    fn materialize(id: String, draft: &VisitDraft) -> Visit {
        let now = Utc::now();
        let mut visit = Visit::from_draft(id, draft);
        visit.created_at = draft.created_at.or(Some(now));
        visit.updated_at = draft.updated_at.or(Some(now));
        visit
    }
}

impl VisitStore for MemoryStore {
    fn visits_between(
        &self,
        owner_uid: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Visit>> {
        let documents = self.documents.lock().unwrap();
        let mut visits: Vec<Visit> = documents
            .values()
            .filter(|visit| {
                visit.owner_uid == owner_uid
                    && visit.visit_date >= start
                    && visit.visit_date <= end
            })
            .cloned()
            .collect();

        // Same ordering as the backing query: visit date, newest first.
        visits.sort_by(|left, right| right.visit_date.cmp(&left.visit_date));
        Ok(visits)
    }

    fn create_visit(&self, draft: &VisitDraft) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let visit = Self::materialize(id.clone(), draft);
        self.documents.lock().unwrap().insert(id.clone(), visit);
        Ok(id)
    }

    fn update_visit(&self, id: &str, draft: &VisitDraft) -> Result<()> {
        let mut documents = self.documents.lock().unwrap();
        let visit = documents
            .get_mut(id)
            .ok_or_else(|| Error::store(format!("document {} not found", id)))?;

        // Owner and timestamps stay as they are; edits touch visit data only.
        visit.visit_date = draft.visit_date;
        visit.patient_name = draft.patient_name.clone();
        visit.procedure_name = draft.procedure_name.clone();
        visit.amount = draft.amount;
        visit.percent = draft.percent;
        visit.doctor_income = draft.doctor_income;
        visit.notes = draft.notes.clone();
        Ok(())
    }

    fn delete_visit(&self, id: &str) -> Result<()> {
        // Deleting a missing document is a no-op, like the backing store.
        self.documents.lock().unwrap().remove(id);
        Ok(())
    }

    fn commit_drafts(&self, drafts: &[VisitDraft]) -> Result<usize> {
        let mut documents = self.documents.lock().unwrap();
        for draft in drafts {
            let id = Uuid::new_v4().simple().to_string();
            let visit = Self::materialize(id.clone(), draft);
            documents.insert(id, visit);
        }
        self.batch_commits.fetch_add(1, Ordering::SeqCst);
        Ok(drafts.len())
    }

    fn scan_page(&self, cursor: Option<&str>, page_size: usize) -> Result<Vec<DocumentStub>> {
        let documents = self.documents.lock().unwrap();
        let stubs = documents
            .iter()
            .filter(|(id, _)| match cursor {
                Some(cursor) => id.as_str() > cursor,
                None => true,
            })
            .take(page_size)
            .map(|(id, visit)| DocumentStub {
                id: id.clone(),
                owner_uid: if visit.owner_uid.is_empty() {
                    None
                } else {
                    Some(visit.owner_uid.clone())
                },
            })
            .collect();
        Ok(stubs)
    }

    fn assign_owners(&self, assignments: &[OwnerAssignment]) -> Result<usize> {
        let mut documents = self.documents.lock().unwrap();
        for assignment in assignments {
            let visit = documents.get_mut(&assignment.doc_id).ok_or_else(|| {
                Error::store(format!("document {} not found", assignment.doc_id))
            })?;
            visit.owner_uid = assignment.owner_uid.clone();
            visit.updated_at = Some(Utc::now());
        }
        self.batch_commits.fetch_add(1, Ordering::SeqCst);
        Ok(assignments.len())
    }
}
