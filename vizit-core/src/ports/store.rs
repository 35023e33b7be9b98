//! Visit store port - document collection abstraction

use chrono::NaiveDate;

use crate::domain::result::Result;
use crate::domain::{Visit, VisitDraft};

/// Upper bound on writes per committed batch, set by the document store.
pub const MAX_BATCH_WRITES: usize = 500;

/// A raw document seen while scanning a collection page by page. Only the
/// fields the owner migration needs are decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStub {
    pub id: String,
    pub owner_uid: Option<String>,
}

/// One pending owner assignment for an ownerless document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerAssignment {
    pub doc_id: String,
    pub owner_uid: String,
}

/// Document store abstraction
///
/// This trait defines all store operations. Implementations (adapters)
/// provide the actual backend access.
pub trait VisitStore: Send + Sync {
    // === Visits ===

    /// Visits for one owner within an inclusive date range, newest first
    fn visits_between(
        &self,
        owner_uid: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Visit>>;

    /// Create a single visit, returning the generated document id
    fn create_visit(&self, draft: &VisitDraft) -> Result<String>;

    /// Update an existing visit's fields
    fn update_visit(&self, id: &str, draft: &VisitDraft) -> Result<()>;

    /// Delete a visit by document id
    fn delete_visit(&self, id: &str) -> Result<()>;

    // === Bulk import ===

    /// Commit up to [`MAX_BATCH_WRITES`] drafts in one write, returning the
    /// number of documents created
    fn commit_drafts(&self, drafts: &[VisitDraft]) -> Result<usize>;

    // === Owner migration ===

    /// One page of documents ordered by id, starting after `cursor`
    fn scan_page(&self, cursor: Option<&str>, page_size: usize) -> Result<Vec<DocumentStub>>;

    /// Set the owner on the given documents in one batched write, returning
    /// the number updated
    fn assign_owners(&self, assignments: &[OwnerAssignment]) -> Result<usize>;
}
