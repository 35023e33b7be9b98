//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod import;
pub mod migration;
pub mod visits;

pub use import::{ImportService, ImportSummary, DEFAULT_BATCH_SIZE};
pub use migration::{
    normalize_page_size, MigrationOptions, MigrationService, MigrationSummary, OwnerMap,
    DEFAULT_PAGE_SIZE,
};
pub use visits::{prepare_draft, VisitsService};
