//! Vizit Core - visit tracking and income reporting for a solo practice
//!
//! This crate implements the core logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Visit, VisitDraft)
//! - **ingest**: CSV/JSON normalization into visit drafts
//! - **analytics**: Month summaries, filtering, sorting and collation
//! - **ports**: Trait definition for the document store
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete store implementations (Firestore REST, in-memory)

pub mod adapters;
pub mod analytics;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{round2, Visit, VisitDraft};
