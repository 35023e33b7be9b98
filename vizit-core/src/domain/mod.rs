//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

pub mod result;
mod visit;

pub use result::{Error, Result};
pub use visit::{round2, Visit, VisitDraft};
