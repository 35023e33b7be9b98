//! Adapter implementations
//!
//! Adapters implement the visit store port with concrete technologies:
//! - Firestore REST API for production use
//! - In-memory map for tests and local experiments

pub mod firestore;
pub mod memory;

pub use firestore::{FirestoreStore, ServiceAccountKey};
pub use memory::MemoryStore;
