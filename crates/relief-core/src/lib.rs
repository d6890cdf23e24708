//! Core types and traits for Relief document store backends.
//!
//! This crate provides the `DocumentStore` trait, the entity models and the
//! summary report type, enabling pluggable store implementations in separate
//! crates.

pub mod document;
pub mod entity;
pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use document::{Document, DocumentId, StoredDocument};
pub use entity::Entity;
pub use models::{Beneficiary, Disaster, Donation, Volunteer};
pub use models::summary::{DonationTypeTotals, Summary};
pub use storage::{
    is_safe_collection_name, validate_collection, DeleteOutcome, DocumentStore, Filter, ReplaceOutcome,
    StorageError,
};
