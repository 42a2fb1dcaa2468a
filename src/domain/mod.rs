// ==========================================
// mHealth Barangay San Cristobal - Domain Layer
// ==========================================
// Responsibility: entities and value types shared across the import pipeline
// ==========================================

pub mod record;
pub mod types;

pub use record::{
    BatchCounts, BatchSummary, Contact, Identity, NormalizedRow, PersistedRecord,
    RowClassification, RowError,
};
pub use types::{ImportOutcome, MatchReason, MatchResult};
