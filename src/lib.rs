// ==========================================
// mHealth Barangay San Cristobal - Core Library
// ==========================================
// Import reconciliation engine for the community health dashboard.
// Spreadsheets come in, records are matched against the store, and a
// batch summary comes out. Delivery of welcome SMS is best effort.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer: rows, records, match results, batch summary
pub mod domain;

// Repository layer: record store trait + SQLite implementation
pub mod repository;

// Import pipeline: parse, normalize, match, apply
pub mod importer;

// Notification layer: welcome SMS
pub mod notify;

// Per-run configuration
pub mod config;

// Database infrastructure (connection init, unified PRAGMAs)
pub mod db;

// Logging setup
pub mod logging;

// ==========================================
// Core re-exports
// ==========================================

pub use config::{ImportConfig, ValidationMode};
pub use domain::{
    BatchCounts, BatchSummary, Contact, ImportOutcome, MatchReason, MatchResult, NormalizedRow,
    PersistedRecord, RowClassification, RowError,
};
pub use importer::{
    HealthHistoryProfile, ImportEngine, ImportError, ImportProfile, ImportResult, UserProfile,
};
pub use notify::{Notifier, NullNotifier, SmsGatewayClient};
pub use repository::{RecordStore, RepositoryError, SqliteRecordStore};

/// Crate version, from the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name used in logs and the CLI.
pub const APP_NAME: &str = "mhealth-import";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_present() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "mhealth-import");
    }
}
