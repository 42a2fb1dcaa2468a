// ==========================================
// mHealth Barangay San Cristobal - Repository Layer
// ==========================================

pub mod error;
pub mod record_store;
pub mod sqlite_store;

pub use error::{RepositoryError, RepositoryResult};
pub use record_store::RecordStore;
pub use sqlite_store::SqliteRecordStore;
