// ==========================================
// mHealth Barangay San Cristobal - Record Store Trait
// ==========================================
// Responsibility: the narrow persistence contract the import engine
//                 consumes; no business rules live behind it
// ==========================================

use crate::domain::PersistedRecord;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde_json::{Map, Value};

// ==========================================
// RecordStore Trait
// ==========================================
// Implementors: SqliteRecordStore (rusqlite); test doubles in tests/
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records in `table` whose `field` equals `value` exactly.
    async fn query_by_field(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> RepositoryResult<Vec<PersistedRecord>>;

    /// Current maximum numeric value of `field` in `table`; `None` when
    /// the table is empty.
    async fn query_max_id(&self, table: &str, field: &str) -> RepositoryResult<Option<i64>>;

    /// Every record in `table`, ordered by descending creation time.
    async fn query_all(&self, table: &str) -> RepositoryResult<Vec<PersistedRecord>>;

    /// Insert one record. `fields` must include the identifier column when
    /// the caller assigns identifiers itself.
    async fn insert(
        &self,
        table: &str,
        fields: &Map<String, Value>,
    ) -> RepositoryResult<PersistedRecord>;

    /// Overwrite the given columns of the record with identifier `id`.
    async fn update(
        &self,
        table: &str,
        id: i64,
        fields: &Map<String, Value>,
    ) -> RepositoryResult<PersistedRecord>;

    /// Delete the record with identifier `id`.
    async fn delete(&self, table: &str, id: i64) -> RepositoryResult<()>;
}
