// ==========================================
// mHealth Barangay San Cristobal - Record Model
// ==========================================
// Responsibility: imported-row intermediate structs, persisted-record view,
//                 batch summary aggregation
// ==========================================

use crate::domain::types::MatchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ==========================================
// Identity - the fields used to recognize a subject across imports
// ==========================================
// All values are already in canonical form (ISO dates, +63 phone numbers)
// by the time an Identity is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub phone: Option<String>,
}

/// Contact details for the best-effort welcome notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    pub display_name: String,
}

// ==========================================
// NormalizedRow - one imported row after normalization
// ==========================================
// Lifecycle: produced by a profile's normalize step, consumed by the
// matcher and the apply phase. Never outlives one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// 1-based row number in the source file, for error reporting.
    pub row_number: usize,
    /// Explicit subject identifier carried by the row (e.g. user_id).
    pub external_id: Option<String>,
    pub identity: Identity,
    /// Imported creation timestamp, already anchored to a full instant.
    pub timestamp: Option<DateTime<Utc>>,
    /// Storage-form fields destined for the persisted record.
    pub payload: Map<String, Value>,
}

// ==========================================
// PersistedRecord - an existing row in the record store
// ==========================================
// Owned by the store; the engine only holds it for the duration of one
// batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    /// Full column map, including id and created_at in raw form.
    pub fields: Map<String, Value>,
}

impl PersistedRecord {
    /// String view of a field; `None` when absent or not textual.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

// ==========================================
// RowClassification - preview-phase result for one raw row
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowClassification {
    /// The row normalized cleanly and was classified against the store.
    Ready {
        row: NormalizedRow,
        result: MatchResult,
    },
    /// The row failed normalization (or its lookup failed); it will be
    /// reported as Failed without touching the store.
    Invalid { row_number: usize, message: String },
}

impl RowClassification {
    pub fn row_number(&self) -> usize {
        match self {
            RowClassification::Ready { row, .. } => row.row_number,
            RowClassification::Invalid { row_number, .. } => *row_number,
        }
    }
}

/// One per-row failure, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

// ==========================================
// BatchSummary - the one object returned to the caller
// ==========================================
// `errors` always carries the full list for programmatic inspection;
// `error_preview` is the bounded human-facing rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub counts: BatchCounts,
    /// Every per-row failure, in input order.
    pub errors: Vec<RowError>,
    /// Notification failures; never counted against a row's outcome.
    pub warnings: Vec<RowError>,
    pub elapsed_ms: u64,
}

impl BatchSummary {
    /// Human-facing error report, capped at `limit` entries with an
    /// ellipsis marker when more exist.
    pub fn error_preview(&self, limit: usize) -> String {
        let mut lines: Vec<String> = self
            .errors
            .iter()
            .take(limit)
            .map(|e| format!("• row {}: {}", e.row_number, e.message))
            .collect();
        if self.errors.len() > limit {
            lines.push("• ...".to_string());
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_with_errors(n: usize) -> BatchSummary {
        BatchSummary {
            batch_id: "test".to_string(),
            counts: BatchCounts::default(),
            errors: (1..=n)
                .map(|i| RowError {
                    row_number: i,
                    message: format!("error {}", i),
                })
                .collect(),
            warnings: Vec::new(),
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_error_preview_under_limit() {
        let summary = summary_with_errors(2);
        let preview = summary.error_preview(3);
        assert_eq!(preview.lines().count(), 2);
        assert!(!preview.contains("..."));
    }

    #[test]
    fn test_error_preview_caps_at_limit() {
        let summary = summary_with_errors(5);
        let preview = summary.error_preview(3);
        assert_eq!(preview.lines().count(), 4); // 3 entries + ellipsis
        assert!(preview.ends_with("• ..."));
        // The full list is still available for inspection.
        assert_eq!(summary.errors.len(), 5);
    }

    #[test]
    fn test_field_str() {
        let mut fields = Map::new();
        fields.insert("phone".to_string(), Value::String("+639171234567".into()));
        fields.insert("id".to_string(), Value::Number(7.into()));
        let record = PersistedRecord {
            id: 7,
            created_at: Utc::now(),
            fields,
        };
        assert_eq!(record.field_str("phone"), Some("+639171234567"));
        assert_eq!(record.field_str("id"), None); // numeric, not textual
        assert_eq!(record.field_str("missing"), None);
    }
}
