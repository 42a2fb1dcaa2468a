// ==========================================
// mHealth Barangay San Cristobal - Domain Types
// ==========================================
// Responsibility: classification and outcome enums for the import engine
// ==========================================

use crate::domain::record::PersistedRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// MatchReason - why an imported row was tied to an existing record
// ==========================================
// The display strings are shown verbatim in the import preview, so they
// stay stable even if variants are renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchReason {
    /// Canonical phone number equals an existing record's phone.
    PhoneNumber,
    /// Canonical date of birth equals an existing record's date of birth.
    DateOfBirth,
    /// First and last name both equal an existing record's.
    FullName,
    /// Subject id matched and the imported timestamp is within the
    /// 1-second tolerance of an existing record's creation time.
    ExactTimestamp,
    /// Subject id matched but no timestamp qualified; the most recently
    /// created record for that subject was selected.
    MostRecentForSubject,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchReason::PhoneNumber => "Phone number match",
            MatchReason::DateOfBirth => "Date of birth match",
            MatchReason::FullName => "Name match",
            MatchReason::ExactTimestamp => "Exact match (user_id and timestamp)",
            MatchReason::MostRecentForSubject => "Most recent record for user",
        };
        f.write_str(label)
    }
}

// ==========================================
// MatchResult - per-row classification
// ==========================================
// At most one existing record is ever attached to a row. When several
// qualify under the winning rule, the matcher picks exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchResult {
    /// No existing record qualifies; the row is NEW.
    NoMatch,
    /// The row updates `record`; `reason` explains the tie in the preview.
    Matched {
        record: PersistedRecord,
        reason: MatchReason,
    },
}

impl MatchResult {
    pub fn is_new(&self) -> bool {
        matches!(self, MatchResult::NoMatch)
    }
}

// ==========================================
// ImportOutcome - per-row apply result
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportOutcome {
    Created(i64),
    Updated(i64),
    Failed(String),
}
