// ==========================================
// mHealth Barangay San Cristobal - Record Matcher
// ==========================================
// Decides whether an imported row refers to a record that already
// exists. Precedence:
//   1. explicit subject reference (exact timestamp beats most recent)
//   2. the profile's natural keys, in declared order
// First hit wins; within one key, the newest record wins.
// ==========================================

use crate::domain::{MatchReason, MatchResult, NormalizedRow, PersistedRecord};
use crate::importer::normalizer;
use crate::importer::profile::{ImportProfile, NaturalKey};
use crate::repository::{RecordStore, RepositoryResult};
use tracing::debug;

/// Two creation timestamps within this window count as the same instant.
const TIMESTAMP_TOLERANCE_MS: i64 = 1_000;

pub struct RecordMatcher<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> RecordMatcher<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Classify one normalized row against the store. Read-only.
    pub async fn classify_row(
        &self,
        profile: &dyn ImportProfile,
        row: &NormalizedRow,
    ) -> RepositoryResult<MatchResult> {
        if let (Some(field), Some(external_id)) =
            (profile.external_id_field(), row.external_id.as_deref())
        {
            let candidates = self
                .store
                .query_by_field(profile.table(), field, external_id)
                .await?;
            if !candidates.is_empty() {
                if let Some(timestamp) = row.timestamp {
                    let exact = candidates.iter().find(|candidate| {
                        (candidate.created_at - timestamp).num_milliseconds().abs()
                            < TIMESTAMP_TOLERANCE_MS
                    });
                    if let Some(record) = exact {
                        debug!(row = row.row_number, id = record.id, "exact timestamp match");
                        return Ok(MatchResult::Matched {
                            record: record.clone(),
                            reason: MatchReason::ExactTimestamp,
                        });
                    }
                }
                let record = pick_latest(candidates);
                debug!(row = row.row_number, id = record.id, "most recent for subject");
                return Ok(MatchResult::Matched {
                    record,
                    reason: MatchReason::MostRecentForSubject,
                });
            }
        }

        for key in profile.natural_keys() {
            if let Some(result) = self.match_natural_key(profile, row, *key).await? {
                return Ok(result);
            }
        }

        Ok(MatchResult::NoMatch)
    }

    async fn match_natural_key(
        &self,
        profile: &dyn ImportProfile,
        row: &NormalizedRow,
        key: NaturalKey,
    ) -> RepositoryResult<Option<MatchResult>> {
        let candidates = match key {
            NaturalKey::Phone => {
                let Some(phone) = row.identity.phone.as_deref().filter(|p| !p.is_empty()) else {
                    return Ok(None);
                };
                self.store
                    .query_by_field(profile.table(), "phone", phone)
                    .await?
            }
            NaturalKey::DateOfBirth => {
                let Some(dob) = row.identity.date_of_birth else {
                    return Ok(None);
                };
                self.store
                    .query_by_field(
                        profile.table(),
                        "date_of_birth",
                        &normalizer::to_storage_date(dob),
                    )
                    .await?
            }
            NaturalKey::FullName => {
                let (Some(first), Some(last)) = (
                    row.identity.first_name.as_deref(),
                    row.identity.last_name.as_deref(),
                ) else {
                    return Ok(None);
                };
                self.store
                    .query_by_field(profile.table(), "first_name", first)
                    .await?
                    .into_iter()
                    .filter(|record| record.field_str("last_name") == Some(last))
                    .collect()
            }
        };

        if candidates.is_empty() {
            return Ok(None);
        }

        let reason = match key {
            NaturalKey::Phone => MatchReason::PhoneNumber,
            NaturalKey::DateOfBirth => MatchReason::DateOfBirth,
            NaturalKey::FullName => MatchReason::FullName,
        };
        let record = pick_latest(candidates);
        debug!(row = row.row_number, id = record.id, ?reason, "natural key match");
        Ok(Some(MatchResult::Matched { record, reason }))
    }
}

/// Newest first: creation time, then identifier as tie-break.
fn pick_latest(mut candidates: Vec<PersistedRecord>) -> PersistedRecord {
    candidates.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    candidates.remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::importer::profile::{HealthHistoryProfile, UserProfile};
    use crate::repository::SqliteRecordStore;
    use chrono::{Duration, Utc};
    use serde_json::{json, Map, Value};

    async fn seed_user(
        store: &SqliteRecordStore,
        id: i64,
        phone: &str,
        dob: &str,
        first: &str,
        last: &str,
        created_at: chrono::DateTime<Utc>,
    ) {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(id));
        fields.insert("first_name".to_string(), json!(first));
        fields.insert("last_name".to_string(), json!(last));
        fields.insert("date_of_birth".to_string(), json!(dob));
        fields.insert("phone".to_string(), json!(phone));
        fields.insert("created_at".to_string(), json!(created_at.to_rfc3339()));
        store.insert("users", &fields).await.unwrap();
    }

    fn user_row(phone: &str, dob: &str, first: &str, last: &str) -> NormalizedRow {
        NormalizedRow {
            row_number: 2,
            external_id: None,
            identity: Identity {
                first_name: Some(first.to_string()),
                last_name: Some(last.to_string()),
                date_of_birth: normalizer::normalize_date(dob),
                phone: Some(phone.to_string()),
            },
            timestamp: None,
            payload: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_phone_beats_name_and_dob() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let now = Utc::now();
        // Same name and birth date on record 1, same phone on record 2.
        seed_user(&store, 1, "+639170000001", "1990-05-15", "Maria", "Santos", now).await;
        seed_user(&store, 2, "+639171234567", "1985-01-01", "Jose", "Reyes", now).await;

        let matcher = RecordMatcher::new(&store);
        let row = user_row("+639171234567", "1990-05-15", "Maria", "Santos");
        let result = matcher.classify_row(&UserProfile, &row).await.unwrap();

        match result {
            MatchResult::Matched { record, reason } => {
                assert_eq!(record.id, 2);
                assert_eq!(reason, MatchReason::PhoneNumber);
            }
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dob_then_name_fallback() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let now = Utc::now();
        seed_user(&store, 1, "+639170000001", "1990-05-15", "Ana", "Cruz", now).await;
        seed_user(&store, 2, "+639170000002", "1970-01-01", "Maria", "Santos", now).await;

        let matcher = RecordMatcher::new(&store);

        // No phone match, birth date hits record 1.
        let row = user_row("+639179999999", "1990-05-15", "Maria", "Santos");
        match matcher.classify_row(&UserProfile, &row).await.unwrap() {
            MatchResult::Matched { record, reason } => {
                assert_eq!(record.id, 1);
                assert_eq!(reason, MatchReason::DateOfBirth);
            }
            other => panic!("expected match, got {:?}", other),
        }

        // Neither phone nor birth date, full name hits record 2.
        let row = user_row("+639179999999", "2000-12-31", "Maria", "Santos");
        match matcher.classify_row(&UserProfile, &row).await.unwrap() {
            MatchResult::Matched { record, reason } => {
                assert_eq!(record.id, 2);
                assert_eq!(reason, MatchReason::FullName);
            }
            other => panic!("expected match, got {:?}", other),
        }

        // Nothing at all.
        let row = user_row("+639179999999", "2000-12-31", "Pedro", "Penduko");
        assert!(matcher
            .classify_row(&UserProfile, &row)
            .await
            .unwrap()
            .is_new());
    }

    #[tokio::test]
    async fn test_most_recent_wins_within_a_key() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let now = Utc::now();
        seed_user(&store, 1, "+639171234567", "1990-05-15", "Maria", "Santos", now - Duration::days(2)).await;
        seed_user(&store, 2, "+639171234567", "1990-05-15", "Maria", "Santos", now).await;

        let matcher = RecordMatcher::new(&store);
        let row = user_row("+639171234567", "1990-05-15", "Maria", "Santos");
        match matcher.classify_row(&UserProfile, &row).await.unwrap() {
            MatchResult::Matched { record, .. } => assert_eq!(record.id, 2),
            other => panic!("expected match, got {:?}", other),
        }
    }

    async fn seed_history(
        store: &SqliteRecordStore,
        id: i64,
        user_id: &str,
        created_at: chrono::DateTime<Utc>,
    ) {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(id));
        fields.insert("user_id".to_string(), json!(user_id));
        fields.insert("created_at".to_string(), json!(created_at.to_rfc3339()));
        store.insert("health_history", &fields).await.unwrap();
    }

    fn history_row(user_id: &str, timestamp: Option<chrono::DateTime<Utc>>) -> NormalizedRow {
        NormalizedRow {
            row_number: 2,
            external_id: Some(user_id.to_string()),
            identity: Identity::default(),
            timestamp,
            payload: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_exact_timestamp_beats_most_recent() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let now = Utc::now();
        let older = now - Duration::days(3);
        seed_history(&store, 1, "17", older).await;
        seed_history(&store, 2, "17", now).await;

        let matcher = RecordMatcher::new(&store);

        // Within the one-second window of the older entry.
        let row = history_row("17", Some(older + Duration::milliseconds(500)));
        match matcher
            .classify_row(&HealthHistoryProfile, &row)
            .await
            .unwrap()
        {
            MatchResult::Matched { record, reason } => {
                assert_eq!(record.id, 1);
                assert_eq!(reason, MatchReason::ExactTimestamp);
            }
            other => panic!("expected match, got {:?}", other),
        }

        // Outside every window: falls back to the newest entry.
        let row = history_row("17", Some(now - Duration::days(1)));
        match matcher
            .classify_row(&HealthHistoryProfile, &row)
            .await
            .unwrap()
        {
            MatchResult::Matched { record, reason } => {
                assert_eq!(record.id, 2);
                assert_eq!(reason, MatchReason::MostRecentForSubject);
            }
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_subject_is_new() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let matcher = RecordMatcher::new(&store);
        let row = history_row("99", Some(Utc::now()));
        assert!(matcher
            .classify_row(&HealthHistoryProfile, &row)
            .await
            .unwrap()
            .is_new());
    }
}
