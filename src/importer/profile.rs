// ==========================================
// mHealth Barangay San Cristobal - Import Profiles
// ==========================================
// Responsibility: everything entity-specific about an import. The
// engine and matcher are generic; a profile tells them which table to
// touch, how to normalize a raw row, and which keys identify a subject.
// ==========================================

use crate::config::{ImportConfig, ValidationMode};
use crate::domain::{Contact, Identity, NormalizedRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{find_field, find_field_opt};
use crate::importer::file_parser::RawRow;
use crate::importer::normalizer;
use chrono::Utc;
use serde_json::{Map, Value};

/// Identity fields tried, in order, when a row carries no explicit
/// subject identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalKey {
    Phone,
    DateOfBirth,
    FullName,
}

// ==========================================
// ImportProfile Trait
// ==========================================
// Implementors: UserProfile, HealthHistoryProfile
pub trait ImportProfile: Send + Sync {
    /// Target table in the record store.
    fn table(&self) -> &'static str;

    /// Column holding the engine-assigned numeric identifier.
    fn id_field(&self) -> &'static str {
        "id"
    }

    /// Column holding an explicit subject reference carried by the row,
    /// when the entity has one.
    fn external_id_field(&self) -> Option<&'static str> {
        None
    }

    /// Identity fields to try, in precedence order, when no explicit
    /// reference matches.
    fn natural_keys(&self) -> &[NaturalKey] {
        &[]
    }

    /// Normalize one raw row. Errors here fail the row, never the batch.
    fn normalize(
        &self,
        raw: &RawRow,
        row_number: usize,
        config: &ImportConfig,
    ) -> ImportResult<NormalizedRow>;

    /// Columns written when the row creates a new record. The engine
    /// adds the identifier itself.
    fn insert_fields(&self, row: &NormalizedRow) -> Map<String, Value>;

    /// Columns overwritten when the row updates an existing record.
    fn update_fields(&self, row: &NormalizedRow) -> Map<String, Value>;

    /// Who to notify after a successful create, if anyone.
    fn contact_for(&self, _row: &NormalizedRow) -> Option<Contact> {
        None
    }
}

// ==========================================
// UserProfile - barangay resident accounts
// ==========================================
pub struct UserProfile;

impl ImportProfile for UserProfile {
    fn table(&self) -> &'static str {
        "users"
    }

    fn natural_keys(&self) -> &[NaturalKey] {
        &[
            NaturalKey::Phone,
            NaturalKey::DateOfBirth,
            NaturalKey::FullName,
        ]
    }

    fn normalize(
        &self,
        raw: &RawRow,
        row_number: usize,
        config: &ImportConfig,
    ) -> ImportResult<NormalizedRow> {
        let required = |field: &str| -> ImportResult<String> {
            find_field_opt(raw, field).ok_or_else(|| ImportError::MissingRequiredField {
                row: row_number,
                field: field.to_string(),
            })
        };

        let first_name = required("first_name")?;
        let last_name = required("last_name")?;
        let raw_dob = required("date_of_birth")?;
        let raw_phone = required("phone")?;

        let date_of_birth =
            normalizer::normalize_date(&raw_dob).ok_or(ImportError::InvalidDateFormat {
                row: row_number,
                value: raw_dob.clone(),
            })?;

        let phone = normalizer::normalize_phone(&raw_phone, &config.country_code);
        if config.validation == ValidationMode::Strict
            && !normalizer::is_valid_mobile(&phone, &config.country_code)
        {
            return Err(ImportError::InvalidPhoneFormat {
                row: row_number,
                value: raw_phone,
            });
        }

        let gender = normalizer::normalize_gender(&find_field(raw, "gender"));
        if config.validation == ValidationMode::Strict
            && !normalizer::is_recognized_gender(&gender)
        {
            return Err(ImportError::InvalidGenderValue {
                row: row_number,
                value: gender,
            });
        }

        let middle_name = find_field(raw, "middle_name");
        let email = find_field(raw, "email");
        let role = {
            let value = find_field(raw, "role").to_lowercase();
            if value.is_empty() {
                "patient".to_string()
            } else {
                value
            }
        };

        let mut payload = Map::new();
        payload.insert("first_name".to_string(), Value::String(first_name.clone()));
        payload.insert(
            "middle_name".to_string(),
            if middle_name.is_empty() {
                Value::Null
            } else {
                Value::String(middle_name)
            },
        );
        payload.insert("last_name".to_string(), Value::String(last_name.clone()));
        payload.insert(
            "date_of_birth".to_string(),
            Value::String(normalizer::to_storage_date(date_of_birth)),
        );
        payload.insert("gender".to_string(), Value::String(gender));
        payload.insert("phone".to_string(), Value::String(phone.clone()));
        payload.insert("email".to_string(), Value::String(email));
        payload.insert("role".to_string(), Value::String(role));

        Ok(NormalizedRow {
            row_number,
            external_id: None,
            identity: Identity {
                first_name: Some(first_name),
                last_name: Some(last_name),
                date_of_birth: Some(date_of_birth),
                phone: Some(phone),
            },
            timestamp: None,
            payload,
        })
    }

    fn insert_fields(&self, row: &NormalizedRow) -> Map<String, Value> {
        let mut fields = row.payload.clone();
        fields.insert("status".to_string(), Value::String("active".to_string()));
        fields.insert("is_online".to_string(), Value::String("no".to_string()));
        fields.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        fields
    }

    /// Updates never touch date_of_birth, status or created_at; those
    /// stay as the existing record has them.
    fn update_fields(&self, row: &NormalizedRow) -> Map<String, Value> {
        let mut fields = row.payload.clone();
        fields.remove("date_of_birth");
        fields
    }

    fn contact_for(&self, row: &NormalizedRow) -> Option<Contact> {
        if row.payload.get("role").and_then(Value::as_str) == Some("admin") {
            return None;
        }
        let phone = row.identity.phone.clone().filter(|p| !p.is_empty())?;
        let display_name = row.identity.first_name.clone().unwrap_or_default();
        Some(Contact {
            phone,
            display_name,
        })
    }
}

// ==========================================
// HealthHistoryProfile - clinical history entries
// ==========================================
// Rows reference their subject through user_id; there are no natural
// keys to fall back on.
pub struct HealthHistoryProfile;

/// Payload columns copied verbatim from the sheet into the record.
pub(crate) const HEALTH_HISTORY_FIELDS: &[&str] = &[
    "allergy",
    "immunizations",
    "surgical_history",
    "neurologic",
    "family_history",
    "family_history_other",
    "past_history",
    "past_history_other",
    "lab_requests",
    "menstrual_history",
    "pregnancy_history",
    "general_survey",
    "skin_condition",
    "heent_condition",
    "chest_condition",
    "heart_condition",
    "abdomen_condition",
    "extremities_condition",
    "smoking_history",
    "drinking_history",
    "exercise_history",
    "social_history_other",
    "gravida",
    "para",
    "pe_findings",
    "term",
    "premature",
    "abortion",
    "live_birth",
];

impl ImportProfile for HealthHistoryProfile {
    fn table(&self) -> &'static str {
        "health_history"
    }

    fn external_id_field(&self) -> Option<&'static str> {
        Some("user_id")
    }

    fn normalize(
        &self,
        raw: &RawRow,
        row_number: usize,
        _config: &ImportConfig,
    ) -> ImportResult<NormalizedRow> {
        let user_id =
            find_field_opt(raw, "user_id").ok_or_else(|| ImportError::MissingRequiredField {
                row: row_number,
                field: "user_id".to_string(),
            })?;

        // An unparseable timestamp is not an error; the row simply has
        // no instant to match on and gets stamped at insert time.
        let timestamp = normalizer::normalize_timestamp(&find_field(raw, "created_at"), Utc::now());

        let mut payload = Map::new();
        payload.insert("user_id".to_string(), Value::String(user_id.clone()));
        for field in HEALTH_HISTORY_FIELDS {
            payload.insert(field.to_string(), Value::String(find_field(raw, field)));
        }

        Ok(NormalizedRow {
            row_number,
            external_id: Some(user_id),
            identity: Identity::default(),
            timestamp,
            payload,
        })
    }

    fn insert_fields(&self, row: &NormalizedRow) -> Map<String, Value> {
        let mut fields = row.payload.clone();
        let created_at = row.timestamp.unwrap_or_else(Utc::now);
        fields.insert(
            "created_at".to_string(),
            Value::String(created_at.to_rfc3339()),
        );
        fields
    }

    fn update_fields(&self, row: &NormalizedRow) -> Map<String, Value> {
        // created_at of the existing entry is preserved.
        row.payload.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn user_row() -> RawRow {
        let mut row = HashMap::new();
        row.insert("First Name".to_string(), "Maria".to_string());
        row.insert("Last Name".to_string(), "Santos".to_string());
        row.insert("Date of Birth".to_string(), "15/05/1990".to_string());
        row.insert("Phone".to_string(), "09171234567".to_string());
        row.insert("Gender".to_string(), "female".to_string());
        row.insert("Role".to_string(), "Patient".to_string());
        row
    }

    #[test]
    fn test_user_normalize_canonical_forms() {
        let profile = UserProfile;
        let row = profile
            .normalize(&user_row(), 2, &ImportConfig::default())
            .unwrap();

        assert_eq!(row.identity.phone.as_deref(), Some("+639171234567"));
        assert_eq!(
            row.payload.get("date_of_birth").and_then(Value::as_str),
            Some("1990-05-15")
        );
        assert_eq!(
            row.payload.get("gender").and_then(Value::as_str),
            Some("F")
        );
        assert_eq!(
            row.payload.get("role").and_then(Value::as_str),
            Some("patient")
        );
        assert_eq!(
            row.payload.get("middle_name"),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_user_normalize_missing_required_field() {
        let mut raw = user_row();
        raw.remove("Phone");
        let err = UserProfile
            .normalize(&raw, 5, &ImportConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingRequiredField { row: 5, .. }
        ));
    }

    #[test]
    fn test_user_normalize_bad_date() {
        let mut raw = user_row();
        raw.insert("Date of Birth".to_string(), "someday".to_string());
        let err = UserProfile
            .normalize(&raw, 3, &ImportConfig::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidDateFormat { row: 3, .. }));
    }

    #[test]
    fn test_user_strict_mode_rejects_short_phone() {
        let mut raw = user_row();
        raw.insert("Phone".to_string(), "12345".to_string());

        // Lenient keeps it.
        assert!(UserProfile
            .normalize(&raw, 2, &ImportConfig::default())
            .is_ok());
        // Strict rejects it.
        let err = UserProfile
            .normalize(&raw, 2, &ImportConfig::strict())
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidPhoneFormat { .. }));
    }

    #[test]
    fn test_user_strict_mode_rejects_unrecognized_gender() {
        let mut raw = user_row();
        raw.insert("Gender".to_string(), "unknown".to_string());
        let err = UserProfile
            .normalize(&raw, 2, &ImportConfig::strict())
            .unwrap_err();
        assert!(matches!(err, ImportError::InvalidGenderValue { .. }));
    }

    #[test]
    fn test_user_update_excludes_protected_columns() {
        let row = UserProfile
            .normalize(&user_row(), 2, &ImportConfig::default())
            .unwrap();
        let insert = UserProfile.insert_fields(&row);
        let update = UserProfile.update_fields(&row);

        assert!(insert.contains_key("date_of_birth"));
        assert!(insert.contains_key("status"));
        assert!(insert.contains_key("created_at"));
        assert!(!update.contains_key("date_of_birth"));
        assert!(!update.contains_key("status"));
        assert!(!update.contains_key("created_at"));
    }

    #[test]
    fn test_user_contact_skips_admins() {
        let mut raw = user_row();
        let row = UserProfile
            .normalize(&raw, 2, &ImportConfig::default())
            .unwrap();
        let contact = UserProfile.contact_for(&row).unwrap();
        assert_eq!(contact.phone, "+639171234567");
        assert_eq!(contact.display_name, "Maria");

        raw.insert("Role".to_string(), "Admin".to_string());
        let admin = UserProfile
            .normalize(&raw, 2, &ImportConfig::default())
            .unwrap();
        assert!(UserProfile.contact_for(&admin).is_none());
    }

    #[test]
    fn test_health_history_normalize() {
        let mut raw = HashMap::new();
        raw.insert("User ID".to_string(), "17".to_string());
        raw.insert("Allergy".to_string(), "penicillin".to_string());
        raw.insert(
            "Created At".to_string(),
            "2023-05-15 08:30:00".to_string(),
        );

        let row = HealthHistoryProfile
            .normalize(&raw, 4, &ImportConfig::default())
            .unwrap();

        assert_eq!(row.external_id.as_deref(), Some("17"));
        assert!(row.timestamp.is_some());
        assert_eq!(
            row.payload.get("allergy").and_then(Value::as_str),
            Some("penicillin")
        );
        // Absent payload columns come through as empty strings.
        assert_eq!(
            row.payload.get("smoking_history").and_then(Value::as_str),
            Some("")
        );
    }

    #[test]
    fn test_health_history_requires_user_id() {
        let raw = HashMap::new();
        let err = HealthHistoryProfile
            .normalize(&raw, 2, &ImportConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingRequiredField { row: 2, .. }
        ));
    }

    #[test]
    fn test_health_history_bad_timestamp_is_not_fatal() {
        let mut raw = HashMap::new();
        raw.insert("User ID".to_string(), "17".to_string());
        raw.insert("Created At".to_string(), "yesterday-ish".to_string());

        let row = HealthHistoryProfile
            .normalize(&raw, 2, &ImportConfig::default())
            .unwrap();
        assert!(row.timestamp.is_none());
        // Insert falls back to a fresh stamp.
        assert!(HealthHistoryProfile
            .insert_fields(&row)
            .contains_key("created_at"));
    }
}
