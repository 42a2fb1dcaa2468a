// ==========================================
// mHealth Barangay San Cristobal - CSV Exporter
// ==========================================
// Writes the current table contents back out in the same column layout
// the import accepts, so an exported file re-imports cleanly.
// ==========================================

use crate::domain::PersistedRecord;
use crate::importer::error::ImportResult;
use crate::importer::normalizer;
use crate::importer::profile::HEALTH_HISTORY_FIELDS;
use crate::repository::RecordStore;
use std::path::Path;
use tracing::info;

/// Stored ISO date rendered in the display form; anything else passes
/// through as stored.
fn display_date(record: &PersistedRecord, field: &str) -> String {
    let raw = record.field_str(field).unwrap_or_default();
    match normalizer::normalize_date(raw) {
        Some(date) => normalizer::to_display_date(date),
        None => raw.to_string(),
    }
}

fn field(record: &PersistedRecord, name: &str) -> String {
    record.field_str(name).unwrap_or_default().to_string()
}

pub async fn export_users_csv<S: RecordStore>(
    store: &S,
    path: impl AsRef<Path>,
) -> ImportResult<usize> {
    let records = store.query_all("users").await?;
    let mut writer = csv::Writer::from_path(path.as_ref())?;

    writer.write_record([
        "First Name",
        "Middle Name",
        "Last Name",
        "Date of Birth",
        "Gender",
        "Phone",
        "Email",
        "Role",
        "Status",
        "Created At",
    ])?;

    for record in &records {
        writer.write_record([
            field(record, "first_name"),
            field(record, "middle_name"),
            field(record, "last_name"),
            display_date(record, "date_of_birth"),
            field(record, "gender"),
            field(record, "phone"),
            field(record, "email"),
            field(record, "role"),
            field(record, "status"),
            field(record, "created_at"),
        ])?;
    }

    writer.flush()?;
    info!(
        file = %path.as_ref().display(),
        rows = records.len(),
        "exported users"
    );
    Ok(records.len())
}

pub async fn export_health_history_csv<S: RecordStore>(
    store: &S,
    path: impl AsRef<Path>,
) -> ImportResult<usize> {
    let records = store.query_all("health_history").await?;
    let mut writer = csv::Writer::from_path(path.as_ref())?;

    let mut headers = vec!["User ID".to_string()];
    headers.extend(HEALTH_HISTORY_FIELDS.iter().map(|f| title_case(f)));
    headers.push("Created At".to_string());
    writer.write_record(&headers)?;

    for record in &records {
        let mut row = vec![field(record, "user_id")];
        row.extend(HEALTH_HISTORY_FIELDS.iter().map(|f| field(record, f)));
        row.push(field(record, "created_at"));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(
        file = %path.as_ref().display(),
        rows = records.len(),
        "exported health history"
    );
    Ok(records.len())
}

/// `smoking_history` becomes `Smoking History`.
fn title_case(field_name: &str) -> String {
    field_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("smoking_history"), "Smoking History");
        assert_eq!(title_case("allergy"), "Allergy");
        assert_eq!(title_case("heent_condition"), "Heent Condition");
    }
}
