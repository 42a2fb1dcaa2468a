// ==========================================
// mHealth Barangay San Cristobal - Field Mapper
// ==========================================
// Responsibility: locate columns in a raw row regardless of how the
//                 spreadsheet author spelled the header
// ==========================================

use crate::importer::file_parser::RawRow;

/// Canonical form of a header label: lowercase with every
/// non-alphanumeric character removed. "Date of Birth", "date_of_birth"
/// and "DateOfBirth" all collapse to "dateofbirth".
pub fn normalize_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Value of the column whose normalized label matches `name`, trimmed.
/// Empty string when the column is absent.
pub fn find_field(row: &RawRow, name: &str) -> String {
    let wanted = normalize_key(name);
    row.iter()
        .find(|(label, _)| normalize_key(label) == wanted)
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}

/// Like `find_field` but `None` when the column is absent or blank.
pub fn find_field_opt(row: &RawRow, name: &str) -> Option<String> {
    let value = find_field(row, name);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// First non-blank value among the given header aliases.
pub fn find_field_any(row: &RawRow, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| find_field_opt(row, name))
}
