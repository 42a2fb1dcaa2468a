// ==========================================
// mHealth Barangay San Cristobal - Import Configuration
// ==========================================
// Responsibility: knobs the operator can set per import run
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ValidationMode
// ==========================================
// Lenient reproduces the historical dashboard behavior: unrecognized
// gender strings pass through unchanged and phone numbers are accepted
// with any digit count. Strict rejects both per row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub validation: ValidationMode,
    /// Country calling code prepended during phone canonicalization.
    pub country_code: String,
    /// Maximum error entries shown to a human; the summary keeps them all.
    pub error_preview_limit: usize,
    /// Send the welcome SMS after each successful create.
    pub notify_new_subjects: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            validation: ValidationMode::Lenient,
            country_code: "63".to_string(),
            error_preview_limit: 3,
            notify_new_subjects: true,
        }
    }
}

impl ImportConfig {
    pub fn strict() -> Self {
        Self {
            validation: ValidationMode::Strict,
            ..Self::default()
        }
    }
}
