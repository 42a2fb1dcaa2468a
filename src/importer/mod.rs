// ==========================================
// mHealth Barangay San Cristobal - Import Pipeline
// ==========================================
// Phases: file parsing -> field mapping -> normalization -> matching
//         -> apply (create/update) -> summary
// ==========================================

pub mod engine;
pub mod error;
pub mod exporter;
pub mod field_mapper;
pub mod file_parser;
pub mod matcher;
pub mod normalizer;
pub mod profile;
pub mod sequence;

pub use engine::ImportEngine;
pub use error::{ImportError, ImportResult};
pub use exporter::{export_health_history_csv, export_users_csv};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
pub use matcher::RecordMatcher;
pub use profile::{HealthHistoryProfile, ImportProfile, NaturalKey, UserProfile};
pub use sequence::IdSequence;
