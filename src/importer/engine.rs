// ==========================================
// mHealth Barangay San Cristobal - Import Engine
// ==========================================
// Orchestrates one batch: classify every row against the store, then
// apply creates and updates in input order. A row failure never stops
// the batch; only batch setup (seeding the identifier sequence) is
// fatal.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{
    BatchCounts, BatchSummary, ImportOutcome, MatchResult, NormalizedRow, RowClassification,
    RowError,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, UniversalFileParser};
use crate::importer::matcher::RecordMatcher;
use crate::importer::profile::ImportProfile;
use crate::importer::sequence::IdSequence;
use crate::notify::Notifier;
use crate::repository::RecordStore;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Spreadsheet row numbering starts below the header row.
const FIRST_DATA_ROW: usize = 2;

pub struct ImportEngine<S: RecordStore> {
    store: S,
    notifier: Option<Box<dyn Notifier>>,
    config: ImportConfig,
}

impl<S: RecordStore> ImportEngine<S> {
    pub fn new(store: S, config: ImportConfig) -> Self {
        Self {
            store,
            notifier: None,
            config,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ==========================================
    // Phase 1: classify (read-only)
    // ==========================================
    /// Normalize and match every raw row without writing anything.
    /// The result can be shown as a preview or fed straight to `apply`.
    pub async fn classify(
        &self,
        profile: &dyn ImportProfile,
        raw_rows: &[RawRow],
    ) -> ImportResult<Vec<RowClassification>> {
        let matcher = RecordMatcher::new(&self.store);
        let mut classifications = Vec::with_capacity(raw_rows.len());

        for (idx, raw) in raw_rows.iter().enumerate() {
            let row_number = idx + FIRST_DATA_ROW;

            let row = match profile.normalize(raw, row_number, &self.config) {
                Ok(row) => row,
                Err(err) => {
                    classifications.push(RowClassification::Invalid {
                        row_number,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            // A lookup failure fails this row, not the batch.
            match matcher.classify_row(profile, &row).await {
                Ok(result) => classifications.push(RowClassification::Ready { row, result }),
                Err(err) => classifications.push(RowClassification::Invalid {
                    row_number,
                    message: err.to_string(),
                }),
            }
        }

        Ok(classifications)
    }

    // ==========================================
    // Phase 2: apply (writes)
    // ==========================================
    pub async fn apply(
        &self,
        profile: &dyn ImportProfile,
        classifications: Vec<RowClassification>,
    ) -> ImportResult<BatchSummary> {
        let batch_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        // Seeding the sequence is the one step that aborts the batch.
        let max_id = self
            .store
            .query_max_id(profile.table(), profile.id_field())
            .await
            .map_err(|e| ImportError::BatchSetup(e.to_string()))?;
        let mut sequence = IdSequence::seeded_from_max(max_id);

        info!(
            batch_id = %batch_id,
            table = profile.table(),
            rows = classifications.len(),
            next_id = sequence.peek(),
            "applying import batch"
        );

        let mut counts = BatchCounts::default();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for classification in classifications {
            let row_number = classification.row_number();
            let outcome = self
                .apply_row(profile, &batch_id, classification, &mut sequence, &mut warnings)
                .await;
            match outcome {
                ImportOutcome::Created(_) => counts.created += 1,
                ImportOutcome::Updated(_) => counts.updated += 1,
                ImportOutcome::Failed(message) => {
                    counts.failed += 1;
                    errors.push(RowError {
                        row_number,
                        message,
                    });
                }
            }
        }

        let summary = BatchSummary {
            batch_id,
            counts,
            errors,
            warnings,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            batch_id = %summary.batch_id,
            created = summary.counts.created,
            updated = summary.counts.updated,
            failed = summary.counts.failed,
            elapsed_ms = summary.elapsed_ms,
            "import batch finished"
        );

        Ok(summary)
    }

    /// Classify then apply in one call.
    pub async fn import(
        &self,
        profile: &dyn ImportProfile,
        raw_rows: &[RawRow],
    ) -> ImportResult<BatchSummary> {
        let classifications = self.classify(profile, raw_rows).await?;
        self.apply(profile, classifications).await
    }

    /// Parse a spreadsheet and import it.
    pub async fn import_file(
        &self,
        profile: &dyn ImportProfile,
        path: impl AsRef<Path>,
    ) -> ImportResult<BatchSummary> {
        let raw_rows = UniversalFileParser.parse(path.as_ref())?;
        info!(
            file = %path.as_ref().display(),
            rows = raw_rows.len(),
            "parsed import file"
        );
        self.import(profile, &raw_rows).await
    }

    /// Apply one classified row. Failures are captured in the outcome,
    /// never propagated; the batch keeps going.
    async fn apply_row(
        &self,
        profile: &dyn ImportProfile,
        batch_id: &str,
        classification: RowClassification,
        sequence: &mut IdSequence,
        warnings: &mut Vec<RowError>,
    ) -> ImportOutcome {
        let (row, result) = match classification {
            RowClassification::Invalid { message, .. } => return ImportOutcome::Failed(message),
            RowClassification::Ready { row, result } => (row, result),
        };

        match result {
            MatchResult::NoMatch => {
                let mut fields = profile.insert_fields(&row);
                fields.insert(
                    profile.id_field().to_string(),
                    Value::Number(sequence.peek().into()),
                );
                match self.store.insert(profile.table(), &fields).await {
                    Ok(record) => {
                        sequence.advance();
                        if let Some(warning) = self.send_welcome(profile, &row).await {
                            warnings.push(warning);
                        }
                        info!(
                            batch_id = %batch_id,
                            row = row.row_number,
                            id = record.id,
                            "created"
                        );
                        ImportOutcome::Created(record.id)
                    }
                    Err(err) => ImportOutcome::Failed(err.to_string()),
                }
            }
            MatchResult::Matched { record, reason } => {
                let fields = profile.update_fields(&row);
                match self.store.update(profile.table(), record.id, &fields).await {
                    Ok(_) => {
                        info!(
                            batch_id = %batch_id,
                            row = row.row_number,
                            id = record.id,
                            %reason,
                            "updated"
                        );
                        ImportOutcome::Updated(record.id)
                    }
                    Err(err) => ImportOutcome::Failed(err.to_string()),
                }
            }
        }
    }

    /// Best effort: a delivery failure becomes a warning on the summary
    /// and never demotes the created row.
    async fn send_welcome(
        &self,
        profile: &dyn ImportProfile,
        row: &NormalizedRow,
    ) -> Option<RowError> {
        if !self.config.notify_new_subjects {
            return None;
        }
        let notifier = self.notifier.as_ref()?;
        let contact = profile.contact_for(row)?;

        match notifier.notify(&contact).await {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    row = row.row_number,
                    phone = %contact.phone,
                    error = %err,
                    "welcome notification failed"
                );
                Some(RowError {
                    row_number: row.row_number,
                    message: format!("notification failed: {}", err),
                })
            }
        }
    }
}
