// ==========================================
// mHealth Barangay San Cristobal - CLI Entry Point
// ==========================================
// Subcommands: import (preview by default, --commit to write) and
//              export (table back out as CSV)
// ==========================================

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mhealth_import::importer::{
    export_health_history_csv, export_users_csv, UniversalFileParser,
};
use mhealth_import::{
    logging, HealthHistoryProfile, ImportConfig, ImportEngine, ImportProfile, MatchResult,
    RowClassification, SmsGatewayClient, SqliteRecordStore, UserProfile,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mhealth-import",
    version,
    about = "Import reconciliation engine for the mHealth Barangay San Cristobal dashboard"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Entity {
    Users,
    HealthHistory,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a spreadsheet against the database; write with --commit
    Import {
        /// Which table the file feeds
        entity: Entity,
        /// Path to the .csv / .xlsx / .xls file
        file: PathBuf,
        /// SQLite database path
        #[arg(long, default_value = "mhealth.db")]
        db: String,
        /// Apply creates and updates instead of only previewing
        #[arg(long)]
        commit: bool,
        /// Reject malformed phone numbers and unrecognized gender values
        #[arg(long)]
        strict: bool,
        /// Gateway token for the welcome SMS; omit to skip notifications
        #[arg(long, env = "SMS_API_TOKEN")]
        sms_token: Option<String>,
    },
    /// Export a table as CSV in the import column layout
    Export {
        entity: Entity,
        /// Output file path
        #[arg(long)]
        out: PathBuf,
        /// SQLite database path
        #[arg(long, default_value = "mhealth.db")]
        db: String,
    },
}

fn profile_for(entity: Entity) -> Box<dyn ImportProfile> {
    match entity {
        Entity::Users => Box::new(UserProfile),
        Entity::HealthHistory => Box::new(HealthHistoryProfile),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Import {
            entity,
            file,
            db,
            commit,
            strict,
            sms_token,
        } => {
            let config = if strict {
                ImportConfig::strict()
            } else {
                ImportConfig::default()
            };
            let preview_limit = config.error_preview_limit;

            let store = SqliteRecordStore::open(&db)?;
            let mut engine = ImportEngine::new(store, config);
            if let Some(token) = sms_token {
                engine = engine.with_notifier(Box::new(SmsGatewayClient::new(token)));
            }
            let profile = profile_for(entity);

            if commit {
                let summary = engine.import_file(profile.as_ref(), &file).await?;
                println!(
                    "batch {}: {} created, {} updated, {} failed ({} ms)",
                    summary.batch_id,
                    summary.counts.created,
                    summary.counts.updated,
                    summary.counts.failed,
                    summary.elapsed_ms
                );
                if !summary.errors.is_empty() {
                    println!("errors:\n{}", summary.error_preview(preview_limit));
                }
                for warning in &summary.warnings {
                    println!("warning: row {}: {}", warning.row_number, warning.message);
                }
            } else {
                let raw_rows = UniversalFileParser.parse(&file)?;
                let classifications = engine.classify(profile.as_ref(), &raw_rows).await?;
                for classification in &classifications {
                    match classification {
                        RowClassification::Ready { row, result } => match result {
                            MatchResult::NoMatch => {
                                println!("row {}: NEW", row.row_number);
                            }
                            MatchResult::Matched { record, reason } => {
                                println!(
                                    "row {}: UPDATE id {} ({})",
                                    row.row_number, record.id, reason
                                );
                            }
                        },
                        RowClassification::Invalid {
                            row_number,
                            message,
                        } => {
                            println!("row {}: INVALID ({})", row_number, message);
                        }
                    }
                }
                println!("preview only; re-run with --commit to write");
            }
        }
        Command::Export { entity, out, db } => {
            let store = SqliteRecordStore::open(&db)?;
            let rows = match entity {
                Entity::Users => export_users_csv(&store, &out).await?,
                Entity::HealthHistory => export_health_history_csv(&store, &out).await?,
            };
            println!("exported {} rows to {}", rows, out.display());
        }
    }

    Ok(())
}
