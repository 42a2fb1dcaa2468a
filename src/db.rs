// ==========================================
// mHealth Barangay San Cristobal - SQLite Bootstrap
// ==========================================
// Goals:
// - one place for Connection::open PRAGMA behavior
// - unified busy_timeout to reduce spurious busy errors under
//   concurrent writers
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// Default busy_timeout (milliseconds).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply the unified PRAGMAs to a connection.
///
/// foreign_keys and busy_timeout are per-connection settings, so every
/// open path must come through here.
pub fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration.
pub fn open_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Create the program's tables when they do not exist yet.
///
/// Identifiers are assigned by the import engine, so both primary keys
/// are plain INTEGER PRIMARY KEY columns; a cross-batch identifier
/// collision fails the insert instead of silently overwriting.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY,
            first_name    TEXT,
            middle_name   TEXT,
            last_name     TEXT,
            date_of_birth TEXT,
            gender        TEXT,
            phone         TEXT,
            email         TEXT,
            role          TEXT,
            status        TEXT,
            is_online     TEXT,
            created_at    TEXT
        );

        CREATE TABLE IF NOT EXISTS health_history (
            id                    INTEGER PRIMARY KEY,
            user_id               TEXT,
            allergy               TEXT,
            immunizations         TEXT,
            surgical_history      TEXT,
            neurologic            TEXT,
            family_history        TEXT,
            family_history_other  TEXT,
            past_history          TEXT,
            past_history_other    TEXT,
            lab_requests          TEXT,
            menstrual_history     TEXT,
            pregnancy_history     TEXT,
            general_survey        TEXT,
            skin_condition        TEXT,
            heent_condition       TEXT,
            chest_condition       TEXT,
            heart_condition       TEXT,
            abdomen_condition     TEXT,
            extremities_condition TEXT,
            smoking_history       TEXT,
            drinking_history      TEXT,
            exercise_history      TEXT,
            social_history_other  TEXT,
            gravida               TEXT,
            para                  TEXT,
            pe_findings           TEXT,
            term                  TEXT,
            premature             TEXT,
            abortion              TEXT,
            live_birth            TEXT,
            created_at            TEXT
        );
        "#,
    )
}
