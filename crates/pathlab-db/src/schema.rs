//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs, dates (`YYYY-MM-DD`) and slot times (`HH:MM`) are stored as
//! strings. Enums are stored as strings with ASSERT constraints.
//!
//! Slot exclusivity is enforced by the `slot_hold` table: a hold's
//! record id is derived deterministically from (service, date, slot),
//! so the second of two concurrent reservations fails inside the
//! storage engine.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Diagnostic services
-- =======================================================================
DEFINE TABLE service SCHEMAFULL;
DEFINE FIELD name ON TABLE service TYPE string;
DEFINE FIELD price ON TABLE service TYPE int ASSERT $value >= 0;
DEFINE FIELD duration_minutes ON TABLE service TYPE int \
    ASSERT $value > 0;
DEFINE FIELD department ON TABLE service TYPE string;
DEFINE FIELD home_collection ON TABLE service TYPE bool DEFAULT false;
DEFINE FIELD active ON TABLE service TYPE bool DEFAULT true;
DEFINE FIELD hours ON TABLE service TYPE object;
DEFINE FIELD hours.open ON TABLE service TYPE string;
DEFINE FIELD hours.close ON TABLE service TYPE string;
DEFINE FIELD hours.slot_minutes ON TABLE service TYPE int \
    ASSERT $value > 0;
DEFINE FIELD hours.break_start ON TABLE service TYPE option<string>;
DEFINE FIELD hours.break_end ON TABLE service TYPE option<string>;
DEFINE FIELD hours.day_off ON TABLE service TYPE string \
    ASSERT $value IN ['Mon', 'Tue', 'Wed', 'Thu', 'Fri', 'Sat', 'Sun'];
DEFINE FIELD created_at ON TABLE service TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE service TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_service_name ON TABLE service COLUMNS name UNIQUE;

-- =======================================================================
-- Users (patients and admins)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD phone ON TABLE user TYPE option<string>;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['user', 'admin'];
DEFINE FIELD active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Employees (staff with granted permission sets)
-- =======================================================================
DEFINE TABLE employee SCHEMAFULL;
DEFINE FIELD name ON TABLE employee TYPE string;
DEFINE FIELD email ON TABLE employee TYPE string;
DEFINE FIELD password_hash ON TABLE employee TYPE string;
DEFINE FIELD department ON TABLE employee TYPE string;
DEFINE FIELD permissions ON TABLE employee TYPE array DEFAULT [];
DEFINE FIELD permissions.* ON TABLE employee TYPE string \
    ASSERT $value IN ['view_appointments', 'edit_appointments', \
    'view_reports', 'edit_reports', 'manage_services', 'manage_users', \
    'manage_employees', 'view_audit_logs'];
DEFINE FIELD active ON TABLE employee TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_employee_email ON TABLE employee COLUMNS email UNIQUE;

-- =======================================================================
-- Sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD actor_id ON TABLE session TYPE string;
DEFINE FIELD role ON TABLE session TYPE string \
    ASSERT $value IN ['user', 'employee', 'admin'];
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_actor ON TABLE session COLUMNS actor_id;

-- =======================================================================
-- Appointments (status transitions only, never deleted)
-- =======================================================================
DEFINE TABLE appointment SCHEMAFULL;
DEFINE FIELD patient_id ON TABLE appointment TYPE string;
DEFINE FIELD service_id ON TABLE appointment TYPE string;
DEFINE FIELD employee_id ON TABLE appointment TYPE option<string>;
DEFINE FIELD date ON TABLE appointment TYPE string;
DEFINE FIELD slot ON TABLE appointment TYPE string;
DEFINE FIELD location ON TABLE appointment TYPE string \
    ASSERT $value IN ['lab', 'home'];
DEFINE FIELD status ON TABLE appointment TYPE string \
    ASSERT $value IN ['scheduled', 'completed', 'cancelled'];
DEFINE FIELD payment_status ON TABLE appointment TYPE string \
    ASSERT $value IN ['pending', 'paid', 'refunded'];
DEFINE FIELD amount ON TABLE appointment TYPE int ASSERT $value >= 0;
DEFINE FIELD created_at ON TABLE appointment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE appointment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_appointment_service_date ON TABLE appointment \
    COLUMNS service_id, date;
DEFINE INDEX idx_appointment_patient ON TABLE appointment \
    COLUMNS patient_id;

-- =======================================================================
-- Slot holds (capacity guard; record id = service:date:slot)
-- =======================================================================
DEFINE TABLE slot_hold SCHEMAFULL;
DEFINE FIELD service_id ON TABLE slot_hold TYPE string;
DEFINE FIELD date ON TABLE slot_hold TYPE string;
DEFINE FIELD slot ON TABLE slot_hold TYPE string;
DEFINE FIELD appointment_id ON TABLE slot_hold TYPE string;
DEFINE INDEX idx_slot_hold_service_date ON TABLE slot_hold \
    COLUMNS service_id, date;

-- =======================================================================
-- Audit Log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_id ON TABLE audit_log TYPE string;
DEFINE FIELD action ON TABLE audit_log TYPE string \
    ASSERT $value IN ['create', 'update', 'delete', 'login', 'logout', \
    'grant', 'book', 'cancel', 'complete', 'archive'];
DEFINE FIELD entity_type ON TABLE audit_log TYPE string \
    ASSERT $value IN ['service', 'user', 'employee', 'appointment', \
    'session'];
DEFINE FIELD entity_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD details ON TABLE audit_log TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_time ON TABLE audit_log COLUMNS timestamp;
DEFINE INDEX idx_audit_actor ON TABLE audit_log COLUMNS actor_id;
DEFINE INDEX idx_audit_entity ON TABLE audit_log \
    COLUMNS entity_type, entity_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn audit_table_denies_update_and_delete() {
        let table_def = SCHEMA_V1
            .split("DEFINE TABLE")
            .find(|chunk| chunk.contains("audit_log"))
            .expect("audit_log table defined");
        assert!(table_def.contains("FOR update NONE"));
        assert!(table_def.contains("FOR delete NONE"));
    }
}
