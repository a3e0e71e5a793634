//! Schema for the atlas container: a layer manifest plus one feature table
//! per layer.

use rusqlite::{Connection, Error as SqliteError, Transaction};
use thiserror::Error;

/// Initialise the container schema inside an open SQLite connection.
pub(super) fn initialise_schema(connection: &mut Connection) -> Result<(), ContainerSchemaError> {
    let transaction = connection
        .transaction()
        .map_err(|source| ContainerSchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;
    run_migration_step(
        &transaction,
        "create layer manifest",
        "CREATE TABLE IF NOT EXISTS atlas_layers (
            layer_name TEXT PRIMARY KEY CHECK (length(trim(layer_name)) > 0),
            geometry_class TEXT NOT NULL,
            feature_count INTEGER NOT NULL CHECK (feature_count >= 0),
            written_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;
    transaction
        .commit()
        .map_err(|source| ContainerSchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

/// Create the feature table for one layer.
///
/// Layer names come from the closed geometry-class set, so interpolating
/// them into DDL is safe.
pub(super) fn create_layer_table(
    transaction: &Transaction<'_>,
    layer_name: &'static str,
) -> Result<(), ContainerSchemaError> {
    run_migration_step(
        transaction,
        "create layer table",
        &format!(
            "CREATE TABLE IF NOT EXISTS \"{layer_name}\" (
                fid INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                country TEXT NOT NULL,
                properties TEXT NOT NULL,
                geometry TEXT NOT NULL
            )"
        ),
    )
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), ContainerSchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| ContainerSchemaError::Migration { step, source })
}

/// Errors raised when initialising the container schema.
#[derive(Debug, Error)]
pub enum ContainerSchemaError {
    #[error("failed to execute migration step '{step}'")]
    Migration {
        step: &'static str,
        #[source]
        source: SqliteError,
    },
}
