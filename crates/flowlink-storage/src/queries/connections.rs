// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection CRUD operations.

use std::str::FromStr;

use flowlink_core::types::now_timestamp;
use flowlink_core::{Connection, ConnectionUpdate, FlowlinkError, NewConnection, PartnerType};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};

const CONNECTION_COLUMNS: &str = "id, name, description, partner_type, settings, is_active,
     created_at, updated_at, last_synced_at, last_sync_status";

/// Map a `connections` row selected with [`CONNECTION_COLUMNS`].
pub(crate) fn row_to_connection(row: &Row<'_>) -> rusqlite::Result<Connection> {
    let partner_type: String = row.get(3)?;
    let partner_type = PartnerType::from_str(&partner_type)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let settings: String = row.get(4)?;
    let settings = serde_json::from_str(&settings)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Connection {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        partner_type,
        settings,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        last_synced_at: row.get(8)?,
        last_sync_status: row.get(9)?,
    })
}

/// Load one connection inside an open connection or transaction.
pub(crate) fn select_connection(
    conn: &rusqlite::Connection,
    id: i64,
) -> rusqlite::Result<Option<Connection>> {
    conn.query_row(
        &format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ?1"),
        params![id],
        row_to_connection,
    )
    .optional()
}

/// Insert a new connection. Returns the stored row.
pub async fn create_connection(
    db: &Database,
    new: &NewConnection,
) -> Result<Connection, FlowlinkError> {
    let new = new.clone();
    let settings = serde_json::to_string(&new.settings).map_err(|e| FlowlinkError::Storage {
        source: Box::new(e),
    })?;
    let now = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<Connection, rusqlite::Error> {
            conn.execute(
                "INSERT INTO connections
                     (name, description, partner_type, settings, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    new.name,
                    new.description,
                    new.partner_type.to_string(),
                    settings,
                    new.is_active,
                    now,
                ],
            )?;
            let id = conn.last_insert_rowid();
            select_connection(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a connection by ID.
pub async fn get_connection(db: &Database, id: i64) -> Result<Option<Connection>, FlowlinkError> {
    db.connection()
        .call(move |conn| select_connection(conn, id))
        .await
        .map_err(map_tr_err)
}

/// List all connections ordered by name.
pub async fn list_connections(db: &Database) -> Result<Vec<Connection>, FlowlinkError> {
    db.connection()
        .call(|conn| -> Result<Vec<Connection>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONNECTION_COLUMNS} FROM connections ORDER BY name ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_connection)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update. Fields left as `None` keep their stored value.
pub async fn update_connection(
    db: &Database,
    id: i64,
    update: &ConnectionUpdate,
) -> Result<Option<Connection>, FlowlinkError> {
    let update = update.clone();
    let settings = update
        .settings
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| FlowlinkError::Storage {
            source: Box::new(e),
        })?;
    let now = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<Option<Connection>, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE connections SET
                     name = COALESCE(?1, name),
                     description = COALESCE(?2, description),
                     settings = COALESCE(?3, settings),
                     is_active = COALESCE(?4, is_active),
                     updated_at = ?5
                 WHERE id = ?6",
                params![
                    update.name,
                    update.description,
                    settings,
                    update.is_active,
                    now,
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_connection(conn, id)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a connection. Its exchange logs go with it (ON DELETE CASCADE).
pub async fn delete_connection(db: &Database, id: i64) -> Result<bool, FlowlinkError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let removed = conn.execute("DELETE FROM connections WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}
