// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exchange log writes and reads.

use std::str::FromStr;

use flowlink_core::{
    Connection, Direction, ExchangeLog, ExchangeStatus, FlowlinkError, NewExchangeLog,
};
use rusqlite::types::Type;
use rusqlite::{Row, params};

use crate::database::{Database, map_tr_err};
use crate::queries::connections::select_connection;

fn row_to_log(row: &Row<'_>) -> rusqlite::Result<ExchangeLog> {
    let direction: String = row.get(2)?;
    let status: String = row.get(3)?;
    Ok(ExchangeLog {
        id: row.get(0)?,
        connection_id: row.get(1)?,
        direction: Direction::from_str(&direction)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        status: ExchangeStatus::from_str(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        payload: row.get(4)?,
        response_code: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Insert a log entry and stamp the owning connection in one transaction.
///
/// Fails without writing anything when the connection does not exist.
pub async fn record_exchange(
    db: &Database,
    log: &NewExchangeLog,
    last_sync_status: &str,
) -> Result<(ExchangeLog, Connection), FlowlinkError> {
    let log = log.clone();
    let last_sync_status = last_sync_status.to_string();
    db.connection()
        .call(move |conn| -> Result<(ExchangeLog, Connection), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO exchange_logs
                     (connection_id, direction, status, payload, response_code, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    log.connection_id,
                    log.direction.to_string(),
                    log.status.to_string(),
                    log.payload,
                    log.response_code,
                    log.created_at,
                ],
            )?;
            let log_id = tx.last_insert_rowid();

            let touched = tx.execute(
                "UPDATE connections
                 SET last_synced_at = ?1, last_sync_status = ?2, updated_at = ?1
                 WHERE id = ?3",
                params![log.created_at, last_sync_status, log.connection_id],
            )?;
            if touched == 0 {
                // Dropping the transaction rolls back the insert.
                return Err(rusqlite::Error::QueryReturnedNoRows);
            }

            let stored = tx.query_row(
                "SELECT id, connection_id, direction, status, payload, response_code, created_at
                 FROM exchange_logs WHERE id = ?1",
                params![log_id],
                row_to_log,
            )?;
            let connection =
                select_connection(&tx, log.connection_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok((stored, connection))
        })
        .await
        .map_err(map_tr_err)
}

/// Logs for a connection, newest first. `None` returns every entry.
pub async fn list_logs(
    db: &Database,
    connection_id: i64,
    limit: Option<i64>,
) -> Result<Vec<ExchangeLog>, FlowlinkError> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.unwrap_or(-1);
    db.connection()
        .call(move |conn| -> Result<Vec<ExchangeLog>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, connection_id, direction, status, payload, response_code, created_at
                 FROM exchange_logs
                 WHERE connection_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![connection_id, limit], row_to_log)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of log entries for a connection.
pub async fn count_logs(db: &Database, connection_id: i64) -> Result<i64, FlowlinkError> {
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM exchange_logs WHERE connection_id = ?1",
                params![connection_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
