// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable task queue operations.
//!
//! Claims run inside a transaction so two workers never pick the same task.
//! A claim holds a lease (`locked_until`); a `running` task whose lease ran
//! out lost its worker and becomes claimable again.

use std::str::FromStr;
use std::time::Duration;

use flowlink_core::types::{now_timestamp, timestamp_after};
use flowlink_core::{FlowlinkError, TaskRecord, TaskState};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, Transaction, params};
use serde_json::Value;
use tracing::warn;

use crate::database::{Database, map_tr_err};

/// Error text recorded on tasks revoked before or during execution.
pub const REVOKED_ERROR: &str = "revoked";

const TASK_COLUMNS: &str = "id, connection_id, payload, state, attempts, retry_count,
     last_error, result, next_attempt_at, revoked, created_at, updated_at";

fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    let state: String = row.get(3)?;
    let result = match row.get::<_, Option<String>>(7)? {
        Some(_) => Some(json_column(row, 7)?),
        None => None,
    };
    Ok(TaskRecord {
        id: row.get(0)?,
        connection_id: row.get(1)?,
        payload: json_column(row, 2)?,
        state: TaskState::from_str(&state)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        attempts: row.get(4)?,
        retry_count: row.get(5)?,
        last_error: row.get(6)?,
        result,
        next_attempt_at: row.get(8)?,
        revoked: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn select_task(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<TaskRecord>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .optional()
}

fn require_task(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<TaskRecord> {
    select_task(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Pending tasks that are due, plus running tasks whose lease expired.
/// Rows claimed before leases existed fall back to `updated_at`.
const CLAIMABLE: &str = "revoked = 0 AND (
         (state IN ('queued', 'retrying') AND next_attempt_at <= ?1)
         OR (state = 'running' AND COALESCE(locked_until, updated_at) <= ?1))";

/// Move a claimable task to `running`, take a lease until `locked_until` and
/// return the updated row.
fn mark_running(
    tx: &Transaction<'_>,
    id: &str,
    now: &str,
    locked_until: &str,
) -> rusqlite::Result<TaskRecord> {
    let previous: String = tx.query_row(
        "SELECT state FROM tasks WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if previous == "running" {
        warn!(task_id = id, "task lease expired, reclaiming");
    }
    tx.execute(
        "UPDATE tasks SET state = 'running', attempts = attempts + 1,
                          locked_until = ?1, updated_at = ?2
         WHERE id = ?3",
        params![locked_until, now, id],
    )?;
    require_task(tx, id)
}

/// A revoked task whose worker died never reports back; finish it here.
fn fail_abandoned_revoked(tx: &Transaction<'_>, now: &str) -> rusqlite::Result<usize> {
    tx.execute(
        "UPDATE tasks SET state = 'failed', last_error = ?1, locked_until = NULL, updated_at = ?2
         WHERE state = 'running' AND revoked = 1
           AND COALESCE(locked_until, updated_at) <= ?2",
        params![REVOKED_ERROR, now],
    )
}

/// Insert a new task in the `queued` state, eligible immediately.
pub async fn enqueue(
    db: &Database,
    connection_id: i64,
    payload: &Value,
) -> Result<TaskRecord, FlowlinkError> {
    let id = uuid::Uuid::new_v4().to_string();
    let payload = payload.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<TaskRecord, rusqlite::Error> {
            conn.execute(
                "INSERT INTO tasks (id, connection_id, payload, state, next_attempt_at,
                                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'queued', ?4, ?4, ?4)",
                params![id, connection_id, payload, now],
            )?;
            require_task(conn, &id)
        })
        .await
        .map_err(map_tr_err)
}

/// Claim the oldest eligible task whose next-attempt time has passed, or
/// whose previous claim's lease expired, and lock it for `lease`.
pub async fn claim_next(
    db: &Database,
    lease: Duration,
) -> Result<Option<TaskRecord>, FlowlinkError> {
    let now = now_timestamp();
    let locked_until = timestamp_after(lease);
    db.connection()
        .call(move |conn| -> Result<Option<TaskRecord>, rusqlite::Error> {
            let tx = conn.transaction()?;
            fail_abandoned_revoked(&tx, &now)?;
            let candidate: Option<String> = tx
                .query_row(
                    &format!(
                        "SELECT id FROM tasks WHERE {CLAIMABLE}
                         ORDER BY next_attempt_at ASC, created_at ASC
                         LIMIT 1"
                    ),
                    params![now],
                    |row| row.get(0),
                )
                .optional()?;

            let claimed = match candidate {
                Some(id) => Some(mark_running(&tx, &id, &now, &locked_until)?),
                None => None,
            };
            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)
}

/// Claim a specific task regardless of its schedule, if it is still pending
/// or its lease expired.
pub async fn claim(
    db: &Database,
    id: &str,
    lease: Duration,
) -> Result<Option<TaskRecord>, FlowlinkError> {
    let id = id.to_string();
    let now = now_timestamp();
    let locked_until = timestamp_after(lease);
    db.connection()
        .call(move |conn| -> Result<Option<TaskRecord>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let eligible: bool = tx
                .query_row(
                    "SELECT 1 FROM tasks
                     WHERE id = ?2 AND revoked = 0
                       AND (state IN ('queued', 'retrying')
                            OR (state = 'running' AND COALESCE(locked_until, updated_at) <= ?1))",
                    params![now, id],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false);

            let claimed = if eligible {
                Some(mark_running(&tx, &id, &now, &locked_until)?)
            } else {
                None
            };
            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)
}

/// Finish a running task. A revoked task ends as failed and drops `result`.
pub async fn complete(db: &Database, id: &str, result: &Value) -> Result<TaskRecord, FlowlinkError> {
    let id = id.to_string();
    let result = result.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<TaskRecord, rusqlite::Error> {
            conn.execute(
                "UPDATE tasks SET
                     state = CASE WHEN revoked = 1 THEN 'failed' ELSE 'succeeded' END,
                     result = CASE WHEN revoked = 1 THEN NULL ELSE ?1 END,
                     last_error = CASE WHEN revoked = 1 THEN ?2 ELSE NULL END,
                     locked_until = NULL,
                     updated_at = ?3
                 WHERE id = ?4 AND state = 'running'",
                params![result, REVOKED_ERROR, now, id],
            )?;
            require_task(conn, &id)
        })
        .await
        .map_err(map_tr_err)
}

/// Put a running task back in line after `delay_ms`.
///
/// A task revoked mid-flight fails instead of being rescheduled.
pub async fn schedule_retry(
    db: &Database,
    id: &str,
    error: &str,
    delay_ms: u64,
) -> Result<TaskRecord, FlowlinkError> {
    let id = id.to_string();
    let error = error.to_string();
    let now = now_timestamp();
    let next = timestamp_after(Duration::from_millis(delay_ms));
    db.connection()
        .call(move |conn| -> Result<TaskRecord, rusqlite::Error> {
            conn.execute(
                "UPDATE tasks SET
                     state = CASE WHEN revoked = 1 THEN 'failed' ELSE 'retrying' END,
                     retry_count = CASE WHEN revoked = 1 THEN retry_count ELSE retry_count + 1 END,
                     last_error = CASE WHEN revoked = 1 THEN ?1 ELSE ?2 END,
                     next_attempt_at = ?3,
                     locked_until = NULL,
                     updated_at = ?4
                 WHERE id = ?5 AND state = 'running'",
                params![REVOKED_ERROR, error, next, now, id],
            )?;
            require_task(conn, &id)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a task as permanently failed.
pub async fn fail(db: &Database, id: &str, error: &str) -> Result<TaskRecord, FlowlinkError> {
    let id = id.to_string();
    let error = error.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<TaskRecord, rusqlite::Error> {
            conn.execute(
                "UPDATE tasks SET state = 'failed', last_error = ?1, locked_until = NULL,
                                  updated_at = ?2
                 WHERE id = ?3 AND state NOT IN ('succeeded', 'failed')",
                params![error, now, id],
            )?;
            require_task(conn, &id)
        })
        .await
        .map_err(map_tr_err)
}

/// Read one task without touching it.
pub async fn get(db: &Database, id: &str) -> Result<Option<TaskRecord>, FlowlinkError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| select_task(conn, &id))
        .await
        .map_err(map_tr_err)
}

/// Revoke a task. Returns `false` for unknown or already-terminal tasks.
pub async fn cancel(db: &Database, id: &str) -> Result<bool, FlowlinkError> {
    let id = id.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let pending = tx.execute(
                "UPDATE tasks SET state = 'failed', revoked = 1, last_error = ?1, updated_at = ?2
                 WHERE id = ?3 AND state IN ('queued', 'retrying')",
                params![REVOKED_ERROR, now, id],
            )?;
            let running = tx.execute(
                "UPDATE tasks SET revoked = 1, updated_at = ?1
                 WHERE id = ?2 AND state = 'running'",
                params![now, id],
            )?;
            tx.commit()?;
            Ok(pending + running > 0)
        })
        .await
        .map_err(map_tr_err)
}
