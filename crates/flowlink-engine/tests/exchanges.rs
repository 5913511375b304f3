// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runner behaviour against the SQLite store.

use std::sync::Arc;

use flowlink_config::model::{ExchangeConfig, StorageConfig};
use flowlink_core::{ExchangeContext, ExchangeStatus, NewConnection, PartnerType};
use flowlink_engine::{ConnectionService, ExchangeRunner};
use flowlink_storage::SqliteStore;
use flowlink_test_utils::{ScriptedConnectorFactory, Step};
use serde_json::{Value, json};

async fn sqlite_service(
    dir: &tempfile::TempDir,
    steps: Vec<Step>,
    budget: usize,
) -> ConnectionService {
    let config = StorageConfig {
        database_path: dir.path().join("flowlink.db").to_string_lossy().to_string(),
        wal_mode: true,
    };
    let store = SqliteStore::open(&config).await.unwrap();
    let runner = ExchangeRunner::new(
        Arc::new(store),
        Arc::new(ScriptedConnectorFactory::with_steps(steps)),
        &ExchangeConfig {
            log_payload_budget: budget,
        },
    );
    ConnectionService::new(runner)
}

fn accounting() -> NewConnection {
    NewConnection {
        name: "one-c".into(),
        description: String::new(),
        partner_type: PartnerType::AccountingOdata,
        settings: json!({}),
        is_active: true,
    }
}

#[tokio::test]
async fn every_invocation_writes_exactly_one_log() {
    let dir = tempfile::tempdir().unwrap();
    let svc = sqlite_service(
        &dir,
        vec![
            Step::Respond(200, json!({"value": []})),
            Step::Fail("502: bad gateway".into()),
            Step::Respond(200, json!({"status": "up"})),
        ],
        2000,
    )
    .await;
    let conn = svc.create(accounting()).await.unwrap();

    svc.sync(conn.id, &json!({"operation": "catalogs"}), ExchangeContext::Api)
        .await
        .unwrap();
    svc.sync(conn.id, &json!({}), ExchangeContext::Api)
        .await
        .unwrap_err();
    svc.ping(conn.id, ExchangeContext::Cli).await.unwrap();

    let logs = svc.logs(conn.id, None).await.unwrap();
    assert_eq!(logs.len(), 3);
    let statuses: Vec<ExchangeStatus> = logs.iter().map(|l| l.status).collect();
    assert_eq!(statuses.iter().filter(|s| **s == ExchangeStatus::Error).count(), 1);

    let refreshed = svc.get(conn.id).await.unwrap();
    assert_eq!(refreshed.last_sync_status, "Success");
    assert!(refreshed.last_synced_at.is_some());
}

#[tokio::test]
async fn stored_summary_respects_byte_budget() {
    let dir = tempfile::tempdir().unwrap();
    let big = "ґ".repeat(500);
    let svc = sqlite_service(
        &dir,
        vec![Step::Respond(200, json!({"echo": big}))],
        120,
    )
    .await;
    let conn = svc.create(accounting()).await.unwrap();

    svc.sync(conn.id, &json!({"note": big}), ExchangeContext::Worker)
        .await
        .unwrap();

    let logs = svc.logs(conn.id, Some(1)).await.unwrap();
    assert!(logs[0].payload.len() <= 120);
    assert!(logs[0].payload.starts_with("{\"action\":\"sync\""));
}

#[tokio::test]
async fn inactive_sync_leaves_connection_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let svc = sqlite_service(&dir, vec![], 2000).await;
    let mut new = accounting();
    new.is_active = false;
    let conn = svc.create(new).await.unwrap();

    assert!(
        svc.sync(conn.id, &Value::Null, ExchangeContext::Api)
            .await
            .is_err()
    );

    let after = svc.get(conn.id).await.unwrap();
    assert_eq!(after.last_sync_status, conn.last_sync_status);
    assert_eq!(after.last_synced_at, None);
    assert!(svc.logs(conn.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_connection_removes_its_logs() {
    let dir = tempfile::tempdir().unwrap();
    let svc = sqlite_service(&dir, vec![], 2000).await;
    let conn = svc.create(accounting()).await.unwrap();
    svc.ping(conn.id, ExchangeContext::Api).await.unwrap();

    svc.delete(conn.id).await.unwrap();
    assert!(svc.runner().store().list_logs(conn.id, None).await.unwrap().is_empty());
}
