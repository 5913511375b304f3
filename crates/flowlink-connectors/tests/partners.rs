// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connector behaviour against a mock partner server.

use flowlink_config::model::HttpConfig;
use flowlink_connectors::PartnerConnectorFactory;
use flowlink_connectors::signing::{SIGNATURE_HEADER, verify_signature};
use flowlink_core::{ConnectorFactory, FlowlinkError, PartnerType};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn factory() -> PartnerConnectorFactory {
    PartnerConnectorFactory::new(&HttpConfig::default()).unwrap()
}

fn live(server: &MockServer, extra: Value) -> Value {
    let mut settings = json!({"base_url": server.uri()});
    if let (Some(target), Value::Object(extra)) = (settings.as_object_mut(), extra) {
        target.extend(extra);
    }
    settings
}

#[tokio::test]
async fn accounting_catalog_query_goes_out_as_get_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/odata/standard.odata/Catalog_Products"))
        .and(query_param("$top", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let connector = factory()
        .build(PartnerType::AccountingOdata, &live(&server, json!({})))
        .unwrap();
    let result = connector
        .sync(&json!({"operation": "catalogs", "payload": {"$top": 5}}))
        .await
        .unwrap();

    assert_eq!(result.status_code, 200);
    assert_eq!(result.body, json!({"value": []}));
}

#[tokio::test]
async fn edoc_posts_base64_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/xml"))
        .and(body_json(json!({"action": "SendDocument", "document": "PEEvPg=="})))
        .respond_with(ResponseTemplate::new(202).set_body_string("accepted"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = factory()
        .build(PartnerType::EdocSoap, &live(&server, json!({})))
        .unwrap();
    let result = connector.sync(&json!({"document": "<A/>"})).await.unwrap();

    assert_eq!(result.status_code, 202);
    assert_eq!(result.body, json!("accepted"));
}

#[tokio::test]
async fn error_status_is_integration_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/reports"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let connector = factory()
        .build(PartnerType::TaxRest, &live(&server, json!({})))
        .unwrap();
    let err = connector.sync(&json!({})).await.unwrap_err();

    assert!(err.is_retryable());
    match err {
        FlowlinkError::Integration { message, .. } => assert_eq!(message, "503: maintenance"),
        other => panic!("expected integration error, got {other:?}"),
    }
}

#[tokio::test]
async fn basic_auth_and_custom_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/partner/v1/status"))
        .and(basic_auth("svc", "pa55"))
        .and(header("X-Tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let settings = live(
        &server,
        json!({"username": "svc", "password": "pa55", "headers": {"X-Tenant": "acme"}}),
    );
    let connector = factory()
        .build(PartnerType::DigitalSignature, &settings)
        .unwrap();
    let result = connector.ping().await.unwrap();
    assert_eq!(result.body["status"], "ok");
}

#[tokio::test]
async fn webhook_body_is_signed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let settings = live(&server, json!({"sync_path": "/hooks", "signing_secret": "whsec"}));
    let connector = factory()
        .build(PartnerType::GenericWebhook, &settings)
        .unwrap();
    connector
        .sync(&json!({"payload": {"event": "invoice.paid"}}))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    let signature = sent
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    let secret = SecretString::from("whsec".to_string());
    assert!(verify_signature(&secret, &sent.body, signature));
    assert_eq!(
        serde_json::from_slice::<Value>(&sent.body).unwrap(),
        json!({"event": "invoice.paid"})
    );
}

#[tokio::test]
async fn dry_run_never_touches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let settings = live(&server, json!({"dry_run": true}));
    for partner_type in PartnerType::ALL {
        let connector = factory().build(partner_type, &settings).unwrap();
        let result = connector.sync(&json!({"payload": {"k": "v"}})).await.unwrap();
        assert_eq!(result.status_code, 200);
        assert_eq!(result.body["mode"], "dry-run");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_partner_is_integration_error() {
    // Port 9 (discard) on localhost is closed in test environments.
    let settings = json!({"base_url": "http://127.0.0.1:9", "timeout": 2});
    let connector = factory().build(PartnerType::Procurement, &settings).unwrap();
    let err = connector.ping().await.unwrap_err();
    assert!(matches!(err, FlowlinkError::Integration { .. }));
}
