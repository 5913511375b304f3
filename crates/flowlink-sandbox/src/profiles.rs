// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static sandbox profiles, one per well-known partner.

use std::sync::LazyLock;

use flowlink_core::PartnerType;
use serde::Serialize;
use serde_json::{Value, json};

/// Descriptor of a sandbox imitating one partner API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SandboxProfile {
    pub slug: &'static str,
    pub partner_type: PartnerType,
    pub title: &'static str,
    pub description: &'static str,
    pub request_example: Value,
    pub response_example: Value,
    pub notes: Vec<String>,
}

pub(crate) static PROFILES: LazyLock<Vec<SandboxProfile>> = LazyLock::new(|| {
    vec![
        SandboxProfile {
            slug: "medoc",
            partner_type: PartnerType::EdocSoap,
            title: "M.E.Doc",
            description: "Submits accounting reports and acts over a SOAP/XML API. \
                          The answer carries the document id and acceptance status.",
            request_example: json!({
                "action": "SendDocument",
                "document": "<Act><Number>123</Number><Date>2024-09-18</Date></Act>",
                "recipient_code": "12345678",
            }),
            response_example: json!({
                "status": "accepted",
                "document_id": "md-2024-09-18-0001",
                "processing_time_ms": 820,
            }),
            notes: vec![
                "Documents are base64-encoded before sending.".into(),
                "The test endpoint only accepts recipient codes ending in '8'.".into(),
            ],
        },
        SandboxProfile {
            slug: "spi",
            partner_type: PartnerType::TaxRest,
            title: "SPI (State Tax Service)",
            description: "REST API for filing tax reports and requesting statements.",
            request_example: json!({
                "endpoint": "/v1/reports",
                "method": "POST",
                "payload": {"report_type": "pdv", "period": "2024-08"},
            }),
            response_example: json!({
                "status": "queued",
                "ticket": "spi-req-2024-09-18-771",
                "sla_minutes": 30,
            }),
            notes: vec![
                "The answer includes an SLA for when the result is ready.".into(),
                "Only the `reports` operation is available in the sandbox.".into(),
            ],
        },
        SandboxProfile {
            slug: "diia",
            partner_type: PartnerType::DigitalSignature,
            title: "Diia",
            description: "REST integration for verifying user data and signing documents.",
            request_example: json!({
                "endpoint": "/partner/v1/notifications",
                "method": "POST",
                "payload": {"event": "document.sign", "entity_id": "doc-455"},
            }),
            response_example: json!({
                "status": "delivered",
                "received_at": "2024-09-18T09:21:00Z",
            }),
            notes: vec![
                "Uses OAuth2 client credentials.".into(),
                "The sandbox reports `delivered` immediately.".into(),
            ],
        },
        SandboxProfile {
            slug: "prozorro",
            partner_type: PartnerType::Procurement,
            title: "Prozorro",
            description: "Public procurement API with keyword and category filters.",
            request_example: json!({
                "endpoint": "/tenders",
                "method": "GET",
                "payload": {"q": "CRM", "status": "active"},
            }),
            response_example: json!({
                "total": 2,
                "items": [
                    {"tender_id": "UA-2024-08-10-000123", "buyer": "Мінцифра", "amount": 2_500_000},
                    {"tender_id": "UA-2024-08-18-000981", "buyer": "ПриватБанк", "amount": 1_250_000},
                ],
            }),
            notes: vec![
                "Results are limited to the first two matches.".into(),
                "Only the `q` and `status` filters are available in the sandbox.".into(),
            ],
        },
        SandboxProfile {
            slug: "one_c",
            partner_type: PartnerType::AccountingOdata,
            title: "1C:Enterprise",
            description: "OData/REST exchange of catalogs and documents.",
            request_example: json!({
                "operation": "catalogs",
                "method": "GET",
                "payload": {"limit": 5},
            }),
            response_example: json!({
                "items": [
                    {"code": "SKU-001", "name": "Генератор 5кВт"},
                    {"code": "SKU-002", "name": "Ноутбук UA FLOW"},
                ],
                "next_page_token": "cursor-6",
            }),
            notes: vec![
                "Supports the `catalogs`, `documents` and `accounts` operations.".into(),
                "`documents` returns a placeholder invoice number in the sandbox.".into(),
            ],
        },
    ]
});
