// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network-free partner sandboxes.
//!
//! A sandbox echoes the request next to a canned partner response. Results
//! depend only on their input, so demos and tests get identical answers on
//! every run.

pub mod profiles;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use flowlink_core::{FlowlinkError, IntegrationSandboxExchange};

pub use profiles::SandboxProfile;

/// Every sandbox profile, in a stable order.
pub fn list_profiles() -> &'static [SandboxProfile] {
    &profiles::PROFILES
}

/// Looks up one profile by slug.
pub fn profile(slug: &str) -> Option<&'static SandboxProfile> {
    profiles::PROFILES.iter().find(|p| p.slug == slug)
}

/// Simulates an exchange with the sandbox `slug`.
///
/// `medoc` stamps a checksum of `document`; `spi` reports the byte length of
/// the nested `payload`. A `null` payload is treated as `{}`.
pub fn simulate(slug: &str, payload: &Value) -> Result<IntegrationSandboxExchange, FlowlinkError> {
    let profile = profile(slug).ok_or_else(|| FlowlinkError::not_found("sandbox", slug))?;
    let echo = if payload.is_null() {
        Value::Object(Map::new())
    } else {
        payload.clone()
    };

    let mut response = profile.response_example.clone();
    let extra = match profile.slug {
        "medoc" => echo
            .get("document")
            .filter(|d| is_truthy(d))
            .map(|d| ("checksum", Value::String(document_checksum(d)))),
        "spi" => echo
            .get("payload")
            .filter(|p| is_truthy(p))
            .map(|p| ("payload_digest", Value::from(p.to_string().len()))),
        _ => None,
    };
    if let (Some((key, value)), Some(fields)) = (extra, response.as_object_mut()) {
        fields.insert(key.to_string(), value);
    }

    debug!(sandbox = profile.slug, "sandbox exchange simulated");
    Ok(IntegrationSandboxExchange {
        sandbox: profile.slug.to_string(),
        echo,
        response,
        notes: profile.notes.clone(),
    })
}

/// First 16 bits of the SHA-256 of the document text, as 4 hex digits.
fn document_checksum(document: &Value) -> String {
    let text = match document {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..2])
}

/// Empty strings, empty containers, zero, `false` and `null` count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_core::PartnerType;
    use serde_json::json;

    #[test]
    fn lists_five_profiles_in_order() {
        let slugs: Vec<&str> = list_profiles().iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["medoc", "spi", "diia", "prozorro", "one_c"]);
        assert_eq!(profile("one_c").unwrap().partner_type, PartnerType::AccountingOdata);
    }

    #[test]
    fn unknown_slug_is_not_found() {
        let err = simulate("unknown-slug", &json!({})).unwrap_err();
        assert!(matches!(err, FlowlinkError::NotFound { entity: "sandbox", .. }));
    }

    #[test]
    fn medoc_checksum_depends_only_on_document() {
        let a = simulate("medoc", &json!({"document": "<A/>"})).unwrap();
        let b = simulate("medoc", &json!({"document": "<A/>", "recipient_code": "8"})).unwrap();
        let c = simulate("medoc", &json!({"document": "<B/>"})).unwrap();

        let checksum = a.response["checksum"].as_str().unwrap();
        assert_eq!(checksum, "4f60");
        assert_eq!(a.response["checksum"], b.response["checksum"]);
        assert_ne!(a.response["checksum"], c.response["checksum"]);
        assert_eq!(a.response["status"], "accepted");
    }

    #[test]
    fn medoc_without_document_returns_canned_response() {
        let out = simulate("medoc", &Value::Null).unwrap();
        assert_eq!(out.echo, json!({}));
        assert!(out.response.get("checksum").is_none());
        assert_eq!(out.notes.len(), 2);
    }

    #[test]
    fn spi_reports_nested_payload_length() {
        let nested = json!({"report_type": "pdv"});
        let out = simulate("spi", &json!({"payload": nested})).unwrap();
        assert_eq!(out.response["payload_digest"], nested.to_string().len());
        assert_eq!(out.response["ticket"], "spi-req-2024-09-18-771");
    }

    #[test]
    fn other_sandboxes_echo_and_answer() {
        let out = simulate("prozorro", &json!({"q": "CRM"})).unwrap();
        assert_eq!(out.sandbox, "prozorro");
        assert_eq!(out.echo, json!({"q": "CRM"}));
        assert_eq!(out.response["total"], 2);
    }

    #[test]
    fn checksum_is_stable_across_calls() {
        let doc = json!("<Act/>");
        assert_eq!(document_checksum(&doc), document_checksum(&doc));
    }
}
