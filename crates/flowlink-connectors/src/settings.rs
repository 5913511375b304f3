// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed view of a connection's free-form settings map.
//!
//! Settings are stored as an opaque JSON object. [`ConnectorSettings::parse`]
//! is the single place that interprets them, and it runs both when a
//! connection is created or edited and every time a connector is built.

use std::collections::BTreeMap;
use std::time::Duration;

use flowlink_core::FlowlinkError;
use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;

/// Settings keys as they appear in the stored JSON.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    base_url: Option<String>,
    timeout: Option<f64>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    username: Option<String>,
    password: Option<String>,
    dry_run: Option<bool>,
    ping_path: Option<String>,
    sync_path: Option<String>,
    routes: Option<BTreeMap<String, String>>,
    signing_secret: Option<String>,
}

/// Validated connection settings shared by every connector variant.
#[derive(Debug, Clone)]
pub struct ConnectorSettings {
    /// Partner root URL. Absent means the connector can only dry-run.
    pub base_url: Option<Url>,
    /// Per-connection request timeout. Falls back to the service default.
    pub timeout: Option<Duration>,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Resolved dry-run flag: the explicit setting, or `true` without a base URL.
    pub dry_run: bool,
    pub ping_path: Option<String>,
    pub sync_path: Option<String>,
    /// Operation name to path overrides (accounting gateway only).
    pub routes: Option<BTreeMap<String, String>>,
    /// Key for the `X-Flowlink-Signature` HMAC (generic webhook only).
    pub signing_secret: Option<SecretString>,
}

impl ConnectorSettings {
    /// Parses and validates a stored settings value.
    ///
    /// `null` is treated as an empty map. Every failure is a
    /// [`FlowlinkError::Config`].
    pub fn parse(value: &Value) -> Result<Self, FlowlinkError> {
        let raw: RawSettings = match value {
            Value::Null => RawSettings::default(),
            Value::Object(_) => RawSettings::deserialize(value)
                .map_err(|e| FlowlinkError::Config(format!("invalid connection settings: {e}")))?,
            other => {
                return Err(FlowlinkError::Config(format!(
                    "connection settings must be a JSON object, got {}",
                    json_kind(other)
                )));
            }
        };

        let base_url = match raw.base_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(url) => Some(parse_base_url(url)?),
        };

        let timeout = match raw.timeout {
            None => None,
            Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(timeout) if !timeout.is_zero() => Some(timeout),
                Ok(_) => {
                    return Err(FlowlinkError::Config(format!(
                        "timeout must be a positive number of seconds, got {secs}"
                    )));
                }
                Err(e) => {
                    return Err(FlowlinkError::Config(format!(
                        "timeout must be a positive number of seconds, got {secs}: {e}"
                    )));
                }
            },
        };

        let headers = raw
            .headers
            .iter()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| FlowlinkError::Config(format!("invalid header name `{name}`: {e}")))?;
                let value = HeaderValue::from_str(value).map_err(|e| {
                    FlowlinkError::Config(format!("invalid value for header `{name}`: {e}"))
                })?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, FlowlinkError>>()?;

        if raw.dry_run == Some(false) && base_url.is_none() {
            return Err(FlowlinkError::Config(
                "dry_run is disabled but no base_url is configured".into(),
            ));
        }
        let dry_run = raw.dry_run.unwrap_or(base_url.is_none());

        if let Some(path) = raw.ping_path.as_deref() {
            check_path("ping_path", path)?;
        }
        if let Some(path) = raw.sync_path.as_deref() {
            check_path("sync_path", path)?;
        }
        if let Some(routes) = &raw.routes {
            for (operation, path) in routes {
                check_path(&format!("routes.{operation}"), path)?;
            }
        }

        Ok(Self {
            base_url,
            timeout,
            headers,
            username: raw.username,
            password: raw.password.map(SecretString::from),
            dry_run,
            ping_path: raw.ping_path,
            sync_path: raw.sync_path,
            routes: raw.routes,
            signing_secret: raw.signing_secret.map(SecretString::from),
        })
    }
}

fn parse_base_url(url: &str) -> Result<Url, FlowlinkError> {
    let parsed =
        Url::parse(url).map_err(|e| FlowlinkError::Config(format!("invalid base_url `{url}`: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FlowlinkError::Config(format!(
            "base_url must use http or https, got `{scheme}`"
        ))),
    }
}

fn check_path(key: &str, path: &str) -> Result<(), FlowlinkError> {
    if path.contains("://") {
        return Err(FlowlinkError::Config(format!(
            "{key} must be a path relative to base_url, got `{path}`"
        )));
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    #[test]
    fn missing_base_url_means_dry_run() {
        let settings = ConnectorSettings::parse(&json!({})).unwrap();
        assert!(settings.base_url.is_none());
        assert!(settings.dry_run);

        let settings = ConnectorSettings::parse(&Value::Null).unwrap();
        assert!(settings.dry_run);
    }

    #[test]
    fn base_url_disables_dry_run_by_default() {
        let settings =
            ConnectorSettings::parse(&json!({"base_url": "https://gw.example/api"})).unwrap();
        assert!(!settings.dry_run);

        let settings = ConnectorSettings::parse(
            &json!({"base_url": "https://gw.example/api", "dry_run": true}),
        )
        .unwrap();
        assert!(settings.dry_run);
    }

    #[test]
    fn disabling_dry_run_without_base_url_is_rejected() {
        let err = ConnectorSettings::parse(&json!({"dry_run": false})).unwrap_err();
        assert!(matches!(err, FlowlinkError::Config(_)));
    }

    #[test]
    fn rejects_non_object_and_bad_types() {
        assert!(ConnectorSettings::parse(&json!([1, 2])).is_err());
        assert!(ConnectorSettings::parse(&json!({"timeout": "fast"})).is_err());
        assert!(ConnectorSettings::parse(&json!({"timeout": 0})).is_err());
        assert!(ConnectorSettings::parse(&json!({"timeout": -1.5})).is_err());
        assert!(ConnectorSettings::parse(&json!({"timeout": 1e-12})).is_err());
        assert!(matches!(
            ConnectorSettings::parse(&json!({"timeout": 1e30})),
            Err(FlowlinkError::Config(_))
        ));
        assert!(ConnectorSettings::parse(&json!({"base_url": "ftp://files.example"})).is_err());
        assert!(ConnectorSettings::parse(&json!({"headers": {"bad header": "x"}})).is_err());
        assert!(
            ConnectorSettings::parse(&json!({"sync_path": "https://elsewhere.example/x"})).is_err()
        );
    }

    #[test]
    fn credentials_are_kept_secret() {
        let settings = ConnectorSettings::parse(&json!({
            "username": "svc",
            "password": "hunter2",
            "signing_secret": "whsec",
            "timeout": 2.5,
        }))
        .unwrap();
        assert_eq!(settings.password.as_ref().unwrap().expose_secret(), "hunter2");
        assert_eq!(settings.timeout, Some(Duration::from_millis(2500)));
        assert!(!format!("{settings:?}").contains("hunter2"));
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let settings = ConnectorSettings::parse(&json!({"tenant": "acme"})).unwrap();
        assert!(settings.dry_run);
    }
}
