// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP transport behind every connector variant.
//!
//! Handles dry-run short-circuiting, URL joining, query/body encoding,
//! authentication, optional body signing, and response interpretation.

use std::time::Duration;

use flowlink_core::{ExchangeResult, FlowlinkError};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::settings::ConnectorSettings;
use crate::signing::{SIGNATURE_HEADER, sign_body};

/// Default route for `ping` when `ping_path` is not set.
pub const DEFAULT_PING_PATH: &str = "/health";

/// Default route for `sync` when `sync_path` is not set.
pub const DEFAULT_SYNC_PATH: &str = "/sync";

/// A fully resolved request, before it is sent.
///
/// Produced for both live and dry-run calls so callers can inspect exactly
/// what would go over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub path: String,
    /// Absolute URL including the query string. `None` when no base URL is set.
    pub url: Option<Url>,
    /// JSON body bytes. GET requests and empty payloads carry none.
    pub body: Option<Vec<u8>>,
    /// `X-Flowlink-Signature` value when a signing secret is configured.
    pub signature: Option<String>,
}

/// HTTP transport configured from one connection's settings.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<Url>,
    timeout: Duration,
    dry_run: bool,
    headers: HeaderMap,
    credentials: Option<(String, SecretString)>,
    signing_secret: Option<SecretString>,
}

impl HttpTransport {
    /// Binds a shared client to one connection's settings.
    pub fn new(
        client: reqwest::Client,
        settings: &ConnectorSettings,
        default_timeout: Duration,
    ) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            headers.insert(name.clone(), value.clone());
        }
        let credentials = match (&settings.username, &settings.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        Self {
            client,
            base_url: settings.base_url.clone(),
            timeout: settings.timeout.unwrap_or(default_timeout),
            dry_run: settings.dry_run,
            headers,
            credentials,
            signing_secret: settings.signing_secret.clone(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Resolves method, URL, body and signature without any I/O.
    pub fn prepare(
        &self,
        method: &str,
        path: &str,
        payload: &Value,
    ) -> Result<PreparedRequest, FlowlinkError> {
        let method = parse_method(method)?;

        let url = match &self.base_url {
            Some(base) => {
                let mut url = join_url(base, path)?;
                if method == Method::GET {
                    append_query(&mut url, payload);
                }
                Some(url)
            }
            None => None,
        };

        let body = if method == Method::GET || is_empty_payload(payload) {
            None
        } else {
            let bytes = serde_json::to_vec(payload)
                .map_err(|e| FlowlinkError::Internal(format!("failed to encode request body: {e}")))?;
            Some(bytes)
        };

        let signature = match &self.signing_secret {
            Some(secret) => Some(sign_body(secret, body.as_deref().unwrap_or_default())?),
            None => None,
        };

        Ok(PreparedRequest {
            method,
            path: path.to_string(),
            url,
            body,
            signature,
        })
    }

    /// Performs one exchange, or fabricates a dry-run echo.
    pub async fn execute(
        &self,
        method: &str,
        path: &str,
        payload: &Value,
    ) -> Result<ExchangeResult, FlowlinkError> {
        let prepared = self.prepare(method, path, payload)?;

        if self.dry_run {
            debug!(method = %prepared.method, path, "dry-run exchange");
            return Ok(ExchangeResult {
                status_code: 200,
                body: json!({
                    "mode": "dry-run",
                    "method": prepared.method.as_str(),
                    "path": path,
                    "payload": payload,
                }),
                request_payload: payload.clone(),
            });
        }

        let Some(url) = prepared.url else {
            return Err(FlowlinkError::integration(
                "Base URL is not configured for the integration",
            ));
        };

        let mut request = self
            .client
            .request(prepared.method.clone(), url)
            .timeout(self.timeout)
            .headers(self.headers.clone());
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass.expose_secret()));
        }
        if let Some(signature) = &prepared.signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        if let Some(body) = prepared.body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(method = %prepared.method, path, error = %e, "partner request failed");
            FlowlinkError::Integration {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
        let text = response.text().await.map_err(|e| FlowlinkError::Integration {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(status = %status, method = %prepared.method, path, "partner response received");

        let failed = status.is_client_error() || status.is_server_error();
        let body = if is_json {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                // An error page mislabelled as JSON still reports its status.
                Err(_) if failed => Value::String(text),
                Err(e) => {
                    return Err(FlowlinkError::Integration {
                        message: format!("malformed JSON response ({}): {e}", status.as_u16()),
                        source: Some(Box::new(e)),
                    });
                }
            }
        } else {
            Value::String(text)
        };

        if failed {
            let rendered = match &body {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(FlowlinkError::integration(format!(
                "{}: {rendered}",
                status.as_u16()
            )));
        }

        Ok(ExchangeResult {
            status_code: status.as_u16(),
            body,
            request_payload: payload.clone(),
        })
    }
}

fn parse_method(method: &str) -> Result<Method, FlowlinkError> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| FlowlinkError::Config(format!("invalid HTTP method `{method}`")))
}

/// Appends `path` to the base URL's own path, keeping any prefix such as `/api`.
fn join_url(base: &Url, path: &str) -> Result<Url, FlowlinkError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)
        .map_err(|e| FlowlinkError::Config(format!("invalid request URL `{joined}`: {e}")))
}

fn append_query(url: &mut Url, payload: &Value) {
    let Value::Object(map) = payload else {
        return;
    };
    if map.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => {
                pairs.append_pair(key, s);
            }
            Value::Array(items) => {
                for item in items {
                    pairs.append_pair(key, &scalar_text(item));
                }
            }
            other => {
                pairs.append_pair(key, &other.to_string());
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
