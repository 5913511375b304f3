// SPDX-FileCopyrightText: 2026 Flowlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./flowlink.toml` > `~/.config/flowlink/flowlink.toml`
//! > `/etc/flowlink/flowlink.toml` with environment variable overrides via the
//! `FLOWLINK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FlowlinkConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/flowlink/flowlink.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "flowlink.toml";

/// Per-user config file under the XDG config dir, if one can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("flowlink").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/flowlink/flowlink.toml`
/// 3. `~/.config/flowlink/flowlink.toml`
/// 4. `./flowlink.toml`
/// 5. `FLOWLINK_*` environment variables
pub fn load_config() -> Result<FlowlinkConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<FlowlinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowlinkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FlowlinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlowlinkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FlowlinkConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `FLOWLINK_QUEUE_MAX_ATTEMPTS` must become `queue.max_attempts`,
/// not `queue.max.attempts`.
fn env_provider() -> Env {
    Env::prefixed("FLOWLINK_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("http_", "http.", 1)
            .replacen("exchange_", "exchange.", 1)
            .replacen("queue_", "queue.", 1);
        mapped.into()
    })
}
