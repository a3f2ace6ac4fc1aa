// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tracing subscriber setup for the CLI.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Maps simple level names (any case, `warning` included) to their canonical form; anything else
/// is passed through as an `EnvFilter` directive string.
pub fn normalize_level(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return DEFAULT_LOG_LEVEL.to_owned();
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "off" => "off".to_owned(),
        "trace" => "trace".to_owned(),
        "debug" => "debug".to_owned(),
        "info" => "info".to_owned(),
        "warn" | "warning" => "warn".to_owned(),
        "error" => "error".to_owned(),
        _ => trimmed.to_owned(),
    }
}

fn configured_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(normalize_level(level))
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::WARN.into()))
}

/// The filter for `level` with `extra` directives (usually `RUST_LOG`) layered on top.
pub fn merged_filter(level: &str, extra: Option<&str>) -> EnvFilter {
    let extra = extra.map(str::trim).filter(|value| !value.is_empty());
    match extra {
        Some(extra) => {
            let combined = format!("{},{extra}", normalize_level(level));
            EnvFilter::try_new(combined)
                .or_else(|_| EnvFilter::try_new(extra))
                .unwrap_or_else(|_| configured_filter(level))
        }
        None => configured_filter(level),
    }
}

pub fn env_filter(level: &str) -> EnvFilter {
    let rust_log = std::env::var("RUST_LOG").ok();
    merged_filter(level, rust_log.as_deref())
}

/// Installs a stderr subscriber. Returns false if one was already installed.
pub fn init(level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
