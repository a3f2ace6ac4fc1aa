// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of creating a bookmark. Exactly one of `bookmark` / `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkResult {
    pub path: PathBuf,
    #[serde(default)]
    pub bookmark: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BookmarkResult {
    pub fn created(path: impl Into<PathBuf>, bookmark: String) -> Self {
        Self {
            path: path.into(),
            bookmark: Some(bookmark),
            error: None,
        }
    }

    pub fn failed(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bookmark: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of resolving a bookmark.
///
/// `stale` means the bookmark still resolved but its target moved since creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub bookmark: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub stale: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ResolveResult {
    pub fn resolved(bookmark: impl Into<String>, path: impl Into<PathBuf>, stale: bool) -> Self {
        Self {
            bookmark: bookmark.into(),
            path: Some(path.into()),
            stale,
            error: None,
        }
    }

    pub fn failed(bookmark: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            bookmark: bookmark.into(),
            path: None,
            stale: false,
            error: Some(error.into()),
        }
    }
}
