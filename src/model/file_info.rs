// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata for one filesystem entry, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub size: u64,
    /// Milliseconds since the unix epoch.
    pub modified_time: Option<u64>,
    /// Milliseconds since the unix epoch; not every filesystem records it.
    pub created_time: Option<u64>,
    /// Lowercased, including the leading dot; empty when the name has none.
    pub extension: String,
}

/// A pinned file found by reconciliation, with the directory that pins it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedFile {
    pub file: FileInfo,
    pub source_dir: PathBuf,
}
