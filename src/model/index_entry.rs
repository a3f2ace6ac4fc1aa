// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One row of the global pin index: a directory believed to hold at least one pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryIndexEntry {
    /// Last known absolute path.
    pub path: PathBuf,
    /// Follows the directory across renames. Absent when no bookmark could be created.
    #[serde(default)]
    pub bookmark: Option<String>,
}

impl DirectoryIndexEntry {
    pub fn new(path: impl Into<PathBuf>, bookmark: Option<String>) -> Self {
        Self {
            path: path.into(),
            bookmark,
        }
    }

    /// Two rows describe the same directory when either their path or their bookmark agrees.
    pub fn same_directory(&self, path: &std::path::Path, bookmark: Option<&str>) -> bool {
        self.path == path
            || bookmark
                .zip(self.bookmark.as_deref())
                .is_some_and(|(theirs, ours)| theirs == ours)
    }
}
