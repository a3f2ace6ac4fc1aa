// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The pin index: a cache of directories that are believed to hold pins.
//!
//! The index is a candidate set. It may briefly list directories that lost their pins or
//! vanished; reconciliation folds those out. It must never lose a directory that still has
//! live pins.

use std::path::Path;

use serde_json::Value;

use crate::model::DirectoryIndexEntry;
use crate::settings::{SettingsError, SettingsStore};

/// Current index rows: `[{ "path": …, "bookmark": … }]`.
pub const INDEX_KEY: &str = "pinnedDirectoryIndex";
/// Legacy flat list of directory paths.
pub const LEGACY_DIRECTORIES_KEY: &str = "pinnedDirectories";

fn load_entries<S: SettingsStore>(settings: &S) -> Vec<DirectoryIndexEntry> {
    let mut entries: Vec<DirectoryIndexEntry> = match settings.get(INDEX_KEY) {
        Some(value) => serde_json::from_value(value).unwrap_or_else(|err| {
            tracing::warn!(
                target: "pinfold.index",
                error = %err,
                "ignoring malformed pin index"
            );
            Vec::new()
        }),
        None => Vec::new(),
    };

    if let Some(Value::Array(legacy)) = settings.get(LEGACY_DIRECTORIES_KEY) {
        for path in legacy.iter().filter_map(Value::as_str) {
            let path = Path::new(path);
            if !entries.iter().any(|entry| entry.path == path) {
                entries.push(DirectoryIndexEntry::new(path, None));
            }
        }
    }

    entries
}

/// Process-wide index of pinned directories, persisted through a [`SettingsStore`].
///
/// The in-memory snapshot loads lazily; [`PinIndex::invalidate`] drops it so the next access
/// rereads the settings store.
#[derive(Debug)]
pub struct PinIndex<S> {
    settings: S,
    entries: Option<Vec<DirectoryIndexEntry>>,
}

impl<S: SettingsStore> PinIndex<S> {
    pub fn new(settings: S) -> Self {
        Self {
            settings,
            entries: None,
        }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn into_settings(self) -> S {
        self.settings
    }

    pub fn invalidate(&mut self) {
        self.entries = None;
    }

    fn entries_mut(&mut self) -> &mut Vec<DirectoryIndexEntry> {
        let settings = &self.settings;
        self.entries.get_or_insert_with(|| load_entries(settings))
    }

    /// Writes the snapshot under [`INDEX_KEY`]. A snapshot that cannot be encoded (a path that
    /// is not UTF-8) is dropped so the next access rereads what was last persisted.
    async fn persist(&mut self) -> Result<(), SettingsError> {
        let value = match serde_json::to_value(self.entries_mut()) {
            Ok(value) => value,
            Err(source) => {
                self.invalidate();
                return Err(SettingsError::EncodeValue {
                    key: INDEX_KEY.to_owned(),
                    source,
                });
            }
        };
        self.settings.set(INDEX_KEY, value).await
    }

    pub fn list(&mut self) -> Vec<DirectoryIndexEntry> {
        self.entries_mut().clone()
    }

    pub fn contains(&mut self, path: &Path) -> bool {
        self.entries_mut().iter().any(|entry| entry.path == path)
    }

    /// Inserts a directory unless it is already indexed by path or bookmark.
    ///
    /// A row matched by bookmark under a different path is moved to `path`; a row without a
    /// bookmark picks up the new one. Returns whether anything changed.
    pub async fn record_directory(
        &mut self,
        path: &Path,
        bookmark: Option<String>,
    ) -> Result<bool, SettingsError> {
        let entries = self.entries_mut();
        let changed = match entries
            .iter()
            .position(|entry| entry.same_directory(path, bookmark.as_deref()))
        {
            Some(pos) => {
                let entry = &mut entries[pos];
                let mut changed = false;
                if entry.path != path {
                    entry.path = path.to_path_buf();
                    changed = true;
                }
                if entry.bookmark.is_none() && bookmark.is_some() {
                    entry.bookmark = bookmark;
                    changed = true;
                }
                changed
            }
            None => {
                entries.push(DirectoryIndexEntry::new(path, bookmark));
                true
            }
        };

        if changed {
            tracing::debug!(
                target: "pinfold.index",
                path = %path.display(),
                "recorded pinned directory"
            );
            self.persist().await?;
        }
        Ok(changed)
    }

    /// Moves the row recorded at `from` to `to`, taking `bookmark` when one is given. When `to` is
    /// already indexed the `from` row is dropped instead.
    pub async fn relocate(
        &mut self,
        from: &Path,
        to: &Path,
        bookmark: Option<String>,
    ) -> Result<bool, SettingsError> {
        let entries = self.entries_mut();
        let Some(pos) = entries.iter().position(|entry| entry.path == from) else {
            return Ok(false);
        };
        if entries.iter().any(|entry| entry.path == to) {
            entries.remove(pos);
        } else {
            let entry = &mut entries[pos];
            entry.path = to.to_path_buf();
            if bookmark.is_some() {
                entry.bookmark = bookmark;
            }
        }

        tracing::debug!(
            target: "pinfold.index",
            from = %from.display(),
            to = %to.display(),
            "relocated pinned directory"
        );
        self.persist().await?;
        Ok(true)
    }

    /// Removes every row for the directory, matched by path or bookmark.
    pub async fn remove_directory(
        &mut self,
        path: &Path,
        bookmark: Option<&str>,
    ) -> Result<bool, SettingsError> {
        let entries = self.entries_mut();
        let before = entries.len();
        entries.retain(|entry| !entry.same_directory(path, bookmark));
        if entries.len() == before {
            return Ok(false);
        }

        tracing::debug!(
            target: "pinfold.index",
            path = %path.display(),
            "removed pinned directory"
        );
        self.persist().await?;
        Ok(true)
    }

    /// Replaces a row's bookmark, keyed by path.
    pub async fn set_bookmark(
        &mut self,
        path: &Path,
        bookmark: Option<String>,
    ) -> Result<bool, SettingsError> {
        let Some(entry) = self.entries_mut().iter_mut().find(|entry| entry.path == path) else {
            return Ok(false);
        };
        if entry.bookmark == bookmark {
            return Ok(false);
        }
        entry.bookmark = bookmark;
        self.persist().await?;
        Ok(true)
    }

    /// Replaces the index with the rows confirmed live by reconciliation.
    pub async fn prune(&mut self, valid: Vec<DirectoryIndexEntry>) -> Result<(), SettingsError> {
        let entries = self.entries_mut();
        if *entries == valid {
            return Ok(());
        }

        tracing::debug!(
            target: "pinfold.index",
            before = entries.len(),
            after = valid.len(),
            "pruned pin index"
        );
        *entries = valid;
        self.persist().await
    }

    /// Writes the merged snapshot under the current key and drops the legacy directory list.
    pub async fn retire_legacy_directories(&mut self) -> Result<(), SettingsError> {
        if self.settings.get(LEGACY_DIRECTORIES_KEY).is_none() {
            return Ok(());
        }
        self.persist().await?;
        self.settings.remove(LEGACY_DIRECTORIES_KEY).await
    }
}
