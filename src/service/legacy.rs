// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One-time upgrade of settings written by older releases.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use super::PinService;
use crate::bookmark::BookmarkResolver;
use crate::error::PinError;
use crate::listing;
use crate::settings::SettingsStore;

/// Settings key of the old per-directory pin map (directory -> full paths).
pub const LEGACY_PINNED_FILES_KEY: &str = "pinnedFiles";
/// Set once the old pin map has been moved into manifests.
pub const MIGRATED_TO_MANIFEST_KEY: &str = "migratedToManifest";

/// What the startup sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupReport {
    pub migrated_directories: usize,
    pub kept_existing_manifests: usize,
    pub skipped_missing_directories: usize,
    pub failed_directories: usize,
    pub bookmarked_index_entries: usize,
}

impl<R: BookmarkResolver, S: SettingsStore> PinService<R, S> {
    /// Moves old-style pins into manifests, then brings the index up to date.
    ///
    /// Existing manifests are never overwritten. Directories whose manifest cannot be written
    /// stay in the old map and are retried on the next start.
    pub async fn startup(&mut self) -> Result<StartupReport, PinError> {
        let mut report = StartupReport::default();
        if !self.migrated_to_manifest() {
            self.migrate_legacy_pins(&mut report).await?;
        }
        self.upgrade_index(&mut report).await?;

        tracing::debug!(target: "pinfold.startup", ?report, "startup sweep finished");
        Ok(report)
    }

    fn migrated_to_manifest(&self) -> bool {
        self.index
            .settings()
            .get(MIGRATED_TO_MANIFEST_KEY)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn legacy_pins(&self) -> BTreeMap<String, Vec<String>> {
        let Some(value) = self.index.settings().get(LEGACY_PINNED_FILES_KEY) else {
            return BTreeMap::new();
        };
        serde_json::from_value(value).unwrap_or_else(|err| {
            tracing::warn!(
                target: "pinfold.startup",
                error = %err,
                "ignoring malformed legacy pin map"
            );
            BTreeMap::new()
        })
    }

    async fn migrate_legacy_pins(&mut self, report: &mut StartupReport) -> Result<(), PinError> {
        let mut retry = BTreeMap::new();

        for (directory, paths) in self.legacy_pins() {
            if paths.is_empty() {
                continue;
            }
            let dir = PathBuf::from(&directory);
            if !listing::is_dir(&dir).await {
                report.skipped_missing_directories += 1;
                continue;
            }

            if self.manifests.exists(&dir).await {
                report.kept_existing_manifests += 1;
                if self.manifests.read(&dir).await.is_some_and(|m| !m.is_empty()) {
                    self.remember_directory(&dir).await;
                }
                continue;
            }

            let pins: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
            match self.set_pinned(&dir, &pins).await {
                Ok(()) => report.migrated_directories += 1,
                Err(err) => {
                    tracing::warn!(
                        target: "pinfold.startup",
                        directory = %dir.display(),
                        error = %err,
                        "cannot migrate legacy pins"
                    );
                    report.failed_directories += 1;
                    retry.insert(directory, paths);
                }
            }
        }

        let settings = self.index.settings_mut();
        if retry.is_empty() {
            settings.set(MIGRATED_TO_MANIFEST_KEY, Value::Bool(true)).await?;
            settings.remove(LEGACY_PINNED_FILES_KEY).await?;
        } else {
            let remaining: serde_json::Map<String, Value> = retry
                .into_iter()
                .map(|(directory, paths)| (directory, Value::from(paths)))
                .collect();
            settings
                .set(LEGACY_PINNED_FILES_KEY, Value::Object(remaining))
                .await?;
        }
        Ok(())
    }

    async fn upgrade_index(&mut self, report: &mut StartupReport) -> Result<(), PinError> {
        for entry in self.index.list() {
            if entry.bookmark.is_some() || !listing::is_dir(&entry.path).await {
                continue;
            }
            let bookmark = self.resolver.create(&entry.path).await.bookmark;
            if bookmark.is_some() && self.index.set_bookmark(&entry.path, bookmark).await? {
                report.bookmarked_index_entries += 1;
            }
        }
        self.index.retire_legacy_directories().await?;
        Ok(())
    }
}
