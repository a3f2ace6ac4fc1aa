// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The global pinned-files view and index healing.

use std::collections::BTreeSet;

use super::PinService;
use crate::bookmark::BookmarkResolver;
use crate::listing;
use crate::model::{DirectoryIndexEntry, PinnedFile};
use crate::settings::SettingsStore;
use crate::store::StoreError;

impl<R: BookmarkResolver, S: SettingsStore> PinService<R, S> {
    /// Every live pin across indexed directories, then rewrites the index to the directories
    /// that still contributed one.
    ///
    /// A directory found only through its bookmark is recorded under its new path. A directory
    /// whose manifest exists but cannot be read is kept without contributing files.
    pub async fn get_all_pinned(&mut self) -> Vec<PinnedFile> {
        let candidates = self.index.list();
        let mut seen = BTreeSet::new();
        let mut live = Vec::new();
        let mut out = Vec::new();

        for candidate in candidates {
            let Some(located) = self.locate_directory(&candidate).await else {
                tracing::debug!(
                    target: "pinfold.reconcile",
                    directory = %candidate.path.display(),
                    "dropping unreachable directory"
                );
                continue;
            };
            if !seen.insert(located.path.clone()) {
                continue;
            }

            if let Err(err @ StoreError::Io { .. }) = self.manifests.try_read(&located.path).await {
                tracing::warn!(
                    target: "pinfold.reconcile",
                    directory = %located.path.display(),
                    error = %err,
                    "keeping directory with unreadable manifest"
                );
                live.push(located);
                continue;
            }

            let mut contributed = false;
            for path in self.get_pinned(&located.path).await {
                match listing::stat(&path).await {
                    Ok(file) => {
                        out.push(PinnedFile {
                            file,
                            source_dir: located.path.clone(),
                        });
                        contributed = true;
                    }
                    Err(err) => tracing::debug!(
                        target: "pinfold.reconcile",
                        path = %path.display(),
                        error = %err,
                        "pinned file vanished"
                    ),
                }
            }

            if contributed {
                live.push(located);
            } else {
                tracing::debug!(
                    target: "pinfold.reconcile",
                    directory = %located.path.display(),
                    "dropping directory without live pins"
                );
            }
        }

        if let Err(err) = self.index.prune(live).await {
            tracing::warn!(
                target: "pinfold.reconcile",
                error = %err,
                "cannot persist reconciled pin index"
            );
        }
        out
    }

    async fn locate_directory(&self, entry: &DirectoryIndexEntry) -> Option<DirectoryIndexEntry> {
        if listing::is_dir(&entry.path).await {
            let bookmark = match &entry.bookmark {
                Some(bookmark) => Some(bookmark.clone()),
                None => self.resolver.create(&entry.path).await.bookmark,
            };
            return Some(DirectoryIndexEntry::new(entry.path.clone(), bookmark));
        }

        let bookmark = entry.bookmark.as_deref()?;
        let resolved = self.resolver.resolve(bookmark).await;
        let path = resolved.path?;
        if !listing::is_dir(&path).await {
            return None;
        }

        let bookmark = if resolved.stale {
            self.resolver
                .create(&path)
                .await
                .bookmark
                .unwrap_or_else(|| bookmark.to_owned())
        } else {
            bookmark.to_owned()
        };
        tracing::debug!(
            target: "pinfold.reconcile",
            from = %entry.path.display(),
            to = %path.display(),
            "followed moved directory"
        );
        Some(DirectoryIndexEntry::new(path, Some(bookmark)))
    }
}
