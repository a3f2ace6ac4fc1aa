// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The pin service: per-directory pin operations and the global pinned-files view.
//!
//! The manifest in each directory is the source of truth. The index is kept in step on every
//! mutation and healed by reconciliation. Mutations take `&mut self`; share a service between
//! tasks behind a `tokio::sync::Mutex` so manifest writes stay serialized.

mod legacy;
mod reconcile;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub use legacy::{StartupReport, LEGACY_PINNED_FILES_KEY, MIGRATED_TO_MANIFEST_KEY};

use crate::bookmark::BookmarkResolver;
use crate::error::PinError;
use crate::index::PinIndex;
use crate::listing;
use crate::model::{Manifest, PinnedEntry};
use crate::settings::SettingsStore;
use crate::store::ManifestStore;

fn pin_name(path: &Path) -> Result<String, PinError> {
    path.file_name()
        .and_then(OsStr::to_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| PinError::InvalidPinPath {
            path: path.to_path_buf(),
        })
}

fn within(directory: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        directory.join(path)
    }
}

fn has_name(path: &Path, name: &str) -> bool {
    path.file_name() == Some(OsStr::new(name))
}

pub struct PinService<R, S> {
    manifests: ManifestStore,
    index: PinIndex<S>,
    resolver: R,
}

impl<R: BookmarkResolver, S: SettingsStore> PinService<R, S> {
    pub fn new(manifests: ManifestStore, index: PinIndex<S>, resolver: R) -> Self {
        Self {
            manifests,
            index,
            resolver,
        }
    }

    pub fn manifests(&self) -> &ManifestStore {
        &self.manifests
    }

    pub fn index(&self) -> &PinIndex<S> {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut PinIndex<S> {
        &mut self.index
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Current paths of the directory's pins, in manifest order.
    ///
    /// An entry missing under its recorded name is looked up through its bookmark; entries
    /// found neither way are left out.
    pub async fn get_pinned(&self, directory: &Path) -> Vec<PathBuf> {
        let Some(manifest) = self.manifests.load(directory).await else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for entry in manifest.into_entries() {
            if let Some(path) = self.locate_entry(directory, &entry).await {
                out.push(path);
            }
        }
        out
    }

    async fn locate_entry(&self, directory: &Path, entry: &PinnedEntry) -> Option<PathBuf> {
        let expected = directory.join(&entry.name);
        if listing::exists(&expected).await {
            return Some(expected);
        }

        let bookmark = entry.bookmark.as_deref()?;
        let resolved = self.resolver.resolve(bookmark).await;
        match resolved.path {
            Some(path) if listing::exists(&path).await => Some(path),
            _ => {
                tracing::debug!(
                    target: "pinfold.service",
                    directory = %directory.display(),
                    name = %entry.name,
                    error = resolved.error.as_deref().unwrap_or("target missing"),
                    "pinned entry no longer resolves"
                );
                None
            }
        }
    }

    /// Replaces the directory's pins with `paths`, in that order.
    ///
    /// Pins are identified by file name; later duplicates are dropped. Relative paths are taken
    /// relative to `directory`.
    pub async fn set_pinned(&mut self, directory: &Path, paths: &[PathBuf]) -> Result<(), PinError> {
        let mut names: Vec<String> = Vec::with_capacity(paths.len());
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let name = pin_name(path)?;
            if names.contains(&name) {
                continue;
            }
            names.push(name);
            sources.push(within(directory, path));
        }

        if names.is_empty() {
            if self.manifests.exists(directory).await {
                self.manifests.write(directory, &Manifest::default()).await?;
            }
            self.forget_directory(directory).await;
            return Ok(());
        }

        let bookmarks = self.resolver.batch_create(&sources).await;
        let entries = names
            .into_iter()
            .zip(&sources)
            .map(|(name, source)| PinnedEntry::new(name).with_bookmark(bookmarks.get(source).cloned()))
            .collect();
        self.manifests
            .write(directory, &Manifest::from_entries(entries))
            .await?;
        self.remember_directory(directory).await;
        Ok(())
    }

    /// Pins `path` at the end of the directory's list; a no-op if its name is already pinned.
    pub async fn add_pinned(&mut self, directory: &Path, path: &Path) -> Result<Vec<PathBuf>, PinError> {
        let name = pin_name(path)?;
        let mut pinned = self.get_pinned(directory).await;
        if pinned.iter().any(|pinned| has_name(pinned, &name)) {
            if !self.index.contains(directory) {
                self.remember_directory(directory).await;
            }
            return Ok(pinned);
        }

        pinned.push(within(directory, path));
        self.set_pinned(directory, &pinned).await?;
        Ok(pinned)
    }

    /// Unpins the entry named like `path`. Removing the last pin drops the directory from the
    /// index.
    pub async fn remove_pinned(&mut self, directory: &Path, path: &Path) -> Result<Vec<PathBuf>, PinError> {
        let name = pin_name(path)?;
        let pinned = self.get_pinned(directory).await;
        let remaining: Vec<PathBuf> = pinned
            .iter()
            .filter(|pinned| !has_name(pinned, &name))
            .cloned()
            .collect();

        let listed_in_manifest = self
            .manifests
            .read(directory)
            .await
            .is_some_and(|manifest| manifest.contains(&name));
        if remaining.len() == pinned.len() && !listed_in_manifest {
            return Ok(pinned);
        }

        self.set_pinned(directory, &remaining).await?;
        Ok(remaining)
    }

    pub async fn is_pinned(&self, directory: &Path, name: &str) -> bool {
        self.manifests
            .load(directory)
            .await
            .is_some_and(|manifest| manifest.contains(name))
    }

    /// Moves the pin at manifest position `from` to position `to`.
    pub async fn reorder(&mut self, directory: &Path, from: usize, to: usize) -> Result<Vec<PathBuf>, PinError> {
        let mut entries = self
            .manifests
            .load(directory)
            .await
            .map(Manifest::into_entries)
            .unwrap_or_default();

        let len = entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(PinError::PositionOutOfRange { index, len });
            }
        }

        if from != to {
            let entry = entries.remove(from);
            entries.insert(to, entry);
            self.manifests
                .write(directory, &Manifest::from_entries(entries))
                .await?;
        }
        Ok(self.get_pinned(directory).await)
    }

    /// Keeps a pin attached to an entry renamed from `old_name` to `new_name`.
    ///
    /// Returns false when `old_name` was not pinned.
    pub async fn rename_pinned(&mut self, directory: &Path, old_name: &str, new_name: &str) -> Result<bool, PinError> {
        if new_name.is_empty() || new_name.contains(['/', '\\']) {
            return Err(PinError::InvalidPinPath {
                path: PathBuf::from(new_name),
            });
        }

        let Some(manifest) = self.manifests.load(directory).await else {
            return Ok(false);
        };
        let mut entries = manifest.into_entries();
        let Some(pos) = entries.iter().position(|entry| entry.name == old_name) else {
            return Ok(false);
        };

        if entries.iter().any(|entry| entry.name == new_name) {
            entries.remove(pos);
        } else {
            let refreshed = self.resolver.create(&directory.join(new_name)).await.bookmark;
            let bookmark = refreshed.or_else(|| entries[pos].bookmark.take());
            entries[pos] = PinnedEntry::new(new_name).with_bookmark(bookmark);
        }

        self.manifests
            .write(directory, &Manifest::from_entries(entries))
            .await?;
        Ok(true)
    }

    /// Index rows recorded under a path that is gone but whose bookmark now resolves to
    /// `directory`.
    async fn moved_rows(&mut self, directory: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for entry in self.index.list() {
            let Some(bookmark) = entry.bookmark.as_deref() else {
                continue;
            };
            if entry.path == directory || listing::is_dir(&entry.path).await {
                continue;
            }
            let resolved = self.resolver.resolve(bookmark).await;
            if resolved.path.as_deref() == Some(directory) {
                out.push(entry.path);
            }
        }
        out
    }

    async fn remember_directory(&mut self, directory: &Path) {
        let created = self.resolver.create(directory).await;
        if let Some(error) = created.error.as_deref() {
            tracing::debug!(
                target: "pinfold.service",
                directory = %directory.display(),
                error,
                "indexing directory without bookmark"
            );
        }

        for old in self.moved_rows(directory).await {
            if let Err(err) = self
                .index
                .relocate(&old, directory, created.bookmark.clone())
                .await
            {
                tracing::warn!(
                    target: "pinfold.service",
                    from = %old.display(),
                    to = %directory.display(),
                    error = %err,
                    "cannot relocate directory in pin index"
                );
            }
        }

        if let Err(err) = self.index.record_directory(directory, created.bookmark).await {
            tracing::warn!(
                target: "pinfold.service",
                directory = %directory.display(),
                error = %err,
                "cannot record directory in pin index"
            );
        }
    }

    async fn forget_directory(&mut self, directory: &Path) {
        let mut rows = self.moved_rows(directory).await;
        rows.push(directory.to_path_buf());

        for row in rows {
            if let Err(err) = self.index.remove_directory(&row, None).await {
                tracing::warn!(
                    target: "pinfold.service",
                    directory = %row.display(),
                    error = %err,
                    "cannot remove directory from pin index"
                );
            }
        }
    }
}
