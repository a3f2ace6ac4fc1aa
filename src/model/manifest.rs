// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pin manifest data model.
//!
//! A manifest is the sidecar document that records which entries of one directory are pinned.
//! Two on-disk shapes exist; both are represented by [`Manifest`] and [`migrate`] is the only
//! place that converts between them.

use std::collections::BTreeSet;
use std::path::Path;

/// Schema version written by this crate.
pub const CURRENT_MANIFEST_VERSION: u32 = 2;

/// One pinned entry of a directory.
///
/// Only the file name is stored, so a manifest stays valid when its directory moves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinnedEntry {
    pub name: String,
    pub bookmark: Option<String>,
}

impl PinnedEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bookmark: None,
        }
    }

    pub fn with_bookmark(mut self, bookmark: Option<String>) -> Self {
        self.bookmark = bookmark;
        self
    }
}

/// A directory's pin manifest, tagged by schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    /// `pinned` holds bare names (older files may hold full paths).
    V1 { pinned: Vec<String> },
    /// `pinned` holds entries with optional bookmarks.
    V2 { pinned: Vec<PinnedEntry> },
}

impl Default for Manifest {
    fn default() -> Self {
        Self::V2 { pinned: Vec::new() }
    }
}

impl Manifest {
    pub fn from_entries(pinned: Vec<PinnedEntry>) -> Self {
        Self::V2 { pinned }
    }

    pub fn version(&self) -> u32 {
        match self {
            Self::V1 { .. } => 1,
            Self::V2 { .. } => 2,
        }
    }

    pub fn is_current(&self) -> bool {
        self.version() == CURRENT_MANIFEST_VERSION
    }

    pub fn len(&self) -> usize {
        match self {
            Self::V1 { pinned } => pinned.len(),
            Self::V2 { pinned } => pinned.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pinned names in manifest order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::V1 { pinned } => pinned.iter().map(String::as_str).collect(),
            Self::V2 { pinned } => pinned.iter().map(|entry| entry.name.as_str()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().into_iter().any(|pinned| pinned == name)
    }

    /// Returns the entries in the current schema, migrating first if needed.
    pub fn into_entries(self) -> Vec<PinnedEntry> {
        match self {
            Self::V1 { pinned } => entries_from_names(pinned),
            Self::V2 { pinned } => pinned,
        }
    }
}

/// Upgrades a manifest to the current schema.
///
/// Pure and idempotent. A v1 name that still carries a directory part keeps only its final
/// component; duplicate names collapse onto their first occurrence.
pub fn migrate(manifest: Manifest) -> Manifest {
    match manifest {
        Manifest::V2 { .. } => manifest,
        Manifest::V1 { pinned } => Manifest::V2 {
            pinned: entries_from_names(pinned),
        },
    }
}

fn entries_from_names(names: Vec<String>) -> Vec<PinnedEntry> {
    let mut seen = BTreeSet::new();
    names
        .into_iter()
        .filter_map(|raw| {
            let name = legacy_entry_name(&raw)?;
            seen.insert(name.clone()).then(|| PinnedEntry::new(name))
        })
        .collect()
}

fn legacy_entry_name(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if !raw.contains(['/', '\\']) {
        return Some(raw.to_owned());
    }
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
}
