// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::io;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::atomic::{temp_file_prefix, write_atomic, WriteDurability};
use super::StoreError;
use crate::model::{migrate, Manifest, PinnedEntry};

pub const DEFAULT_MANIFEST_FILE_NAME: &str = ".manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ManifestDecodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unsupported manifest version {0}")]
    UnsupportedVersion(u64),
}

#[derive(Debug, Deserialize)]
struct ManifestHeaderJson {
    version: u64,
    #[serde(default)]
    pinned: serde_json::Value,
}

// Field order is the serialized key order; keep it alphabetical.
#[derive(Debug, Serialize)]
struct ManifestV1Json<'a> {
    pinned: &'a [String],
    version: u32,
}

/// A pinned entry inside a directory's manifest.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct PinnedEntryJson {
    /// Opaque, base64 encoded bookmark used to find the entry after a rename.
    #[serde(default)]
    bookmark: Option<String>,
    /// File name relative to the manifest's directory.
    name: String,
}

/// Pin manifest stored next to a directory's contents.
#[derive(Debug, Serialize, JsonSchema)]
struct ManifestV2Json {
    /// Pinned entries in display order.
    pinned: Vec<PinnedEntryJson>,
    /// Schema version, always 2.
    version: u32,
}

fn null_as_empty<T>(value: serde_json::Value) -> Result<Vec<T>, serde_json::Error>
where
    T: serde::de::DeserializeOwned,
{
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value)
}

/// Parses manifest bytes without migrating them.
pub fn decode_manifest(bytes: &[u8]) -> Result<Manifest, ManifestDecodeError> {
    let header: ManifestHeaderJson = serde_json::from_slice(bytes)?;
    match header.version {
        1 => Ok(Manifest::V1 {
            pinned: null_as_empty(header.pinned)?,
        }),
        2 => {
            let entries: Vec<PinnedEntryJson> = null_as_empty(header.pinned)?;
            Ok(Manifest::V2 {
                pinned: entries
                    .into_iter()
                    .map(|entry| PinnedEntry {
                        name: entry.name,
                        bookmark: entry.bookmark,
                    })
                    .collect(),
            })
        }
        other => Err(ManifestDecodeError::UnsupportedVersion(other)),
    }
}

/// Serializes a manifest as pretty printed JSON with sorted keys and a trailing newline.
pub fn encode_manifest(manifest: &Manifest) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = match manifest {
        Manifest::V1 { pinned } => serde_json::to_vec_pretty(&ManifestV1Json {
            pinned,
            version: 1,
        })?,
        Manifest::V2 { pinned } => serde_json::to_vec_pretty(&ManifestV2Json {
            pinned: pinned
                .iter()
                .map(|entry| PinnedEntryJson {
                    bookmark: entry.bookmark.clone(),
                    name: entry.name.clone(),
                })
                .collect(),
            version: 2,
        })?,
    };
    out.push(b'\n');
    Ok(out)
}

/// JSON Schema of the manifest format this crate writes.
pub fn manifest_json_schema() -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(schemars::schema_for!(ManifestV2Json))
}

/// Reads and writes the per-directory sidecar manifest.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    file_name: String,
    durability: WriteDurability,
}

impl Default for ManifestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestStore {
    pub fn new() -> Self {
        Self {
            file_name: DEFAULT_MANIFEST_FILE_NAME.to_owned(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn manifest_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.file_name)
    }

    /// True for the manifest itself and for temp files left behind by an interrupted write.
    ///
    /// Directory listings must hide these.
    pub fn is_manifest_artifact(&self, name: &str) -> bool {
        name == self.file_name || name.starts_with(&temp_file_prefix(&self.file_name))
    }

    pub async fn exists(&self, directory: &Path) -> bool {
        tokio::fs::symlink_metadata(self.manifest_path(directory))
            .await
            .is_ok()
    }

    /// Reads the manifest as stored, distinguishing absent (`Ok(None)`) from unreadable.
    pub async fn try_read(&self, directory: &Path) -> Result<Option<Manifest>, StoreError> {
        let path = self.manifest_path(directory);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        decode_manifest(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Decode { path, source })
    }

    /// Reads the manifest as stored. Unreadable or malformed files count as absent.
    pub async fn read(&self, directory: &Path) -> Option<Manifest> {
        match self.try_read(directory).await {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!(
                    target: "pinfold.manifest",
                    path = %err.path().display(),
                    error = %err,
                    "ignoring unreadable manifest"
                );
                None
            }
        }
    }

    /// Persists `manifest` atomically. The directory must already exist.
    pub async fn write(&self, directory: &Path, manifest: &Manifest) -> Result<(), StoreError> {
        let path = self.manifest_path(directory);
        let bytes = encode_manifest(manifest).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &bytes, self.durability, false).await?;
        tracing::debug!(
            target: "pinfold.manifest",
            path = %path.display(),
            version = manifest.version(),
            pinned = manifest.len(),
            "wrote manifest"
        );
        Ok(())
    }

    /// Reads the manifest in the current schema, upgrading the file in place when it was older.
    ///
    /// A failed upgrade write is logged; the migrated manifest is still returned.
    pub async fn load(&self, directory: &Path) -> Option<Manifest> {
        let manifest = self.read(directory).await?;
        if manifest.is_current() {
            return Some(manifest);
        }

        let from_version = manifest.version();
        let migrated = migrate(manifest);
        match self.write(directory, &migrated).await {
            Ok(()) => tracing::debug!(
                target: "pinfold.manifest",
                directory = %directory.display(),
                from_version,
                "migrated manifest in place"
            ),
            Err(err) => tracing::warn!(
                target: "pinfold.manifest",
                directory = %directory.display(),
                error = %err,
                "cannot persist migrated manifest"
            ),
        }
        Some(migrated)
    }
}

#[cfg(test)]
mod tests;
