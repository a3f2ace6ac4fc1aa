// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::BookmarkResolver;
use crate::model::{BookmarkResult, ResolveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct FileId {
    dev: u64,
    ino: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum NativeToken {
    /// Identity-carrying bookmark; survives a rename inside the same parent directory.
    Inode {
        path: PathBuf,
        id: FileId,
        #[serde(default)]
        parent: Option<FileId>,
    },
    /// Fallback when the platform exposes no file identity; resolves only in place.
    Path { path: PathBuf },
}

#[cfg(unix)]
fn file_id(md: &std::fs::Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;

    Some(FileId {
        dev: md.dev(),
        ino: md.ino(),
    })
}

#[cfg(not(unix))]
fn file_id(_md: &std::fs::Metadata) -> Option<FileId> {
    None
}

async fn file_id_at(path: &Path) -> Option<FileId> {
    let md = tokio::fs::metadata(path).await.ok()?;
    file_id(&md)
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

fn encode_token(token: &NativeToken) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(token)?;
    Ok(STANDARD.encode(json))
}

fn decode_token(bookmark: &str) -> Result<NativeToken, &'static str> {
    let bytes = STANDARD
        .decode(bookmark.trim())
        .map_err(|_| "invalid base64 data")?;
    serde_json::from_slice(&bytes).map_err(|_| "invalid bookmark data")
}

/// Resolves bookmarks in-process from file identity (device and inode numbers).
///
/// A bookmark finds its target again after a rename within the same directory. Targets moved
/// to another directory are reported as unresolvable.
#[derive(Debug, Clone, Default)]
pub struct NativeResolver;

impl NativeResolver {
    pub fn new() -> Self {
        Self
    }

    async fn search_parent(
        &self,
        original: &Path,
        parent_id: Option<FileId>,
        id: FileId,
    ) -> Option<PathBuf> {
        let parent = original.parent()?;
        if let Some(expected) = parent_id {
            if file_id_at(parent).await != Some(expected) {
                return None;
            }
        }

        let mut entries = tokio::fs::read_dir(parent).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let candidate = entry.path();
            if file_id_at(&candidate).await == Some(id) {
                return Some(candidate);
            }
        }
        None
    }
}

impl BookmarkResolver for NativeResolver {
    async fn create(&self, path: &Path) -> BookmarkResult {
        let path = match absolute(path) {
            Ok(path) => path,
            Err(err) => return BookmarkResult::failed(path, err.to_string()),
        };

        let md = match tokio::fs::metadata(&path).await {
            Ok(md) => md,
            Err(err) => return BookmarkResult::failed(path, err.to_string()),
        };

        let token = match file_id(&md) {
            Some(id) => {
                let parent = match path.parent() {
                    Some(parent) => file_id_at(parent).await,
                    None => None,
                };
                NativeToken::Inode {
                    path: path.clone(),
                    id,
                    parent,
                }
            }
            None => NativeToken::Path { path: path.clone() },
        };

        match encode_token(&token) {
            Ok(bookmark) => BookmarkResult::created(path, bookmark),
            Err(err) => BookmarkResult::failed(path, err.to_string()),
        }
    }

    async fn resolve(&self, bookmark: &str) -> ResolveResult {
        let token = match decode_token(bookmark) {
            Ok(token) => token,
            Err(message) => return ResolveResult::failed(bookmark, message),
        };

        match token {
            NativeToken::Path { path } => {
                if tokio::fs::metadata(&path).await.is_ok() {
                    ResolveResult::resolved(bookmark, path, false)
                } else {
                    ResolveResult::failed(bookmark, "bookmark target no longer exists")
                }
            }
            NativeToken::Inode { path, id, parent } => {
                if file_id_at(&path).await == Some(id) {
                    return ResolveResult::resolved(bookmark, path, false);
                }
                match self.search_parent(&path, parent, id).await {
                    Some(found) => ResolveResult::resolved(bookmark, found, true),
                    None => ResolveResult::failed(bookmark, "bookmark target could not be located"),
                }
            }
        }
    }
}
