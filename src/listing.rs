// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Directory listing and stat, with the pin manifest hidden from user-visible results.

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::FileInfo;
use crate::store::ManifestStore;

fn millis_since_epoch(time: io::Result<SystemTime>) -> Option<u64> {
    let since = time.ok()?.duration_since(UNIX_EPOCH).ok()?;
    u64::try_from(since.as_millis()).ok()
}

fn extension_of(name: &str) -> String {
    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!(".{}", ext.to_lowercase()),
        None => String::new(),
    }
}

fn file_info(path: &Path, md: &std::fs::Metadata) -> FileInfo {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    FileInfo {
        extension: extension_of(&name),
        name,
        path: path.to_path_buf(),
        is_directory: md.is_dir(),
        size: md.len(),
        modified_time: millis_since_epoch(md.modified()),
        created_time: millis_since_epoch(md.created()),
    }
}

/// Metadata for one entry, following symlinks.
pub async fn stat(path: &Path) -> io::Result<FileInfo> {
    let md = tokio::fs::metadata(path).await?;
    Ok(file_info(path, &md))
}

pub(crate) async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

pub(crate) async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|md| md.is_dir())
}

/// Lists a directory. Dot-entries are skipped unless `show_hidden`; manifest files are always
/// skipped, as are entries that vanish or cannot be read while listing.
pub async fn list_dir(
    directory: &Path,
    show_hidden: bool,
    manifests: &ManifestStore,
) -> io::Result<Vec<FileInfo>> {
    let mut entries = tokio::fs::read_dir(directory).await?;
    let mut out = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if manifests.is_manifest_artifact(&name) {
            continue;
        }
        if !show_hidden && name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(md) => out.push(file_info(&path, &md)),
            Err(err) => tracing::debug!(
                target: "pinfold.listing",
                path = %path.display(),
                error = %err,
                "skipping unreadable entry"
            ),
        }
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}
