// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use super::StoreError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteDurability {
    /// Manifests and settings land through temp file plus rename, without fsync.
    #[default]
    BestEffort,

    /// Also fsyncs the temp file before the rename and, on unix, the parent directory after it.
    /// What survives a power loss still depends on the filesystem.
    Durable,
}

/// Prefix shared by every in-flight temp file written next to `file_name`.
pub fn temp_file_prefix(file_name: &str) -> String {
    format!(".{}.tmp.", file_name.trim_start_matches('.'))
}

/// Replaces `path` with `contents` so that readers only ever see the old or the new file.
///
/// When `create_parent` is false a missing parent directory is reported as `NotFound`
/// instead of being created.
pub async fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
    create_parent: bool,
) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent"),
        });
    };

    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    if create_parent {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    match tokio::fs::symlink_metadata(path).await {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        "{}{}.{}",
        temp_file_prefix(file_name),
        std::process::id(),
        nanos
    ));

    if let Err(err) = write_new_file(&tmp_path, contents, durability).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err);
    }

    if let Err(source) = rename_overwrite(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = tokio::fs::File::open(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            dir.sync_all().await.map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

async fn write_new_file(
    tmp_path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: tmp_path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)
        .await
        .map_err(io_err)?;

    file.write_all(contents).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;

    if durability == WriteDurability::Durable {
        file.sync_all().await.map_err(io_err)?;
    }

    Ok(())
}

async fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match tokio::fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = tokio::fs::remove_file(to).await;
                tokio::fs::rename(from, to).await
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        tokio::fs::rename(from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::{temp_file_prefix, write_atomic, WriteDurability};
    use crate::store::StoreError;

    #[test]
    fn temp_prefix_does_not_double_the_leading_dot() {
        assert_eq!(temp_file_prefix(".manifest.json"), ".manifest.json.tmp.");
        assert_eq!(temp_file_prefix("settings.json"), ".settings.json.tmp.");
    }

    #[tokio::test]
    async fn replaces_existing_contents_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.json");

        write_atomic(&path, b"one", WriteDurability::BestEffort, false).await.unwrap();
        write_atomic(&path, b"two", WriteDurability::Durable, false).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"two");
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn missing_parent_is_an_error_unless_created() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("data.json");

        let err = write_atomic(&path, b"x", WriteDurability::BestEffort, false)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!tmp.path().join("nested").exists());

        write_atomic(&path, b"x", WriteDurability::BestEffort, true).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"x");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn refuses_to_write_through_symlink() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("target.json");
        std::fs::write(&target, b"original").unwrap();
        let link = tmp.path().join("link.json");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = write_atomic(&link, b"x", WriteDurability::BestEffort, false)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SymlinkRefused { .. }));
        assert_eq!(std::fs::read(&target).unwrap(), b"original");
    }
}
