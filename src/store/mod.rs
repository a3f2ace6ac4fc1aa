// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for pin manifests on disk.
//!
//! The store module owns the sidecar manifest format, its version migration on read, and the
//! atomic writer shared with the settings store.

pub mod atomic;
pub mod manifest;

use std::io;
use std::path::PathBuf;

pub use atomic::{write_atomic, WriteDurability};
pub use manifest::{
    decode_manifest, encode_manifest, manifest_json_schema, ManifestDecodeError, ManifestStore,
    DEFAULT_MANIFEST_FILE_NAME,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode manifest at {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ManifestDecodeError,
    },
    #[error("cannot encode manifest for {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("refusing to write through symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
}

impl StoreError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. }
            | Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::SymlinkRefused { path } => path,
        }
    }
}
