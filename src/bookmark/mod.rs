// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bookmarks: opaque, persistable references that follow a filesystem entry across renames.
//!
//! Every operation reports failure inside its result value. Callers keep going on partial
//! results; a bookmark that cannot be created simply leaves the pin without one.

mod helper;
mod native;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use helper::HelperResolver;
pub use native::NativeResolver;

use crate::model::{BookmarkResult, ResolveResult};

/// Creates and resolves bookmarks.
#[allow(async_fn_in_trait)]
pub trait BookmarkResolver {
    async fn create(&self, path: &Path) -> BookmarkResult;

    async fn resolve(&self, bookmark: &str) -> ResolveResult;

    /// Creates bookmarks for many paths. Paths that fail are absent from the result.
    async fn batch_create(&self, paths: &[PathBuf]) -> BTreeMap<PathBuf, String> {
        let mut out = BTreeMap::new();
        for path in paths {
            let result = self.create(path).await;
            if let Some(bookmark) = result.bookmark {
                out.insert(path.clone(), bookmark);
            }
        }
        out
    }
}

/// The resolver chosen at startup: in-process, or an external helper program.
#[derive(Debug, Clone)]
pub enum ConfiguredResolver {
    Native(NativeResolver),
    Helper(HelperResolver),
}

impl BookmarkResolver for ConfiguredResolver {
    async fn create(&self, path: &Path) -> BookmarkResult {
        match self {
            Self::Native(resolver) => resolver.create(path).await,
            Self::Helper(resolver) => resolver.create(path).await,
        }
    }

    async fn resolve(&self, bookmark: &str) -> ResolveResult {
        match self {
            Self::Native(resolver) => resolver.resolve(bookmark).await,
            Self::Helper(resolver) => resolver.resolve(bookmark).await,
        }
    }

    async fn batch_create(&self, paths: &[PathBuf]) -> BTreeMap<PathBuf, String> {
        match self {
            Self::Native(resolver) => resolver.batch_create(paths).await,
            Self::Helper(resolver) => resolver.batch_create(paths).await,
        }
    }
}
