// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: manifests, index rows, bookmark results and file metadata.

pub mod bookmark;
pub mod file_info;
pub mod index_entry;
pub mod manifest;

pub use bookmark::{BookmarkResult, ResolveResult};
pub use file_info::{FileInfo, PinnedFile};
pub use index_entry::DirectoryIndexEntry;
pub use manifest::{migrate, Manifest, PinnedEntry, CURRENT_MANIFEST_VERSION};
