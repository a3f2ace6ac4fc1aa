// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pinfold: per-directory pinned files for a file manager.
//!
//! Each directory keeps its pins in a hidden manifest next to the files. A settings-backed index
//! remembers which directories have pins, and bookmarks let pins survive renames and moves.

pub mod bookmark;
pub mod config;
pub mod error;
pub mod index;
pub mod listing;
pub mod logging;
pub mod model;
pub mod service;
pub mod settings;
pub mod store;

pub use bookmark::{BookmarkResolver, ConfiguredResolver, HelperResolver, NativeResolver};
pub use config::{ConfigError, PinConfig};
pub use error::PinError;
pub use index::PinIndex;
pub use model::{DirectoryIndexEntry, FileInfo, Manifest, PinnedEntry, PinnedFile};
pub use service::{PinService, StartupReport};
pub use settings::{JsonFileSettings, MemorySettings, SettingsError, SettingsStore};
pub use store::{ManifestStore, StoreError, WriteDurability};
