// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;

use crate::settings::SettingsError;
use crate::store::StoreError;

/// Failures surfaced by pin mutations.
///
/// Only persistence failures and invalid input reach the caller; everything else degrades to
/// omission.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("cannot save pins: {0}")]
    Store(#[from] StoreError),
    #[error("cannot save settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("cannot pin {path:?}: path has no file name")]
    InvalidPinPath { path: PathBuf },
    #[error("no pinned entry at position {index} (have {len})")]
    PositionOutOfRange { index: usize, len: usize },
}
