// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Application-wide key-value settings.
//!
//! The pin index and the legacy pin lists live here. The store itself is a collaborator; this
//! module only defines the seam plus a JSON-file and an in-memory implementation.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::store::{write_atomic, StoreError, WriteDurability};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot encode settings for {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode settings key {key:?}: {source}")]
    EncodeValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Write(#[from] StoreError),
}

/// A persistent key-value store for application settings.
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;

    async fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;

    async fn remove(&mut self, key: &str) -> Result<(), SettingsError>;
}

/// Settings kept only in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: Map<String, Value>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_owned(), value);
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Settings persisted as one JSON object, rewritten atomically on every change.
#[derive(Debug, Clone)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Map<String, Value>,
    durability: WriteDurability,
}

impl JsonFileSettings {
    /// Opens the settings file. A missing file starts empty; so does a corrupt one, which is
    /// logged and replaced on the next write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(values)) => values,
                Ok(_) => {
                    tracing::warn!(
                        target: "pinfold.settings",
                        path = %path.display(),
                        "settings file is not a JSON object; starting empty"
                    );
                    Map::new()
                }
                Err(err) => {
                    tracing::warn!(
                        target: "pinfold.settings",
                        path = %path.display(),
                        error = %err,
                        "cannot parse settings file; starting empty"
                    );
                    Map::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(SettingsError::Read { path, source }),
        };

        Ok(Self {
            path,
            values,
            durability: WriteDurability::default(),
        })
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) -> Result<(), SettingsError> {
        let mut bytes = serde_json::to_vec_pretty(&self.values).map_err(|source| {
            SettingsError::Encode {
                path: self.path.clone(),
                source,
            }
        })?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes, self.durability, true).await?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_owned(), value);
        self.persist().await
    }

    async fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        if self.values.remove(key).is_none() {
            return Ok(());
        }
        self.persist().await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{JsonFileSettings, MemorySettings, SettingsStore};

    #[tokio::test]
    async fn json_settings_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config").join("settings.json");

        let mut settings = JsonFileSettings::open(&path).await.unwrap();
        assert_eq!(settings.get("showHiddenFiles"), None);
        settings.set("showHiddenFiles", json!(true)).await.unwrap();
        settings.set("pinnedDirectories", json!(["/a"])).await.unwrap();
        settings.remove("pinnedDirectories").await.unwrap();

        let reopened = JsonFileSettings::open(&path).await.unwrap();
        assert_eq!(reopened.get("showHiddenFiles"), Some(json!(true)));
        assert_eq!(reopened.get("pinnedDirectories"), None);
    }

    #[tokio::test]
    async fn corrupt_settings_start_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, b"[1, 2").unwrap();

        let mut settings = JsonFileSettings::open(&path).await.unwrap();
        assert_eq!(settings.get("anything"), None);

        settings.set("k", json!("v")).await.unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, json!({ "k": "v" }));
    }

    #[tokio::test]
    async fn memory_settings_set_and_remove() {
        let mut settings = MemorySettings::new().with_value("a", json!(1));
        assert_eq!(settings.get("a"), Some(json!(1)));
        settings.set("a", json!(2)).await.unwrap();
        assert_eq!(settings.get("a"), Some(json!(2)));
        settings.remove("a").await.unwrap();
        assert_eq!(settings.get("a"), None);
    }
}
