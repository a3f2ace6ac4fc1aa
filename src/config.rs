// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime configuration: defaults, an optional JSON file, then environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bookmark::{ConfiguredResolver, HelperResolver, NativeResolver};
use crate::logging::DEFAULT_LOG_LEVEL;
use crate::store::{ManifestStore, WriteDurability, DEFAULT_MANIFEST_FILE_NAME};

pub const SETTINGS_ENV: &str = "PINFOLD_SETTINGS";
pub const HELPER_ENV: &str = "PINFOLD_HELPER";
pub const LOG_ENV: &str = "PINFOLD_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid manifest file name {0:?}")]
    InvalidManifestName(String),
    #[error("no settings location: set PINFOLD_SETTINGS, XDG_CONFIG_HOME or HOME")]
    NoSettingsLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PinConfig {
    pub manifest_file_name: String,
    pub settings_path: Option<PathBuf>,
    /// External bookmark helper, program first. The in-process resolver is used when unset.
    pub helper_command: Option<Vec<String>>,
    pub helper_timeout_ms: u64,
    pub batch_timeout_ms: u64,
    pub durability: WriteDurability,
    pub log_level: String,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            manifest_file_name: DEFAULT_MANIFEST_FILE_NAME.to_owned(),
            settings_path: None,
            helper_command: None,
            helper_timeout_ms: 5_000,
            batch_timeout_ms: 10_000,
            durability: WriteDurability::BestEffort,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
        }
    }
}

impl PinConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `PINFOLD_*` overrides read through `lookup`. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = var(SETTINGS_ENV) {
            self.settings_path = Some(PathBuf::from(path));
        }
        if let Some(command) = var(HELPER_ENV) {
            self.helper_command = Some(command.split_whitespace().map(str::to_owned).collect());
        }
        if let Some(level) = var(LOG_ENV) {
            self.log_level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.manifest_file_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidManifestName(name.to_owned()));
        }
        Ok(())
    }

    /// The settings file: explicit path, else `$XDG_CONFIG_HOME/pinfold/settings.json`, else
    /// `$HOME/.config/pinfold/settings.json`.
    pub fn resolve_settings_path(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.settings_path {
            return Ok(path.clone());
        }
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let base = match var("XDG_CONFIG_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from(var("HOME").ok_or(ConfigError::NoSettingsLocation)?).join(".config"),
        };
        Ok(base.join("pinfold").join("settings.json"))
    }

    pub fn helper_timeout(&self) -> Duration {
        Duration::from_millis(self.helper_timeout_ms)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    pub fn resolver(&self) -> ConfiguredResolver {
        let helper = self
            .helper_command
            .as_deref()
            .and_then(HelperResolver::from_command);
        match helper {
            Some(helper) => ConfiguredResolver::Helper(
                helper
                    .with_timeout(self.helper_timeout())
                    .with_batch_timeout(self.batch_timeout()),
            ),
            None => ConfiguredResolver::Native(NativeResolver::new()),
        }
    }

    pub fn manifest_store(&self) -> ManifestStore {
        ManifestStore::new()
            .with_file_name(self.manifest_file_name.clone())
            .with_durability(self.durability)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use rstest::rstest;

    use super::{ConfigError, PinConfig, HELPER_ENV, LOG_ENV, SETTINGS_ENV};
    use crate::bookmark::ConfiguredResolver;
    use crate::store::WriteDurability;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_native_resolver_and_dot_manifest() {
        let config = PinConfig::default();
        assert_eq!(config.manifest_store().file_name(), ".manifest.json");
        assert_eq!(config.helper_timeout(), Duration::from_secs(5));
        assert_eq!(config.batch_timeout(), Duration::from_secs(10));
        assert!(matches!(config.resolver(), ConfiguredResolver::Native(_)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_overrides_only_given_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "durability": "durable", "helper_command": ["pin-helper", "--quiet"], "helper_timeout_ms": 250 }"#,
        )
        .unwrap();

        let config = PinConfig::from_file(&path).unwrap();
        assert_eq!(config.durability, WriteDurability::Durable);
        assert_eq!(config.helper_timeout(), Duration::from_millis(250));
        assert_eq!(config.batch_timeout_ms, 10_000);
        match config.resolver() {
            ConfiguredResolver::Helper(helper) => {
                assert_eq!(helper.program(), Path::new("pin-helper"))
            }
            other => panic!("expected helper resolver, got {other:?}"),
        }
    }

    #[test]
    fn unknown_and_malformed_files_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        std::fs::write(&path, r#"{ "manifest": "x" }"#).unwrap();
        assert!(matches!(
            PinConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));

        assert!(matches!(
            PinConfig::from_file(&tmp.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = PinConfig {
            log_level: "info".into(),
            ..PinConfig::default()
        };
        config.apply_env(env(&[
            (SETTINGS_ENV, "/tmp/pins.json"),
            (HELPER_ENV, "helper --fast"),
            (LOG_ENV, ""),
        ]));

        assert_eq!(config.settings_path, Some(PathBuf::from("/tmp/pins.json")));
        assert_eq!(
            config.helper_command,
            Some(vec!["helper".to_owned(), "--fast".to_owned()])
        );
        assert_eq!(config.log_level, "info");
    }

    #[rstest]
    #[case(&[("XDG_CONFIG_HOME", "/xdg"), ("HOME", "/home/u")], "/xdg/pinfold/settings.json")]
    #[case(&[("HOME", "/home/u")], "/home/u/.config/pinfold/settings.json")]
    fn settings_path_follows_xdg_then_home(#[case] vars: &[(&str, &str)], #[case] expected: &str) {
        let path = PinConfig::default().resolve_settings_path(env(vars)).unwrap();
        assert_eq!(path, PathBuf::from(expected));
    }

    #[test]
    fn settings_path_needs_some_location() {
        assert!(matches!(
            PinConfig::default().resolve_settings_path(env(&[])),
            Err(ConfigError::NoSettingsLocation)
        ));
    }

    #[rstest]
    #[case("")]
    #[case("..")]
    #[case("pins/manifest.json")]
    fn bad_manifest_names_fail_validation(#[case] name: &str) {
        let config = PinConfig {
            manifest_file_name: name.to_owned(),
            ..PinConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidManifestName(_))
        ));
    }
}
