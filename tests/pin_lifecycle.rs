// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use pinfold::index::INDEX_KEY;
use pinfold::{
    JsonFileSettings, ManifestStore, NativeResolver, PinIndex, PinService, SettingsStore,
};
use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Mutex;

type Service = PinService<NativeResolver, JsonFileSettings>;

struct Sandbox {
    tmp: TempDir,
}

impl Sandbox {
    fn settings_path(&self) -> PathBuf {
        self.tmp.path().join("config").join("settings.json")
    }

    fn dir_with(&self, name: &str, files: &[&str]) -> PathBuf {
        let dir = self.tmp.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), file.as_bytes()).unwrap();
        }
        dir
    }

    async fn service(&self) -> Service {
        let settings = JsonFileSettings::open(self.settings_path()).await.unwrap();
        PinService::new(
            ManifestStore::new(),
            PinIndex::new(settings),
            NativeResolver::new(),
        )
    }

    fn settings_json(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(self.settings_path()).unwrap()).unwrap()
    }
}

#[fixture]
fn sandbox() -> Sandbox {
    Sandbox {
        tmp: tempfile::tempdir().unwrap(),
    }
}

fn names(files: &[pinfold::PinnedFile]) -> Vec<&str> {
    files.iter().map(|pinned| pinned.file.name.as_str()).collect()
}

#[rstest]
#[tokio::test]
async fn pins_survive_a_restart(sandbox: Sandbox) {
    let docs = sandbox.dir_with("docs", &["guide.md", "faq.md"]);
    let src = sandbox.dir_with("src", &["main.rs"]);

    {
        let mut service = sandbox.service().await;
        service.startup().await.unwrap();
        service
            .set_pinned(&docs, &[docs.join("faq.md"), docs.join("guide.md")])
            .await
            .unwrap();
        service.add_pinned(&src, &src.join("main.rs")).await.unwrap();
    }

    let index = &sandbox.settings_json()[INDEX_KEY];
    assert_eq!(index.as_array().map(Vec::len), Some(2));
    assert!(index[0]["bookmark"].is_string());

    let mut service = sandbox.service().await;
    let all = service.get_all_pinned().await;
    assert_eq!(names(&all), vec!["faq.md", "guide.md", "main.rs"]);
    assert_eq!(all[2].source_dir, src);
    assert!(!all[0].file.is_directory);
    assert_eq!(all[0].file.extension, ".md");
}

#[rstest]
#[tokio::test]
async fn reconciliation_is_persisted(sandbox: Sandbox) {
    let keep = sandbox.dir_with("keep", &["a.txt"]);
    let gone = sandbox.dir_with("gone", &["b.txt"]);

    let mut service = sandbox.service().await;
    service.add_pinned(&keep, &keep.join("a.txt")).await.unwrap();
    service.add_pinned(&gone, &gone.join("b.txt")).await.unwrap();
    fs::remove_dir_all(&gone).unwrap();

    assert_eq!(names(&service.get_all_pinned().await), vec!["a.txt"]);

    let reopened = sandbox.service().await;
    let index = reopened.index().settings().get(INDEX_KEY).unwrap();
    let paths: Vec<&str> = index
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec![keep.to_str().unwrap()]);
}

#[cfg(unix)]
#[rstest]
#[tokio::test]
async fn moved_directory_is_reindexed_before_reconciliation(sandbox: Sandbox) {
    let proj = sandbox.dir_with("proj", &["a.txt"]);
    let moved = sandbox.tmp.path().join("proj-moved");

    {
        let mut service = sandbox.service().await;
        service.add_pinned(&proj, &proj.join("a.txt")).await.unwrap();
        fs::rename(&proj, &moved).unwrap();
        fs::write(moved.join("b.txt"), b"b").unwrap();
        service.add_pinned(&moved, &moved.join("b.txt")).await.unwrap();
    }

    let index = sandbox.settings_json()[INDEX_KEY].clone();
    let rows = index.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["path"], Value::from(moved.to_str().unwrap()));

    let mut service = sandbox.service().await;
    assert_eq!(names(&service.get_all_pinned().await), vec!["a.txt", "b.txt"]);
}

#[rstest]
#[tokio::test]
async fn corrupt_settings_start_empty_and_are_replaced(sandbox: Sandbox) {
    let proj = sandbox.dir_with("proj", &["a.txt"]);
    fs::create_dir_all(sandbox.settings_path().parent().unwrap()).unwrap();
    fs::write(sandbox.settings_path(), b"not json").unwrap();

    let mut service = sandbox.service().await;
    assert!(service.get_all_pinned().await.is_empty());
    service.add_pinned(&proj, &proj.join("a.txt")).await.unwrap();

    assert!(sandbox.settings_json()[INDEX_KEY].is_array());
}

#[rstest]
#[tokio::test]
async fn shared_service_serializes_mutations(sandbox: Sandbox) {
    let proj = sandbox.dir_with("proj", &["a.txt", "b.txt", "c.txt"]);
    let service = Arc::new(Mutex::new(sandbox.service().await));

    let pin = |name: &'static str| {
        let service = Arc::clone(&service);
        let path = proj.join(name);
        let dir = proj.clone();
        async move {
            let mut service = service.lock().await;
            service.add_pinned(&dir, &path).await.unwrap();
        }
    };
    tokio::join!(pin("a.txt"), pin("b.txt"), pin("c.txt"));

    let service = service.lock().await;
    let mut pinned = service.get_pinned(&proj).await;
    pinned.sort();
    let expected: Vec<PathBuf> = ["a.txt", "b.txt", "c.txt"]
        .iter()
        .map(|name| proj.join(name))
        .collect();
    assert_eq!(pinned, expected);
    assert!(proj.join(".manifest.json").is_file());
}
