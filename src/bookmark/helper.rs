// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use super::BookmarkResolver;
use crate::model::{BookmarkResult, ResolveResult};

pub const DEFAULT_HELPER_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Delegates bookmark work to an external OS-integration program.
///
/// The program is invoked as `<program> [args…] <command> <argument>` with one of
/// `create <path>`, `resolve <bookmark>` or `batch-create <json array of paths>`, and prints a
/// JSON `BookmarkResult`, `ResolveResult` or array of `BookmarkResult` on stdout. A timeout or
/// non-zero exit counts as a failed call.
#[derive(Debug, Clone)]
pub struct HelperResolver {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    batch_timeout: Duration,
}

impl HelperResolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_HELPER_TIMEOUT,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }

    /// Builds a resolver from an argv vector; `None` when it is empty.
    pub fn from_command(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program).with_args(args.to_vec()))
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn invoke(&self, command: &str, argument: &str, timeout: Duration) -> Result<Vec<u8>, String> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .arg(command)
            .arg(argument)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Err(_) => {
                return Err(format!(
                    "bookmark helper timed out after {} ms",
                    timeout.as_millis()
                ))
            }
            Ok(Err(err)) => return Err(format!("cannot run bookmark helper: {err}")),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "bookmark helper exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        Ok(output.stdout)
    }

    fn log_failure(&self, command: &str, error: &str) {
        tracing::warn!(
            target: "pinfold.bookmark",
            program = %self.program.display(),
            command,
            error,
            "bookmark helper call failed"
        );
    }
}

impl BookmarkResolver for HelperResolver {
    async fn create(&self, path: &Path) -> BookmarkResult {
        let Some(raw) = path.to_str() else {
            return BookmarkResult::failed(path, "path is not valid UTF-8");
        };

        let stdout = match self.invoke("create", raw, self.timeout).await {
            Ok(stdout) => stdout,
            Err(err) => {
                self.log_failure("create", &err);
                return BookmarkResult::failed(path, err);
            }
        };

        match serde_json::from_slice::<BookmarkResult>(&stdout) {
            Ok(result) if result.bookmark.is_some() || result.error.is_some() => result,
            Ok(_) => BookmarkResult::failed(path, "bookmark helper returned no bookmark"),
            Err(err) => BookmarkResult::failed(path, format!("invalid helper output: {err}")),
        }
    }

    async fn resolve(&self, bookmark: &str) -> ResolveResult {
        let stdout = match self.invoke("resolve", bookmark, self.timeout).await {
            Ok(stdout) => stdout,
            Err(err) => {
                self.log_failure("resolve", &err);
                return ResolveResult::failed(bookmark, err);
            }
        };

        match serde_json::from_slice::<ResolveResult>(&stdout) {
            Ok(result) => result,
            Err(err) => ResolveResult::failed(bookmark, format!("invalid helper output: {err}")),
        }
    }

    async fn batch_create(&self, paths: &[PathBuf]) -> BTreeMap<PathBuf, String> {
        let mut out = BTreeMap::new();
        let inputs: Vec<&str> = paths.iter().filter_map(|path| path.to_str()).collect();
        if inputs.is_empty() {
            return out;
        }

        let argument = match serde_json::to_string(&inputs) {
            Ok(argument) => argument,
            Err(err) => {
                self.log_failure("batch-create", &err.to_string());
                return out;
            }
        };

        let stdout = match self.invoke("batch-create", &argument, self.batch_timeout).await {
            Ok(stdout) => stdout,
            Err(err) => {
                self.log_failure("batch-create", &err);
                return out;
            }
        };

        let results: Vec<BookmarkResult> = match serde_json::from_slice(&stdout) {
            Ok(results) => results,
            Err(err) => {
                self.log_failure("batch-create", &format!("invalid helper output: {err}"));
                return out;
            }
        };

        // Results come back in input order; fall back to the echoed path if the counts differ.
        if results.len() == inputs.len() {
            for (input, result) in inputs.iter().zip(results) {
                if let Some(bookmark) = result.bookmark {
                    out.insert(PathBuf::from(input), bookmark);
                }
            }
        } else {
            for result in results {
                if let Some(bookmark) = result.bookmark {
                    out.insert(result.path, bookmark);
                }
            }
        }
        out
    }
}
