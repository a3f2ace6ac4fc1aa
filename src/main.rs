// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Pinfold-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Pinfold and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pinfold CLI entrypoint.
//!
//! Every command prints JSON on stdout. Configuration is read from defaults, an optional
//! `--config` file, `PINFOLD_*` environment variables and finally command-line flags.

use std::error::Error;
use std::path::{Path, PathBuf};

use pinfold::store::manifest_json_schema;
use pinfold::{listing, JsonFileSettings, PinConfig, PinIndex, PinService, WriteDurability};
use serde_json::Value;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [options] list <dir>\n  {program} [options] pin <dir> <path>\n  {program} [options] unpin <dir> <path>\n  {program} [options] set <dir> [<path>...]\n  {program} [options] reorder <dir> <from> <to>\n  {program} [options] all\n  {program} [options] ls <dir> [--all]\n  {program} [options] migrate\n  {program} schema\n\nOptions:\n  --settings <file>   settings file holding the pinned-directory index\n  --config <file>     JSON config file\n  --helper <program>  external bookmark helper (default: in-process bookmarks)\n  --durable-writes    fsync manifests and settings after writing\n\nEnvironment: PINFOLD_SETTINGS, PINFOLD_HELPER, PINFOLD_LOG, RUST_LOG."
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PinCommand {
    List { dir: String },
    Pin { dir: String, path: String },
    Unpin { dir: String, path: String },
    Set { dir: String, paths: Vec<String> },
    Reorder { dir: String, from: usize, to: usize },
    All,
    Ls { dir: String, show_hidden: bool },
    Migrate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Schema,
    Pins(PinCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    settings: Option<String>,
    config: Option<String>,
    helper: Option<String>,
    durable_writes: bool,
    command: Command,
}

fn set_once(slot: &mut Option<String>, value: Option<String>) -> Result<(), ()> {
    if slot.is_some() {
        return Err(());
    }
    *slot = Some(value.ok_or(())?);
    Ok(())
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut settings = None;
    let mut config = None;
    let mut helper = None;
    let mut durable_writes = false;
    let mut show_hidden = false;
    let mut words = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => set_once(&mut settings, args.next())?,
            "--config" => set_once(&mut config, args.next())?,
            "--helper" => set_once(&mut helper, args.next())?,
            "--durable-writes" => {
                if durable_writes {
                    return Err(());
                }
                durable_writes = true;
            }
            "--all" => {
                if show_hidden {
                    return Err(());
                }
                show_hidden = true;
            }
            _ if arg.starts_with("--") => return Err(()),
            _ => words.push(arg),
        }
    }

    let mut words = words.into_iter();
    let name = words.next().ok_or(())?;
    let rest: Vec<String> = words.collect();
    if show_hidden && name != "ls" {
        return Err(());
    }

    let command = match (name.as_str(), rest.as_slice()) {
        ("schema", []) => Command::Schema,
        ("list", [dir]) => Command::Pins(PinCommand::List { dir: dir.clone() }),
        ("pin", [dir, path]) => Command::Pins(PinCommand::Pin {
            dir: dir.clone(),
            path: path.clone(),
        }),
        ("unpin", [dir, path]) => Command::Pins(PinCommand::Unpin {
            dir: dir.clone(),
            path: path.clone(),
        }),
        ("set", [dir, paths @ ..]) => Command::Pins(PinCommand::Set {
            dir: dir.clone(),
            paths: paths.to_vec(),
        }),
        ("reorder", [dir, from, to]) => Command::Pins(PinCommand::Reorder {
            dir: dir.clone(),
            from: from.parse().map_err(|_| ())?,
            to: to.parse().map_err(|_| ())?,
        }),
        ("all", []) => Command::Pins(PinCommand::All),
        ("ls", [dir]) => Command::Pins(PinCommand::Ls {
            dir: dir.clone(),
            show_hidden,
        }),
        ("migrate", []) => Command::Pins(PinCommand::Migrate),
        _ => return Err(()),
    };

    Ok(CliOptions {
        settings,
        config,
        helper,
        durable_writes,
        command,
    })
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn load_config(options: &CliOptions) -> Result<PinConfig, Box<dyn Error>> {
    let mut config = match &options.config {
        Some(path) => PinConfig::from_file(Path::new(path))?,
        None => PinConfig::default(),
    };
    config.apply_env(env_var);

    if let Some(path) = &options.settings {
        config.settings_path = Some(PathBuf::from(path));
    }
    if let Some(helper) = &options.helper {
        config.helper_command = Some(helper.split_whitespace().map(str::to_owned).collect());
    }
    if options.durable_writes {
        config.durability = WriteDurability::Durable;
    }
    config.validate()?;
    Ok(config)
}

fn absolute(path: &str) -> std::io::Result<PathBuf> {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()?.join(path))
}

async fn run(command: PinCommand, config: &PinConfig) -> Result<Value, Box<dyn Error>> {
    let settings_path = config.resolve_settings_path(env_var)?;
    let settings = JsonFileSettings::open(settings_path)
        .await?
        .with_durability(config.durability);
    let mut service = PinService::new(
        config.manifest_store(),
        PinIndex::new(settings),
        config.resolver(),
    );
    let report = service.startup().await?;

    let value = match command {
        PinCommand::List { dir } => serde_json::to_value(service.get_pinned(&absolute(&dir)?).await)?,
        PinCommand::Pin { dir, path } => {
            let pinned = service.add_pinned(&absolute(&dir)?, &absolute(&path)?).await?;
            serde_json::to_value(pinned)?
        }
        PinCommand::Unpin { dir, path } => {
            let pinned = service.remove_pinned(&absolute(&dir)?, &absolute(&path)?).await?;
            serde_json::to_value(pinned)?
        }
        PinCommand::Set { dir, paths } => {
            let dir = absolute(&dir)?;
            let paths = paths
                .iter()
                .map(|path| absolute(path))
                .collect::<Result<Vec<_>, _>>()?;
            service.set_pinned(&dir, &paths).await?;
            serde_json::to_value(service.get_pinned(&dir).await)?
        }
        PinCommand::Reorder { dir, from, to } => {
            serde_json::to_value(service.reorder(&absolute(&dir)?, from, to).await?)?
        }
        PinCommand::All => serde_json::to_value(service.get_all_pinned().await)?,
        PinCommand::Ls { dir, show_hidden } => {
            let files = listing::list_dir(&absolute(&dir)?, show_hidden, service.manifests()).await?;
            serde_json::to_value(files)?
        }
        PinCommand::Migrate => serde_json::to_value(report)?,
    };
    Ok(value)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "pinfold".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let config = load_config(&options)?;
        pinfold::logging::init(&config.log_level);

        let output = match options.command {
            Command::Schema => manifest_json_schema()?,
            Command::Pins(command) => {
                let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
                runtime.block_on(run(command, &config))?
            }
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("pinfold: {err}");
        std::process::exit(1);
    }
}
