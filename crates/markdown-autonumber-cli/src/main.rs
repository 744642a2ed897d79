use anyhow::Result;
use markdown_autonumber_config::Config;
use markdown_autonumber_engine::headings::{decrease_headings, increase_headings};
use markdown_autonumber_engine::{Editor, NumberingController, PassOptions, TextBuffer, io};
use relative_path::{RelativePath, RelativePathBuf};
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, process};

const USAGE: &str = "<headings|formulas|auto|remove-headings|remove-formulas|save-settings|increase-headings|decrease-headings> [--force] [path]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Headings,
    Formulas,
    Auto,
    RemoveHeadings,
    RemoveFormulas,
    SaveSettings,
    IncreaseHeadings,
    DecreaseHeadings,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "headings" => Some(Self::Headings),
            "formulas" => Some(Self::Formulas),
            "auto" => Some(Self::Auto),
            "remove-headings" => Some(Self::RemoveHeadings),
            "remove-formulas" => Some(Self::RemoveFormulas),
            "save-settings" => Some(Self::SaveSettings),
            "increase-headings" => Some(Self::IncreaseHeadings),
            "decrease-headings" => Some(Self::DecreaseHeadings),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    force: bool,
    path: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut command = None;
    let mut force = false;
    let mut path = None;

    for arg in args {
        match arg.as_str() {
            "--force" | "-f" => force = true,
            other if command.is_none() => command = Some(Command::parse(other)?),
            other if path.is_none() => path = Some(PathBuf::from(other)),
            _ => return None,
        }
    }

    Some(Args {
        command: command?,
        force,
        path,
    })
}

/// Run one command against an in-memory document.
fn run_command(
    controller: &mut NumberingController,
    command: Command,
    force: bool,
    doc: &mut TextBuffer,
) -> Result<bool> {
    let options = PassOptions {
        force,
        ..PassOptions::default()
    };
    let last_line = doc.line_count().saturating_sub(1);

    let changed = match command {
        Command::Headings => controller.renumber_headings(Some(doc), options),
        Command::Formulas => controller.renumber_formulas(Some(doc), options),
        Command::RemoveHeadings => controller.remove_heading_numbering(Some(doc)),
        Command::RemoveFormulas => controller.remove_formula_numbering(Some(doc)),
        Command::SaveSettings => controller.save_settings(Some(doc), true, true)?,
        Command::Auto => {
            let now = Instant::now();
            let deadline = now + controller.refresh_interval();
            controller.on_blur(now, Some(&*doc)) && controller.poll(deadline, Some(doc))
        }
        Command::IncreaseHeadings => {
            increase_headings(doc, 0, last_line, force).unwrap_or_else(|e| {
                log::warn!("{e}");
                false
            })
        }
        Command::DecreaseHeadings => {
            let limit = controller.resolve(&*doc).headings.limit_heading_from;
            decrease_headings(doc, 0, last_line, limit).unwrap_or_else(|e| {
                log::warn!("{e}");
                false
            })
        }
    };
    Ok(changed)
}

/// Apply `command` to one file and write it back if it changed.
fn process_file(
    config: &Config,
    command: Command,
    force: bool,
    relative_path: &RelativePath,
    notes_root: &Path,
) -> Result<bool> {
    let content = io::read_file(relative_path, notes_root)?;
    let mut doc = TextBuffer::from(content.as_str());
    let mut controller = config.controller();

    let changed = run_command(&mut controller, command, force, &mut doc)?;
    if changed {
        io::write_file(relative_path, notes_root, &doc.contents())?;
        log::info!("Updated {relative_path}");
    }
    Ok(changed)
}

/// Files a path argument refers to, relative to the returned root.
fn resolve_targets(path: &Path) -> Result<(PathBuf, Vec<RelativePathBuf>)> {
    if path.is_file() {
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Not a file: {}", path.display()))?;
        let relative = RelativePathBuf::from_path(Path::new(name))?;
        return Ok((root, vec![relative]));
    }

    io::validate_notes_dir(path)?;
    let files = io::scan_markdown_files(path)?;
    Ok((path.to_path_buf(), files))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(parsed) = parse_args(&args[1..]) else {
        eprintln!("Usage: {} {USAGE}", args[0]);
        process::exit(1);
    };

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::info!("No config file at {}, using defaults", config_path.display());
            Config::default()
        }
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let Some(path) = parsed.path.clone().or_else(|| config.notes_path.clone()) else {
        eprintln!("Error: No path provided and no notes_path in config");
        eprintln!("Usage: {} {USAGE}", args[0]);
        eprintln!("Or set notes_path in {}", config_path.display());
        process::exit(1);
    };

    let (root, files) = match resolve_targets(&path) {
        Ok(targets) => targets,
        Err(e) => {
            eprintln!("Error: Path '{}' is invalid: {e}", path.display());
            process::exit(1);
        }
    };

    let mut changed_count = 0;
    for file in &files {
        match process_file(&config, parsed.command, parsed.force, file, &root) {
            Ok(true) => {
                changed_count += 1;
                println!("updated   {file}");
            }
            Ok(false) => println!("unchanged {file}"),
            Err(e) => eprintln!("failed    {file}: {e}"),
        }
    }
    println!("{changed_count} of {} file(s) changed", files.len());

    Ok(())
}
