//! `eduerp` - CLI for the records manager
//!
//! Runs the interactive menu by default, or performs one action per
//! invocation when a subcommand is given.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use eduerp::cli::{
    ClassCommand, Cli, Command, ConfigCommand, FacultyCommand, OutputFormat, ReportKind,
    SearchCommand, SearchTarget, StreamCommand, StudentCommand,
};
use eduerp::menu::{self, Menu};
use eduerp::{init_logging, Config, DataStore};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config =
        Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    if let Some(path) = &cli.data_file {
        config = config
            .with_data_file(path.clone())
            .context("invalid --data-file")?;
    }

    // Execute the command
    let command = cli.effective_command();
    let save = command.is_mutating();
    match command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Menu => with_store(&config, save, |store| run_menu(store, &config)),
        Command::Status(cmd) => with_store(&config, save, |store| {
            handle_status(&config, store, cmd.json)
        }),
        Command::Show(cmd) => with_store(&config, save, |store| handle_show(store, cmd.json)),
        Command::Stream(cmd) => with_store(&config, save, |store| handle_stream(store, cmd)),
        Command::Class(cmd) => with_store(&config, save, |store| handle_class(store, cmd)),
        Command::Student(cmd) => with_store(&config, save, |store| handle_student(store, cmd)),
        Command::Faculty(cmd) => with_store(&config, save, |store| handle_faculty(store, cmd)),
        Command::Search(cmd) => with_store(&config, save, |store| handle_search(store, cmd)),
        Command::Report(cmd) => with_store(&config, save, |store| handle_report(store, cmd.kind)),
        Command::Backup => with_store(&config, save, |store| handle_backup(&config, store)),
    }
}

/// Open the data file, run `action`, and save afterwards when `save` is set.
///
/// A missing data file starts an empty store; an unreadable or corrupt one
/// aborts so that nothing overwrites it.
fn with_store<F>(config: &Config, save: bool, action: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut DataStore) -> anyhow::Result<()>,
{
    let path = config.data_file();
    let mut store = DataStore::open(&path)
        .with_context(|| format!("cannot load data file {}", path.display()))?;
    debug!(path = %path.display(), "data file opened");

    action(&mut store)?;

    if save {
        store
            .save(&path, config.storage.pretty)
            .with_context(|| format!("cannot save data file {}", path.display()))?;
        info!(path = %path.display(), "data file saved");
    }
    Ok(())
}

fn run_menu(store: &mut DataStore, config: &Config) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(stdin.lock(), stdout.lock(), store, config).run()?;
    Ok(())
}

fn handle_status(config: &Config, store: &DataStore, json: bool) -> anyhow::Result<()> {
    let data_file = config.data_file();
    let backup_dir = config.backup_dir();
    let stats = store.stats();

    if json {
        let status = serde_json::json!({
            "data_file": data_file,
            "data_file_exists": data_file.exists(),
            "backup_dir": backup_dir,
            "stats": stats,
            "next_student_id": store.next_student_id().to_string(),
            "next_faculty_id": store.next_faculty_id().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("eduerp status");
        println!("-------------");
        println!(
            "Data file:    {}{}",
            data_file.display(),
            if data_file.exists() {
                ""
            } else {
                " (not created yet)"
            }
        );
        println!("Backup dir:   {}", backup_dir.display());
        println!();
        println!("Streams:      {}", stats.streams);
        println!("Classes:      {}", stats.classes);
        println!("Students:     {}", stats.students);
        println!("Faculty:      {}", stats.faculty);
        println!("Assignments:  {}", stats.assignments);
        println!();
        println!("Next student: {}", store.next_student_id());
        println!("Next faculty: {}", store.next_faculty_id());
    }
    Ok(())
}

fn handle_show(store: &DataStore, json: bool) -> anyhow::Result<()> {
    if json {
        print!("{}", store.to_json(true)?);
    } else {
        let mut out = io::stdout().lock();
        menu::write_tree(store, &mut out)?;
        out.flush()?;
    }
    Ok(())
}

fn handle_stream(store: &mut DataStore, cmd: &StreamCommand) -> anyhow::Result<()> {
    match cmd {
        StreamCommand::Add { name } => {
            store.add_stream(name)?;
            println!("Added stream '{}'", name.trim());
        }
        StreamCommand::Remove { name } => {
            let removed = store.remove_stream(name)?;
            println!(
                "Removed stream '{name}' ({} classes, {} students)",
                removed.classes.len(),
                removed.student_count()
            );
        }
    }
    Ok(())
}

fn handle_class(store: &mut DataStore, cmd: &ClassCommand) -> anyhow::Result<()> {
    match cmd {
        ClassCommand::Add { stream, class } => {
            store.add_class(stream, class)?;
            println!("Added class '{}' to {stream}", class.trim());
        }
        ClassCommand::Remove { stream, class } => {
            let removed = store.remove_class(stream, class)?;
            println!(
                "Removed class '{class}' from {stream} ({} students)",
                removed.students.len()
            );
        }
    }
    Ok(())
}

fn handle_student(store: &mut DataStore, cmd: &StudentCommand) -> anyhow::Result<()> {
    match cmd {
        StudentCommand::Add {
            stream,
            class,
            name,
        } => {
            let id = store.enroll_student(stream, class, name)?;
            println!("{id}");
        }
        StudentCommand::Remove { id } => {
            let (location, student) = store.remove_student(*id)?;
            println!("Removed {id}: {} ({location})", student.name);
        }
    }
    Ok(())
}

fn handle_faculty(store: &mut DataStore, cmd: &FacultyCommand) -> anyhow::Result<()> {
    match cmd {
        FacultyCommand::Add { name, subject } => {
            let id = store.add_faculty(name, subject)?;
            println!("{id}");
        }
        FacultyCommand::Remove { id } => {
            let faculty = store.remove_faculty(*id)?;
            println!("Removed {}", menu::faculty_label(*id, &faculty));
        }
        FacultyCommand::Assign { id, stream, class } => {
            if store.assign_faculty(*id, stream, class)? {
                println!("Assigned {id} to {stream} - {class}");
            } else {
                println!("{id} is already assigned to {stream} - {class}");
            }
        }
        FacultyCommand::Unassign { id, stream, class } => {
            if store.unassign_faculty(*id, stream, class)? {
                println!("Unassigned {id} from {stream} - {class}");
            } else {
                println!("{id} was not assigned to {stream} - {class}");
            }
        }
    }
    Ok(())
}

fn handle_search(store: &DataStore, cmd: &SearchCommand) -> anyhow::Result<()> {
    let mut lines = Vec::new();
    let mut rows = Vec::new();
    match cmd.target {
        SearchTarget::Student => {
            for hit in store.search_students(&cmd.query).take(cmd.limit) {
                lines.push(format!("{}: {} ({})", hit.id, hit.student.name, hit.location()));
                rows.push(serde_json::json!({
                    "id": hit.id,
                    "name": hit.student.name,
                    "stream": hit.stream,
                    "class": hit.class,
                }));
            }
        }
        SearchTarget::Faculty => {
            for hit in store.search_faculty(&cmd.query).take(cmd.limit) {
                lines.push(menu::faculty_label(hit.id, hit.faculty));
                rows.push(serde_json::json!({
                    "id": hit.id,
                    "name": hit.faculty.name,
                    "subject": hit.faculty.subject,
                    "classes": store.faculty_assignments(hit.id),
                }));
            }
        }
    }

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain if lines.is_empty() => println!("No matches for \"{}\"", cmd.query),
        OutputFormat::Plain => {
            for line in &lines {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn handle_report(store: &DataStore, kind: ReportKind) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match kind {
        ReportKind::UnassignedFaculty => menu::write_unassigned_faculty(store, &mut out)?,
        ReportKind::ClassesWithoutFaculty => menu::write_classes_without_faculty(store, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn handle_backup(config: &Config, store: &DataStore) -> anyhow::Result<()> {
    let dir = config.backup_dir();
    let path = store
        .backup(
            &dir,
            &config.storage.backup_prefix,
            &chrono::Local::now().naive_local(),
            config.storage.pretty,
        )
        .with_context(|| format!("cannot write backup in {}", dir.display()))?;
    println!("Backup created: {}", path.display());
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data file:          {}", config.data_file().display());
                println!("  Backup dir:         {}", config.backup_dir().display());
                println!("  Backup prefix:      {}", config.storage.backup_prefix);
                println!("  Pretty JSON:        {}", config.storage.pretty);
                println!("  Save on exit:       {}", config.storage.save_on_exit);
                println!();
                println!("[Menu]");
                println!("  Confirm removals:   {}", config.menu.confirm_removals);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.clone().unwrap_or_else(Config::default_config_path);
            validate_config(&path)?;
        }
    }
    Ok(())
}

fn validate_config(path: &Path) -> anyhow::Result<()> {
    println!("Validating configuration: {}", path.display());
    Config::load_from(Some(path.to_path_buf()))
        .with_context(|| format!("configuration {} is invalid", path.display()))?;
    println!("Configuration is valid.");
    Ok(())
}
