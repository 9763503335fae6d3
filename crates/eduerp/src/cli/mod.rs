//! Command-line interface for eduerp.
//!
//! This module provides the CLI structure for the `eduerp` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ClassCommand, ConfigCommand, FacultyCommand, OutputFormat, ReportCommand, ReportKind,
    SearchCommand, SearchTarget, ShowCommand, StatusCommand, StreamCommand, StudentCommand,
};

/// eduerp - Records manager for streams, classes, students and faculty
///
/// Runs an interactive menu by default. Subcommands perform a single action
/// against the data file and save it when something changed.
#[derive(Debug, Parser)]
#[command(name = "eduerp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the data file (overrides configuration)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute (defaults to the interactive menu)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the interactive menu
    Menu,

    /// Show data file location and record counts
    Status(StatusCommand),

    /// Print every stream, class, student and faculty member
    Show(ShowCommand),

    /// Manage streams
    #[command(subcommand)]
    Stream(StreamCommand),

    /// Manage classes
    #[command(subcommand)]
    Class(ClassCommand),

    /// Manage students
    #[command(subcommand)]
    Student(StudentCommand),

    /// Manage faculty and class assignments
    #[command(subcommand)]
    Faculty(FacultyCommand),

    /// Search students or faculty by name or ID
    Search(SearchCommand),

    /// Print an assignment report
    Report(ReportCommand),

    /// Write a timestamped backup of the data file
    Backup,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Check if this command changes records and should be saved.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Stream(_) | Self::Class(_) | Self::Student(_) | Self::Faculty(_)
        )
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                2 => crate::logging::Verbosity::Debug,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }

    /// The command to run, falling back to the interactive menu.
    #[must_use]
    pub fn effective_command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Menu)
    }
}
