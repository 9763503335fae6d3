//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::{FacultyId, StudentId};

fn parse_student_id(s: &str) -> Result<StudentId, String> {
    s.parse().map_err(|e: crate::Error| e.to_string())
}

fn parse_faculty_id(s: &str) -> Result<FacultyId, String> {
    s.parse().map_err(|e: crate::Error| e.to_string())
}

/// Stream management commands.
#[derive(Debug, Subcommand)]
pub enum StreamCommand {
    /// Add a stream
    Add {
        /// Stream name (e.g. BCA, "BSc IT")
        name: String,
    },

    /// Remove a stream with all its classes and students
    Remove {
        /// Stream name
        name: String,
    },
}

/// Class management commands.
#[derive(Debug, Subcommand)]
pub enum ClassCommand {
    /// Add a class to a stream
    Add {
        /// Stream name
        stream: String,
        /// Class name (e.g. 1A, Year1)
        class: String,
    },

    /// Remove a class and its students
    Remove {
        /// Stream name
        stream: String,
        /// Class name
        class: String,
    },
}

/// Student management commands.
#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    /// Enroll a student in a class
    Add {
        /// Stream name
        stream: String,
        /// Class name
        class: String,
        /// Student name
        name: String,
    },

    /// Remove a student by ID
    Remove {
        /// Student ID (e.g. STU001)
        #[arg(value_parser = parse_student_id)]
        id: StudentId,
    },
}

/// Faculty management commands.
#[derive(Debug, Subcommand)]
pub enum FacultyCommand {
    /// Add a faculty member
    Add {
        /// Faculty name
        name: String,
        /// Subject taught
        subject: String,
    },

    /// Remove a faculty member and all of their class assignments
    Remove {
        /// Faculty ID (e.g. FAC001)
        #[arg(value_parser = parse_faculty_id)]
        id: FacultyId,
    },

    /// Assign a faculty member to a class
    Assign {
        /// Faculty ID
        #[arg(value_parser = parse_faculty_id)]
        id: FacultyId,
        /// Stream name
        stream: String,
        /// Class name
        class: String,
    },

    /// Remove a faculty member from a class
    Unassign {
        /// Faculty ID
        #[arg(value_parser = parse_faculty_id)]
        id: FacultyId,
        /// Stream name
        stream: String,
        /// Class name
        class: String,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Print the raw data document instead of a tree
    #[arg(short, long)]
    pub json: bool,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// What to search
    #[arg(value_enum)]
    pub target: SearchTarget,

    /// Name fragment or exact ID
    pub query: String,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Which report to print
    #[arg(value_enum)]
    pub kind: ReportKind,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Record type to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchTarget {
    /// Enrolled students
    Student,
    /// Faculty members
    Faculty,
}

/// Available reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Faculty members without any class assignment
    UnassignedFaculty,
    /// Classes no faculty member is assigned to
    ClassesWithoutFaculty,
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_parse_student_id() {
        assert_eq!(parse_student_id("STU004"), Ok(StudentId::new(4)));
        assert!(parse_student_id("FAC004").is_err());
    }

    #[test]
    fn test_parse_faculty_id() {
        assert_eq!(parse_faculty_id("fac2"), Ok(FacultyId::new(2)));
        let err = parse_faculty_id("nobody").unwrap_err();
        assert!(err.contains("nobody"));
    }

    #[test]
    fn test_report_kind_value_names() {
        let names: Vec<_> = ReportKind::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["unassigned-faculty", "classes-without-faculty"]);
    }

    #[test]
    fn test_search_command_debug() {
        let cmd = SearchCommand {
            target: SearchTarget::Student,
            query: "Alice".to_string(),
            limit: 20,
            format: OutputFormat::Plain,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Alice"));
        assert!(debug_str.contains("Student"));
    }
}
