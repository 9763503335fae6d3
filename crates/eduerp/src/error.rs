//! Error types for eduerp.
//!
//! This module defines all error types used throughout the eduerp crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A stream (top-level program).
    Stream,
    /// An enrolled student.
    Student,
    /// A faculty member.
    Faculty,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream => write!(f, "stream"),
            Self::Student => write!(f, "student"),
            Self::Faculty => write!(f, "faculty"),
        }
    }
}

/// The main error type for eduerp operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Errors ===
    /// A record with the same unique key already exists.
    #[error("{kind} '{key}' already exists")]
    DuplicateKey {
        /// Kind of record.
        kind: RecordKind,
        /// The conflicting key.
        key: String,
    },

    /// A referenced record does not exist.
    #[error("{kind} '{key}' not found")]
    NotFound {
        /// Kind of record.
        kind: RecordKind,
        /// The key that was looked up.
        key: String,
    },

    /// A class with the same name already exists in the stream.
    #[error("class '{class}' already exists in stream '{stream}'")]
    DuplicateClass {
        /// Stream holding the class.
        stream: String,
        /// Name of the class.
        class: String,
    },

    /// A class does not exist in the stream.
    #[error("class '{class}' not found in stream '{stream}'")]
    ClassNotFound {
        /// Stream that was searched.
        stream: String,
        /// Name of the class.
        class: String,
    },

    /// A class cannot be removed while faculty are assigned to it.
    #[error("cannot remove class '{class}' in '{stream}': faculty members are assigned to it")]
    ClassInUse {
        /// Stream holding the class.
        stream: String,
        /// Name of the class.
        class: String,
    },

    /// User-supplied input was rejected.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was wrong.
        message: String,
    },

    // === Data File Errors ===
    /// The data file is malformed or violates the schema.
    #[error("corrupt data in {path}: {message}")]
    CorruptData {
        /// Path to the offending file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// Failed to read a data file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a data or backup file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path that couldn't be written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for eduerp operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a duplicate key error.
    #[must_use]
    pub fn duplicate(kind: RecordKind, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            kind,
            key: key.into(),
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(kind: RecordKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Create a duplicate class error.
    #[must_use]
    pub fn duplicate_class(stream: impl Into<String>, class: impl Into<String>) -> Self {
        Self::DuplicateClass {
            stream: stream.into(),
            class: class.into(),
        }
    }

    /// Create a missing class error.
    #[must_use]
    pub fn class_not_found(stream: impl Into<String>, class: impl Into<String>) -> Self {
        Self::ClassNotFound {
            stream: stream.into(),
            class: class.into(),
        }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a corrupt data error for the given file.
    #[must_use]
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptData {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ClassNotFound { .. })
    }

    /// Check if this error is a duplicate key.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. } | Self::DuplicateClass { .. })
    }

    /// Check if this error means the data file could not be trusted.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }

    /// Check if this error is a filesystem failure.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::FileRead { .. }
                | Self::FileWrite { .. }
                | Self::DirectoryCreate { .. }
        )
    }
}
