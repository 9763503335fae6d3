//! `eduerp` - Records manager for an educational institution
//!
//! This library keeps streams, classes, students and faculty in an in-memory
//! store, persists it as a single JSON document, and drives it from an
//! interactive menu or one-shot CLI subcommands.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod menu;
pub mod model;
pub mod store;

pub use config::Config;
pub use error::{Error, RecordKind, Result};
pub use logging::init_logging;
pub use menu::Menu;
pub use model::{Class, ClassRef, Faculty, FacultyId, Stream, Student, StudentId};
pub use store::{DataStore, FacultyMatch, StoreStats, StudentMatch};
