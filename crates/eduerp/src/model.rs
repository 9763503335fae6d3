//! Core record types for eduerp.
//!
//! This module defines the records held by the data store: streams, the
//! classes inside them, enrolled students, and faculty members. Streams and
//! classes are keyed by name in their parent map; students and faculty are
//! keyed by generated IDs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Defines a prefixed, zero-padded numeric record ID (`STU001`, `FAC012`).
///
/// IDs serialize as their display string so they can be used as JSON map keys.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(u32);

        impl $name {
            /// Prefix used in the display form.
            pub const PREFIX: &'static str = $prefix;

            /// Wrap a raw counter value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// The raw counter value.
            #[must_use]
            pub const fn value(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{:03}", Self::PREFIX, self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let digits = s
                    .get(..Self::PREFIX.len())
                    .filter(|prefix| prefix.eq_ignore_ascii_case(Self::PREFIX))
                    .map(|_| &s[Self::PREFIX.len()..])
                    .ok_or_else(|| {
                        Error::invalid_input(format!(
                            "'{s}' is not a {} ID (expected {}001)",
                            Self::PREFIX,
                            Self::PREFIX
                        ))
                    })?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::invalid_input(format!("'{s}' has no numeric part")));
                }
                let value: u32 = digits
                    .parse()
                    .map_err(|_| Error::invalid_input(format!("'{s}' is out of range")))?;
                if value == 0 {
                    return Err(Error::invalid_input(format!("'{s}' is not a valid ID")));
                }
                Ok(Self(value))
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            /// Strict form used when decoding stored data: only the exact
            /// display string is accepted, so `STU1` and `STU001` can never
            /// name the same record.
            fn try_from(value: String) -> Result<Self, Self::Error> {
                let id: Self = value.parse()?;
                if id.to_string() != value {
                    return Err(Error::invalid_input(format!(
                        "'{value}' is not a canonical ID (expected '{id}')"
                    )));
                }
                Ok(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

record_id!(
    /// Identifier issued to a student on enrollment.
    StudentId,
    "STU"
);

record_id!(
    /// Identifier issued to a faculty member when added.
    FacultyId,
    "FAC"
);

/// A top-level academic program (e.g. BCA, BSc IT).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Classes in this stream, keyed by class name.
    #[serde(default)]
    pub classes: BTreeMap<String, Class>,
}

impl Stream {
    /// Number of students enrolled across all classes of the stream.
    #[must_use]
    pub fn student_count(&self) -> usize {
        self.classes.values().map(|class| class.students.len()).sum()
    }
}

/// A cohort within a stream (a year or section).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Enrolled students, keyed by ID.
    #[serde(default)]
    pub students: BTreeMap<StudentId, Student>,
    /// Faculty members assigned to teach this class.
    #[serde(default)]
    pub faculty_assignments: BTreeSet<FacultyId>,
}

impl Class {
    /// Check if any faculty member is assigned to this class.
    #[must_use]
    pub fn has_faculty(&self) -> bool {
        !self.faculty_assignments.is_empty()
    }
}

/// An enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Full name as entered.
    pub name: String,
}

/// A faculty member.
///
/// Class assignments live on the class side; see
/// [`DataStore::faculty_assignments`](crate::store::DataStore::faculty_assignments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    /// Full name as entered.
    pub name: String,
    /// Subject taught. Empty for records upgraded from files that had none.
    #[serde(default)]
    pub subject: String,
}

/// A reference to one class within one stream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassRef {
    /// Stream name.
    pub stream: String,
    /// Class name.
    pub class: String,
}

impl ClassRef {
    /// Create a class reference.
    #[must_use]
    pub fn new(stream: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.stream, self.class)
    }
}
