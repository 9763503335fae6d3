//! In-memory data store for eduerp.
//!
//! [`DataStore`] owns every record: streams and their classes, enrolled
//! students, and faculty members. All mutations go through its methods so
//! that ID counters stay monotonic and no record ever references a missing
//! parent. Persistence lives in [`persist`], search in [`search`].

pub mod migrations;
pub mod persist;
pub mod search;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, RecordKind, Result};
use crate::model::{Class, ClassRef, Faculty, FacultyId, Stream, Student, StudentId};

pub use search::{FacultyMatch, StudentMatch};

/// The institution's records.
///
/// Serializes to the data file layout: two ID counters, the stream tree, and
/// a top-level faculty map keyed by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStore {
    /// Next value handed out by [`DataStore::enroll_student`].
    next_student_id: u32,
    /// Next value handed out by [`DataStore::add_faculty`].
    next_faculty_id: u32,
    /// Streams keyed by name.
    #[serde(default)]
    streams: BTreeMap<String, Stream>,
    /// Faculty members keyed by ID.
    #[serde(default)]
    faculty: BTreeMap<FacultyId, Faculty>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self {
            next_student_id: 1,
            next_faculty_id: 1,
            streams: BTreeMap::new(),
            faculty: BTreeMap::new(),
        }
    }
}

/// Record counts across the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of streams.
    pub streams: usize,
    /// Number of classes across all streams.
    pub classes: usize,
    /// Number of enrolled students.
    pub students: usize,
    /// Number of faculty members.
    pub faculty: usize,
    /// Number of faculty-to-class links.
    pub assignments: usize,
}

/// Trim `value` and reject it when nothing is left.
fn required(what: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// The counter value after `current` has been issued.
fn advance(current: u32, what: &str) -> Result<u32> {
    current
        .checked_add(1)
        .ok_or_else(|| Error::invalid_input(format!("no {what} IDs left to issue")))
}

impl DataStore {
    /// Create an empty store with both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Streams ===

    /// Add a stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if the stream already exists, or
    /// [`Error::InvalidInput`] for an empty name.
    pub fn add_stream(&mut self, name: &str) -> Result<()> {
        let name = required("stream name", name)?;
        if self.streams.contains_key(&name) {
            return Err(Error::duplicate(RecordKind::Stream, name));
        }
        debug!(stream = %name, "adding stream");
        self.streams.insert(name, Stream::default());
        Ok(())
    }

    /// Remove a stream together with its classes and students.
    ///
    /// Faculty records are kept; only their links into the stream disappear.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the stream does not exist.
    pub fn remove_stream(&mut self, name: &str) -> Result<Stream> {
        let name = name.trim();
        let stream = self
            .streams
            .remove(name)
            .ok_or_else(|| Error::not_found(RecordKind::Stream, name))?;
        info!(
            stream = %name,
            classes = stream.classes.len(),
            students = stream.student_count(),
            "removed stream"
        );
        Ok(stream)
    }

    /// Look up a stream by name.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&Stream> {
        self.streams.get(name.trim())
    }

    /// All streams, ordered by name.
    #[must_use]
    pub fn streams(&self) -> &BTreeMap<String, Stream> {
        &self.streams
    }

    // === Classes ===

    /// Add a class to an existing stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the stream does not exist,
    /// [`Error::DuplicateClass`] if the class already exists in it, or
    /// [`Error::InvalidInput`] for an empty name.
    pub fn add_class(&mut self, stream: &str, class: &str) -> Result<()> {
        let class = required("class name", class)?;
        let stream_name = stream.trim();
        let stream = self
            .streams
            .get_mut(stream_name)
            .ok_or_else(|| Error::not_found(RecordKind::Stream, stream_name))?;
        if stream.classes.contains_key(&class) {
            return Err(Error::duplicate_class(stream_name, class));
        }
        debug!(stream = %stream_name, class = %class, "adding class");
        stream.classes.insert(class, Class::default());
        Ok(())
    }

    /// Remove a class and its students.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::ClassNotFound`] if the stream or
    /// class does not exist, or [`Error::ClassInUse`] while any faculty member is assigned to it.
    pub fn remove_class(&mut self, stream: &str, class: &str) -> Result<Class> {
        let (stream, class) = (stream.trim(), class.trim());
        if self.class_mut(stream, class)?.has_faculty() {
            return Err(Error::ClassInUse {
                stream: stream.to_string(),
                class: class.to_string(),
            });
        }
        let removed = self
            .streams
            .get_mut(stream)
            .and_then(|s| s.classes.remove(class))
            .ok_or_else(|| Error::class_not_found(stream, class))?;
        info!(
            stream = %stream,
            class = %class,
            students = removed.students.len(),
            "removed class"
        );
        Ok(removed)
    }

    /// Look up a class within a stream.
    #[must_use]
    pub fn class(&self, stream: &str, class: &str) -> Option<&Class> {
        self.stream(stream)?.classes.get(class.trim())
    }

    fn class_mut(&mut self, stream: &str, class: &str) -> Result<&mut Class> {
        let stream_name = stream.trim();
        let class_name = class.trim();
        self.streams
            .get_mut(stream_name)
            .ok_or_else(|| Error::not_found(RecordKind::Stream, stream_name))?
            .classes
            .get_mut(class_name)
            .ok_or_else(|| Error::class_not_found(stream_name, class_name))
    }

    /// Every class in the store, ordered by stream then class name.
    pub fn classes(&self) -> impl Iterator<Item = (ClassRef, &Class)> + '_ {
        self.streams.iter().flat_map(|(stream, s)| {
            s.classes
                .iter()
                .map(move |(class, c)| (ClassRef::new(stream.as_str(), class.as_str()), c))
        })
    }

    // === Students ===

    /// Enroll a student in a class, issuing the next student ID.
    ///
    /// The counter only advances when enrollment succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::ClassNotFound`] if the stream or
    /// class does not exist, or [`Error::InvalidInput`] for an empty name or
    /// when the student ID counter is exhausted.
    pub fn enroll_student(&mut self, stream: &str, class: &str, name: &str) -> Result<StudentId> {
        let name = required("student name", name)?;
        let id = StudentId::new(self.next_student_id);
        let next = advance(self.next_student_id, "student")?;
        let target = self.class_mut(stream, class)?;
        target.students.insert(id, Student { name });
        self.next_student_id = next;
        debug!(%id, stream = %stream.trim(), class = %class.trim(), "enrolled student");
        Ok(id)
    }

    /// Remove a student by ID, returning where it was enrolled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no class holds the ID.
    pub fn remove_student(&mut self, id: StudentId) -> Result<(ClassRef, Student)> {
        for (stream_name, stream) in &mut self.streams {
            for (class_name, class) in &mut stream.classes {
                if let Some(student) = class.students.remove(&id) {
                    let location = ClassRef::new(stream_name.as_str(), class_name.as_str());
                    info!(%id, class = %location, "removed student");
                    return Ok((location, student));
                }
            }
        }
        Err(Error::not_found(RecordKind::Student, id.to_string()))
    }

    /// Look up a student and the class that holds it.
    #[must_use]
    pub fn student(&self, id: StudentId) -> Option<(ClassRef, &Student)> {
        self.classes()
            .find_map(|(location, class)| class.students.get(&id).map(|s| (location, s)))
    }

    /// The ID the next enrollment will receive.
    #[must_use]
    pub fn next_student_id(&self) -> StudentId {
        StudentId::new(self.next_student_id)
    }

    // === Faculty ===

    /// Add a faculty member, issuing the next faculty ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty name or subject.
    pub fn add_faculty(&mut self, name: &str, subject: &str) -> Result<FacultyId> {
        let name = required("faculty name", name)?;
        let subject = required("subject", subject)?;
        let id = FacultyId::new(self.next_faculty_id);
        self.next_faculty_id = advance(self.next_faculty_id, "faculty")?;
        debug!(%id, name = %name, "adding faculty");
        self.faculty.insert(id, Faculty { name, subject });
        Ok(id)
    }

    /// Assign a faculty member to a class.
    ///
    /// Returns `false` if the link already existed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the faculty member, stream or class does
    /// not exist.
    pub fn assign_faculty(&mut self, id: FacultyId, stream: &str, class: &str) -> Result<bool> {
        if !self.faculty.contains_key(&id) {
            return Err(Error::not_found(RecordKind::Faculty, id.to_string()));
        }
        let added = self.class_mut(stream, class)?.faculty_assignments.insert(id);
        debug!(%id, stream = %stream.trim(), class = %class.trim(), added, "assigned faculty");
        Ok(added)
    }

    /// Remove one faculty-to-class link.
    ///
    /// Returns `false` if the faculty member was not assigned to the class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the faculty member, stream or class does
    /// not exist.
    pub fn unassign_faculty(&mut self, id: FacultyId, stream: &str, class: &str) -> Result<bool> {
        if !self.faculty.contains_key(&id) {
            return Err(Error::not_found(RecordKind::Faculty, id.to_string()));
        }
        let removed = self.class_mut(stream, class)?.faculty_assignments.remove(&id);
        debug!(%id, stream = %stream.trim(), class = %class.trim(), removed, "unassigned faculty");
        Ok(removed)
    }

    /// Remove a faculty member and every link to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the faculty member does not exist.
    pub fn remove_faculty(&mut self, id: FacultyId) -> Result<Faculty> {
        let faculty = self
            .faculty
            .remove(&id)
            .ok_or_else(|| Error::not_found(RecordKind::Faculty, id.to_string()))?;
        let mut links = 0;
        for stream in self.streams.values_mut() {
            for class in stream.classes.values_mut() {
                if class.faculty_assignments.remove(&id) {
                    links += 1;
                }
            }
        }
        info!(%id, links, "removed faculty");
        Ok(faculty)
    }

    /// Look up a faculty member.
    #[must_use]
    pub fn faculty(&self, id: FacultyId) -> Option<&Faculty> {
        self.faculty.get(&id)
    }

    /// All faculty members, ordered by ID.
    #[must_use]
    pub fn faculty_members(&self) -> &BTreeMap<FacultyId, Faculty> {
        &self.faculty
    }

    /// Classes a faculty member is assigned to.
    #[must_use]
    pub fn faculty_assignments(&self, id: FacultyId) -> Vec<ClassRef> {
        self.classes()
            .filter(|(_, class)| class.faculty_assignments.contains(&id))
            .map(|(location, _)| location)
            .collect()
    }

    /// The ID the next faculty member will receive.
    #[must_use]
    pub fn next_faculty_id(&self) -> FacultyId {
        FacultyId::new(self.next_faculty_id)
    }

    // === Reports ===

    /// Faculty members without any class assignment.
    #[must_use]
    pub fn unassigned_faculty(&self) -> Vec<(FacultyId, &Faculty)> {
        let assigned: BTreeSet<FacultyId> = self
            .classes()
            .flat_map(|(_, class)| class.faculty_assignments.iter().copied())
            .collect();
        self.faculty
            .iter()
            .filter(|(id, _)| !assigned.contains(*id))
            .map(|(id, faculty)| (*id, faculty))
            .collect()
    }

    /// Classes no faculty member is assigned to.
    #[must_use]
    pub fn classes_without_faculty(&self) -> Vec<ClassRef> {
        self.classes()
            .filter(|(_, class)| !class.has_faculty())
            .map(|(location, _)| location)
            .collect()
    }

    /// Count records across the store.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            streams: self.streams.len(),
            faculty: self.faculty.len(),
            ..StoreStats::default()
        };
        for (_, class) in self.classes() {
            stats.classes += 1;
            stats.students += class.students.len();
            stats.assignments += class.faculty_assignments.len();
        }
        stats
    }

    /// Check whether the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.faculty.is_empty()
    }

    /// Check structural invariants of a decoded store.
    ///
    /// Dangling faculty links, a student ID held by two classes, or blank
    /// names are reported as an error message. Counters that trail an issued
    /// ID are moved past it so IDs are never reissued.
    pub(crate) fn validate(&mut self) -> std::result::Result<(), String> {
        let mut seen_students = BTreeSet::new();
        let mut max_student = 0;
        for (stream_name, stream) in &self.streams {
            if stream_name.trim().is_empty() {
                return Err("stream with an empty name".to_string());
            }
            for (class_name, class) in &stream.classes {
                if class_name.trim().is_empty() {
                    return Err(format!("class with an empty name in stream '{stream_name}'"));
                }
                for id in class.students.keys() {
                    if !seen_students.insert(*id) {
                        return Err(format!("student {id} is enrolled in more than one class"));
                    }
                    max_student = max_student.max(id.value());
                }
                if let Some(missing) = class
                    .faculty_assignments
                    .iter()
                    .find(|id| !self.faculty.contains_key(*id))
                {
                    return Err(format!(
                        "class '{class_name}' in stream '{stream_name}' references unknown faculty {missing}"
                    ));
                }
            }
        }
        let max_faculty = self.faculty.keys().map(|id| id.value()).max().unwrap_or(0);

        if self.next_student_id <= max_student {
            warn!(
                counter = self.next_student_id,
                highest = max_student,
                "student counter behind issued IDs; advancing"
            );
            self.next_student_id = max_student
                .checked_add(1)
                .ok_or_else(|| format!("student ID {max_student} leaves no room for new IDs"))?;
        }
        if self.next_faculty_id <= max_faculty {
            warn!(
                counter = self.next_faculty_id,
                highest = max_faculty,
                "faculty counter behind issued IDs; advancing"
            );
            self.next_faculty_id = max_faculty
                .checked_add(1)
                .ok_or_else(|| format!("faculty ID {max_faculty} leaves no room for new IDs"))?;
        }
        self.next_student_id = self.next_student_id.max(1);
        self.next_faculty_id = self.next_faculty_id.max(1);
        Ok(())
    }
}
