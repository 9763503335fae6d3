//! Upgrades for older data file layouts.
//!
//! Files written by earlier versions of the records manager differ from the
//! current layout in three ways, all handled here on the raw JSON value
//! before typed decoding:
//!
//! - ID counters were named `student_counter` / `faculty_counter`, or were
//!   missing entirely.
//! - A class's `students` could be a plain list of names without IDs.
//! - Faculty lived inside each stream with a single `assigned_class` field
//!   instead of in a top-level map with links stored on the class.

use serde_json::{Map, Value};
use tracing::info;

use crate::model::{FacultyId, StudentId};

/// What [`upgrade`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Counters that were renamed or filled in.
    pub counters_fixed: usize,
    /// Students that received a newly issued ID.
    pub students_issued: usize,
    /// Faculty records moved out of a stream into the top-level map.
    pub faculty_moved: usize,
}

impl UpgradeReport {
    /// Check whether the document was already in the current layout.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Bring a raw data document up to the current layout.
///
/// # Errors
///
/// Returns a description of the problem when the document cannot be
/// upgraded (wrong top-level type, non-string legacy student entries,
/// conflicting faculty IDs).
pub fn upgrade(doc: &mut Value) -> Result<UpgradeReport, String> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| "top-level value must be an object".to_string())?;
    let mut report = UpgradeReport::default();

    for (current, legacy) in [
        ("next_student_id", "student_counter"),
        ("next_faculty_id", "faculty_counter"),
    ] {
        let old = root.remove(legacy);
        if !root.contains_key(current) {
            root.insert(current.to_string(), old.unwrap_or_else(|| Value::from(1)));
            report.counters_fixed += 1;
        }
    }

    let mut next_student = counter(root, "next_student_id")?;
    let mut moved_faculty = Map::new();

    let streams = root
        .entry("streams")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| "`streams` must be an object".to_string())?;

    for (stream_name, stream) in streams.iter_mut() {
        let stream = stream
            .as_object_mut()
            .ok_or_else(|| format!("stream '{stream_name}' must be an object"))?;
        let nested_faculty = stream.remove("faculty");
        let classes = stream
            .entry("classes")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| format!("classes of stream '{stream_name}' must be an object"))?;

        for (class_name, class) in classes.iter_mut() {
            let Some(class) = class.as_object_mut() else {
                return Err(format!("class '{class_name}' must be an object"));
            };
            if let Some(Value::Array(names)) = class.get("students") {
                let mut students = Map::new();
                for name in names {
                    let name = name.as_str().ok_or_else(|| {
                        format!("class '{class_name}' lists a student that is not a name")
                    })?;
                    let id = StudentId::new(next_student);
                    next_student = next_student
                        .checked_add(1)
                        .ok_or_else(|| "student counter overflow".to_string())?;
                    students.insert(id.to_string(), serde_json::json!({ "name": name }));
                    report.students_issued += 1;
                }
                class.insert("students".to_string(), Value::Object(students));
            }
        }

        // Faculty nested in a stream, each with at most one assigned class.
        if let Some(nested) = nested_faculty {
            let Value::Object(nested) = nested else {
                return Err(format!("faculty of stream '{stream_name}' must be an object"));
            };
            for (fid, mut record) in nested {
                let id: FacultyId = fid
                    .parse()
                    .map_err(|_| format!("stream '{stream_name}' has bad faculty ID '{fid}'"))?;
                let assigned = record
                    .as_object_mut()
                    .and_then(|r| r.remove("assigned_class"))
                    .and_then(|v| v.as_str().map(str::to_string));
                if let Some(class) = assigned.and_then(|name| classes.get_mut(&name)) {
                    link_faculty(class, id)?;
                }
                if moved_faculty.insert(id.to_string(), record).is_some() {
                    return Err(format!("faculty {id} appears in more than one stream"));
                }
                report.faculty_moved += 1;
            }
        }
    }

    if report.students_issued > 0 {
        root.insert("next_student_id".to_string(), Value::from(next_student));
    }

    if !moved_faculty.is_empty() {
        let faculty = root
            .entry("faculty")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| "`faculty` must be an object".to_string())?;
        for (id, record) in moved_faculty {
            if faculty.contains_key(&id) {
                return Err(format!("faculty {id} is defined twice"));
            }
            faculty.insert(id, record);
        }
    }

    if !report.is_noop() {
        info!(
            counters = report.counters_fixed,
            students = report.students_issued,
            faculty = report.faculty_moved,
            "upgraded legacy data layout"
        );
    }
    Ok(report)
}

/// Read a counter field as `u32`.
fn counter(root: &Map<String, Value>, key: &str) -> Result<u32, String> {
    root.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| format!("`{key}` must be a non-negative integer"))
}

/// Add a faculty ID to a class's assignment list.
fn link_faculty(class: &mut Value, id: FacultyId) -> Result<(), String> {
    let class = class
        .as_object_mut()
        .ok_or_else(|| "class must be an object".to_string())?;
    let links = class
        .entry("faculty_assignments")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| "`faculty_assignments` must be a list".to_string())?;
    let id = Value::from(id.to_string());
    if !links.contains(&id) {
        links.push(id);
    }
    Ok(())
}
