//! Interactive numbered menu.
//!
//! A session reads choices line by line from any [`BufRead`] and writes
//! prompts and results to any [`Write`], so it runs the same way over a
//! terminal or a scripted buffer. End of input behaves like choosing Exit.

use std::io::{self, BufRead, Write};

use chrono::Local;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Class, Faculty, FacultyId, StudentId};
use crate::store::DataStore;

/// Entries of the main menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Add a stream.
    AddStream,
    /// Add a class to a stream.
    AddClass,
    /// Enroll a student.
    AddStudent,
    /// Add a faculty member.
    AddFaculty,
    /// Assign a faculty member to a class.
    AssignFaculty,
    /// Print the whole store.
    ViewAll,
    /// Remove a stream.
    RemoveStream,
    /// Remove a class.
    RemoveClass,
    /// Remove a student.
    RemoveStudent,
    /// Remove a faculty member.
    RemoveFaculty,
    /// Search students.
    SearchStudent,
    /// Search faculty.
    SearchFaculty,
    /// Report faculty without assignments.
    UnassignedFaculty,
    /// Report classes without faculty.
    ClassesWithoutFaculty,
    /// Write a timestamped backup.
    Backup,
    /// Save (when configured) and leave the menu.
    Exit,
}

impl MenuChoice {
    /// All choices in menu order; the menu number is the index plus one.
    pub const ALL: [Self; 16] = [
        Self::AddStream,
        Self::AddClass,
        Self::AddStudent,
        Self::AddFaculty,
        Self::AssignFaculty,
        Self::ViewAll,
        Self::RemoveStream,
        Self::RemoveClass,
        Self::RemoveStudent,
        Self::RemoveFaculty,
        Self::SearchStudent,
        Self::SearchFaculty,
        Self::UnassignedFaculty,
        Self::ClassesWithoutFaculty,
        Self::Backup,
        Self::Exit,
    ];

    /// Look up a choice by its menu number.
    #[must_use]
    pub fn from_number(number: usize) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index))
            .copied()
    }

    /// Text shown in the menu.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AddStream => "Add Stream",
            Self::AddClass => "Add Class",
            Self::AddStudent => "Add Student",
            Self::AddFaculty => "Add Faculty",
            Self::AssignFaculty => "Assign Faculty to Class",
            Self::ViewAll => "View All Data",
            Self::RemoveStream => "Remove Stream",
            Self::RemoveClass => "Remove Class",
            Self::RemoveStudent => "Remove Student",
            Self::RemoveFaculty => "Remove Faculty",
            Self::SearchStudent => "Search Student",
            Self::SearchFaculty => "Search Faculty",
            Self::UnassignedFaculty => "View Unassigned Faculty",
            Self::ClassesWithoutFaculty => "View Classes Without Faculty",
            Self::Backup => "Create Backup",
            Self::Exit => "Exit",
        }
    }
}

/// One interactive session over a borrowed store.
#[derive(Debug)]
pub struct Menu<'a, R, W> {
    input: R,
    output: W,
    store: &'a mut DataStore,
    config: &'a Config,
    closed: bool,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    /// Create a session reading from `input` and writing to `output`.
    pub fn new(input: R, output: W, store: &'a mut DataStore, config: &'a Config) -> Self {
        Self {
            input,
            output,
            store,
            config,
            closed: false,
        }
    }

    /// Run the menu until Exit is chosen or input ends.
    ///
    /// Record errors are printed and the loop continues. On exit the store is
    /// saved to the configured data file when `save_on_exit` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written, or if the
    /// exit save fails.
    pub fn run(&mut self) -> Result<()> {
        info!("menu session started");
        loop {
            self.print_menu()?;
            let Some(line) = self.prompt("Enter choice: ")? else {
                break;
            };
            let Some(choice) = line.parse().ok().and_then(MenuChoice::from_number) else {
                writeln!(self.output, "Invalid choice!")?;
                continue;
            };
            if choice == MenuChoice::Exit {
                break;
            }

            debug!(?choice, "menu action");
            match self.dispatch(choice) {
                Ok(()) => {}
                Err(Error::Io(e)) => return Err(Error::Io(e)),
                Err(e) => writeln!(self.output, "error: {e}")?,
            }
            if self.closed {
                break;
            }
        }
        self.finish()
    }

    fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::AddStream => self.add_stream(),
            MenuChoice::AddClass => self.add_class(),
            MenuChoice::AddStudent => self.add_student(),
            MenuChoice::AddFaculty => self.add_faculty(),
            MenuChoice::AssignFaculty => self.assign_faculty(),
            MenuChoice::ViewAll => Ok(write_tree(self.store, &mut self.output)?),
            MenuChoice::RemoveStream => self.remove_stream(),
            MenuChoice::RemoveClass => self.remove_class(),
            MenuChoice::RemoveStudent => self.remove_student(),
            MenuChoice::RemoveFaculty => self.remove_faculty(),
            MenuChoice::SearchStudent => self.search_student(),
            MenuChoice::SearchFaculty => self.search_faculty(),
            MenuChoice::UnassignedFaculty => {
                Ok(write_unassigned_faculty(self.store, &mut self.output)?)
            }
            MenuChoice::ClassesWithoutFaculty => {
                Ok(write_classes_without_faculty(self.store, &mut self.output)?)
            }
            MenuChoice::Backup => self.backup(),
            MenuChoice::Exit => Ok(()),
        }
    }

    fn finish(&mut self) -> Result<()> {
        if self.config.storage.save_on_exit {
            let path = self.config.data_file();
            self.store.save(&path, self.config.storage.pretty)?;
            writeln!(self.output, "Data saved to {}. Exiting...", path.display())?;
        } else {
            writeln!(self.output, "Exiting without saving.")?;
        }
        info!("menu session ended");
        Ok(())
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n--- Educational ERP ---")?;
        for (index, choice) in MenuChoice::ALL.iter().enumerate() {
            writeln!(self.output, "{}. {}", index + 1, choice.label())?;
        }
        Ok(())
    }

    /// Print `text` and read one trimmed line. `None` once input has ended.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.closed = true;
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Show a numbered list with a trailing Back entry and return the
    /// chosen index.
    fn select(&mut self, what: &str, options: &[String]) -> io::Result<Option<usize>> {
        if options.is_empty() {
            writeln!(self.output, "No {what} available!")?;
            return Ok(None);
        }

        writeln!(self.output, "\n--- Select {what} ---")?;
        for (index, option) in options.iter().enumerate() {
            writeln!(self.output, "{}. {option}", index + 1)?;
        }
        let back = options.len() + 1;
        writeln!(self.output, "{back}. Back")?;

        let Some(line) = self.prompt("Enter choice: ")? else {
            return Ok(None);
        };
        match line.parse::<usize>() {
            Ok(n) if n == back => Ok(None),
            Ok(n) if (1..back).contains(&n) => Ok(Some(n - 1)),
            Ok(_) => {
                writeln!(self.output, "Invalid choice!")?;
                Ok(None)
            }
            Err(_) => {
                writeln!(self.output, "Enter a number!")?;
                Ok(None)
            }
        }
    }

    fn select_stream(&mut self) -> io::Result<Option<String>> {
        let names: Vec<String> = self.store.streams().keys().cloned().collect();
        let index = self.select("stream", &names)?;
        Ok(index.and_then(|i| names.get(i).cloned()))
    }

    fn select_class(&mut self, stream: &str) -> io::Result<Option<String>> {
        let names: Vec<String> = self
            .store
            .stream(stream)
            .map(|s| s.classes.keys().cloned().collect())
            .unwrap_or_default();
        let index = self.select("class", &names)?;
        Ok(index.and_then(|i| names.get(i).cloned()))
    }

    /// Select a stream and then one of its classes.
    fn select_class_path(&mut self) -> io::Result<Option<(String, String)>> {
        let Some(stream) = self.select_stream()? else {
            return Ok(None);
        };
        let class = self.select_class(&stream)?;
        Ok(class.map(|class| (stream, class)))
    }

    fn select_student(&mut self, stream: &str, class: &str) -> io::Result<Option<StudentId>> {
        let students: Vec<(StudentId, String)> = self
            .store
            .class(stream, class)
            .map(|c| {
                c.students
                    .iter()
                    .map(|(id, student)| (*id, format!("{id}: {}", student.name)))
                    .collect()
            })
            .unwrap_or_default();
        let labels: Vec<String> = students.iter().map(|(_, label)| label.clone()).collect();
        let index = self.select("student", &labels)?;
        Ok(index.and_then(|i| students.get(i)).map(|(id, _)| *id))
    }

    fn select_faculty(&mut self) -> io::Result<Option<FacultyId>> {
        let members: Vec<(FacultyId, String)> = self
            .store
            .faculty_members()
            .iter()
            .map(|(id, faculty)| (*id, faculty_label(*id, faculty)))
            .collect();
        let labels: Vec<String> = members.iter().map(|(_, label)| label.clone()).collect();
        let index = self.select("faculty", &labels)?;
        Ok(index.and_then(|i| members.get(i)).map(|(id, _)| *id))
    }

    fn confirm(&mut self, what: &str) -> io::Result<bool> {
        if !self.config.menu.confirm_removals {
            return Ok(true);
        }
        let answer = self.prompt(&format!("Are you sure you want to remove {what}? (y/n): "))?;
        let confirmed = answer
            .is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes"));
        if !confirmed {
            writeln!(self.output, "Removal cancelled.")?;
        }
        Ok(confirmed)
    }

    fn add_stream(&mut self) -> Result<()> {
        let Some(name) = self.prompt("Enter stream name (e.g. BCA, BSc IT): ")? else {
            return Ok(());
        };
        self.store.add_stream(&name)?;
        writeln!(self.output, "Stream '{name}' added.")?;
        Ok(())
    }

    fn add_class(&mut self) -> Result<()> {
        let Some(stream) = self.select_stream()? else {
            return Ok(());
        };
        let Some(class) = self.prompt("Enter class (e.g. 1A, Year1): ")? else {
            return Ok(());
        };
        self.store.add_class(&stream, &class)?;
        writeln!(self.output, "Class '{class}' added to {stream}.")?;
        Ok(())
    }

    fn add_student(&mut self) -> Result<()> {
        let Some((stream, class)) = self.select_class_path()? else {
            return Ok(());
        };
        let Some(name) = self.prompt("Enter student name: ")? else {
            return Ok(());
        };
        let id = self.store.enroll_student(&stream, &class, &name)?;
        writeln!(
            self.output,
            "Student '{name}' enrolled in {stream} - {class} with ID {id}."
        )?;
        Ok(())
    }

    fn add_faculty(&mut self) -> Result<()> {
        let Some(name) = self.prompt("Enter faculty name: ")? else {
            return Ok(());
        };
        let Some(subject) = self.prompt("Enter subject: ")? else {
            return Ok(());
        };
        let id = self.store.add_faculty(&name, &subject)?;
        writeln!(self.output, "Faculty '{name}' added with ID {id}.")?;
        Ok(())
    }

    fn assign_faculty(&mut self) -> Result<()> {
        let Some(id) = self.select_faculty()? else {
            return Ok(());
        };
        let Some((stream, class)) = self.select_class_path()? else {
            return Ok(());
        };
        if self.store.assign_faculty(id, &stream, &class)? {
            writeln!(self.output, "{id} assigned to {stream} - {class}.")?;
        } else {
            writeln!(self.output, "{id} is already assigned to {stream} - {class}.")?;
        }
        Ok(())
    }

    fn remove_stream(&mut self) -> Result<()> {
        let Some(stream) = self.select_stream()? else {
            return Ok(());
        };
        if !self.confirm(&format!("stream '{stream}'"))? {
            return Ok(());
        }
        let removed = self.store.remove_stream(&stream)?;
        writeln!(
            self.output,
            "Stream '{stream}' removed with {} classes and {} students.",
            removed.classes.len(),
            removed.student_count()
        )?;
        Ok(())
    }

    fn remove_class(&mut self) -> Result<()> {
        let Some((stream, class)) = self.select_class_path()? else {
            return Ok(());
        };
        // The store refuses classes with faculty; skip the question for those.
        let in_use = self
            .store
            .class(&stream, &class)
            .is_some_and(Class::has_faculty);
        if !in_use && !self.confirm(&format!("class '{class}'"))? {
            return Ok(());
        }
        let removed = self.store.remove_class(&stream, &class)?;
        writeln!(
            self.output,
            "Class '{class}' removed from {stream} with {} students.",
            removed.students.len()
        )?;
        Ok(())
    }

    fn remove_student(&mut self) -> Result<()> {
        let Some((stream, class)) = self.select_class_path()? else {
            return Ok(());
        };
        let Some(id) = self.select_student(&stream, &class)? else {
            return Ok(());
        };
        if !self.confirm(&format!("student {id}"))? {
            return Ok(());
        }
        let (_, student) = self.store.remove_student(id)?;
        writeln!(self.output, "Student '{}' ({id}) removed.", student.name)?;
        Ok(())
    }

    fn remove_faculty(&mut self) -> Result<()> {
        let Some(id) = self.select_faculty()? else {
            return Ok(());
        };
        if !self.confirm(&format!("faculty {id}"))? {
            return Ok(());
        }
        let faculty = self.store.remove_faculty(id)?;
        writeln!(self.output, "Faculty '{}' ({id}) removed.", faculty.name)?;
        Ok(())
    }

    fn search_student(&mut self) -> Result<()> {
        let Some(query) = self.prompt("Enter student name or ID to search: ")? else {
            return Ok(());
        };
        let mut found = false;
        for hit in self.store.search_students(&query) {
            found = true;
            writeln!(
                self.output,
                "{}: {} ({})",
                hit.id,
                hit.student.name,
                hit.location()
            )?;
        }
        if !found {
            writeln!(self.output, "No students found.")?;
        }
        Ok(())
    }

    fn search_faculty(&mut self) -> Result<()> {
        let Some(query) = self.prompt("Enter faculty name or ID to search: ")? else {
            return Ok(());
        };
        let mut found = false;
        for hit in self.store.search_faculty(&query) {
            found = true;
            writeln!(self.output, "{}", faculty_label(hit.id, hit.faculty))?;
        }
        if !found {
            writeln!(self.output, "No faculty found.")?;
        }
        Ok(())
    }

    fn backup(&mut self) -> Result<()> {
        let storage = &self.config.storage;
        let path = self.store.backup(
            self.config.backup_dir(),
            &storage.backup_prefix,
            &Local::now().naive_local(),
            storage.pretty,
        )?;
        writeln!(self.output, "Backup created: {}", path.display())?;
        Ok(())
    }
}

/// One-line description of a faculty member.
#[must_use]
pub fn faculty_label(id: FacultyId, faculty: &Faculty) -> String {
    if faculty.subject.is_empty() {
        format!("{id}: {}", faculty.name)
    } else {
        format!("{id}: {} ({})", faculty.name, faculty.subject)
    }
}

/// Print every stream, class, student and faculty member.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_tree<W: Write>(store: &DataStore, out: &mut W) -> io::Result<()> {
    if store.is_empty() {
        return writeln!(
            out,
            "No data available. Add streams, classes, students, and faculty first."
        );
    }

    for (name, stream) in store.streams() {
        writeln!(out, "\nStream: {name}")?;
        if stream.classes.is_empty() {
            writeln!(out, "  (No classes yet)")?;
        }
        for (class_name, class) in &stream.classes {
            writeln!(out, "  Class {class_name}:")?;
            if class.students.is_empty() {
                writeln!(out, "    (No students yet)")?;
            }
            for (id, student) in &class.students {
                writeln!(out, "    - {id}: {}", student.name)?;
            }
            if class.has_faculty() {
                let ids: Vec<String> = class
                    .faculty_assignments
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                writeln!(out, "    Faculty: {}", ids.join(", "))?;
            }
        }
    }

    writeln!(out, "\nFaculty:")?;
    if store.faculty_members().is_empty() {
        writeln!(out, "  (No faculty yet)")?;
    }
    for (id, faculty) in store.faculty_members() {
        let classes = store.faculty_assignments(*id);
        let assigned = if classes.is_empty() {
            "None".to_string()
        } else {
            classes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(out, "  {} - Assigned: {assigned}", faculty_label(*id, faculty))?;
    }
    Ok(())
}

/// Print faculty members without any class assignment.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_unassigned_faculty<W: Write>(store: &DataStore, out: &mut W) -> io::Result<()> {
    let unassigned = store.unassigned_faculty();
    if unassigned.is_empty() {
        return writeln!(out, "All faculty members have assignments.");
    }
    for (id, faculty) in unassigned {
        writeln!(out, "{} (No assignment)", faculty_label(id, faculty))?;
    }
    Ok(())
}

/// Print classes that no faculty member is assigned to.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_classes_without_faculty<W: Write>(store: &DataStore, out: &mut W) -> io::Result<()> {
    let classes = store.classes_without_faculty();
    if classes.is_empty() {
        return writeln!(out, "All classes have faculty assignments.");
    }
    for class in classes {
        writeln!(out, "{class}: No faculty assigned")?;
    }
    Ok(())
}
