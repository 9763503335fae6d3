//! Student and faculty search.
//!
//! Searches are lazy: each call returns a fresh iterator that walks the
//! store in key order and yields matches as it finds them. A record matches
//! when its name contains the query (case-insensitive) or when the query
//! parses as the record's own ID.

use std::str::FromStr;

use crate::model::{ClassRef, Faculty, FacultyId, Student, StudentId};

use super::DataStore;

/// A student found by [`DataStore::search_students`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentMatch<'a> {
    /// The student's ID.
    pub id: StudentId,
    /// The student record.
    pub student: &'a Student,
    /// Stream the student is enrolled in.
    pub stream: &'a str,
    /// Class the student is enrolled in.
    pub class: &'a str,
}

impl StudentMatch<'_> {
    /// Where the student is enrolled.
    #[must_use]
    pub fn location(&self) -> ClassRef {
        ClassRef::new(self.stream, self.class)
    }
}

/// A faculty member found by [`DataStore::search_faculty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacultyMatch<'a> {
    /// The faculty member's ID.
    pub id: FacultyId,
    /// The faculty record.
    pub faculty: &'a Faculty,
}

/// Compiled form of a search query.
#[derive(Debug, Clone)]
struct Matcher<I> {
    needle: Option<String>,
    id: Option<I>,
}

impl<I: FromStr + PartialEq> Matcher<I> {
    fn new(query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            return Self {
                needle: None,
                id: None,
            };
        }
        Self {
            needle: Some(query.to_lowercase()),
            id: query.parse().ok(),
        }
    }

    fn matches(&self, id: &I, name: &str) -> bool {
        if self.id.as_ref() == Some(id) {
            return true;
        }
        self.needle
            .as_deref()
            .is_some_and(|needle| name.to_lowercase().contains(needle))
    }
}

impl DataStore {
    /// Search students by name substring or exact ID.
    ///
    /// An empty query matches nothing.
    pub fn search_students<'a>(
        &'a self,
        query: &str,
    ) -> impl Iterator<Item = StudentMatch<'a>> + 'a {
        let matcher = Matcher::<StudentId>::new(query);
        self.streams
            .iter()
            .flat_map(|(stream, s)| {
                s.classes
                    .iter()
                    .map(move |(class, c)| (stream.as_str(), class.as_str(), c))
            })
            .flat_map(|(stream, class, c)| {
                c.students.iter().map(move |(id, student)| StudentMatch {
                    id: *id,
                    student,
                    stream,
                    class,
                })
            })
            .filter(move |m| matcher.matches(&m.id, &m.student.name))
    }

    /// Search faculty by name substring or exact ID.
    ///
    /// An empty query matches nothing.
    pub fn search_faculty<'a>(
        &'a self,
        query: &str,
    ) -> impl Iterator<Item = FacultyMatch<'a>> + 'a {
        let matcher = Matcher::<FacultyId>::new(query);
        self.faculty
            .iter()
            .filter(move |(id, faculty)| matcher.matches(id, &faculty.name))
            .map(|(id, faculty)| FacultyMatch { id: *id, faculty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> DataStore {
        let mut store = DataStore::new();
        store.add_stream("BCA").unwrap();
        store.add_class("BCA", "Year1").unwrap();
        store.add_stream("BSc IT").unwrap();
        store.add_class("BSc IT", "2B").unwrap();
        store.enroll_student("BCA", "Year1", "Alice").unwrap();
        store.enroll_student("BSc IT", "2B", "Alicia").unwrap();
        store.enroll_student("BCA", "Year1", "Barbara").unwrap();
        store
    }

    #[test]
    fn test_search_students_by_name() {
        let store = create_test_store();

        let names: Vec<_> = store
            .search_students("Alice")
            .map(|m| m.student.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice"]);

        let names: Vec<_> = store
            .search_students("ali")
            .map(|m| m.student.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice", "Alicia"]);
    }

    #[test]
    fn test_search_students_alice_and_alicia() {
        let mut store = DataStore::new();
        store.add_stream("BCA").unwrap();
        store.add_class("BCA", "Year1").unwrap();
        store.enroll_student("BCA", "Year1", "Alice").unwrap();
        store.enroll_student("BCA", "Year1", "Alicia").unwrap();

        assert_eq!(store.search_students("Alic").count(), 2);
        assert_eq!(store.search_students("Bob").count(), 0);
    }

    #[test]
    fn test_search_students_reports_location() {
        let store = create_test_store();
        let found = store.search_students("alicia").next().unwrap();
        assert_eq!(found.location(), ClassRef::new("BSc IT", "2B"));
        assert_eq!(found.id, StudentId::new(2));
    }

    #[test]
    fn test_search_students_by_id() {
        let store = create_test_store();
        let found: Vec<_> = store.search_students("stu003").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].student.name, "Barbara");
    }

    #[test]
    fn test_search_empty_query_matches_nothing() {
        let store = create_test_store();
        assert_eq!(store.search_students("").count(), 0);
        assert_eq!(store.search_students("   ").count(), 0);
        assert_eq!(store.search_faculty("").count(), 0);
    }

    #[test]
    fn test_search_is_restartable() {
        let store = create_test_store();
        let first: Vec<_> = store.search_students("a").map(|m| m.id).collect();
        let second: Vec<_> = store.search_students("a").map(|m| m.id).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_search_is_lazy() {
        let store = create_test_store();
        let mut iter = store.search_students("a");
        assert_eq!(iter.next().unwrap().student.name, "Alice");
        assert_eq!(iter.next().unwrap().student.name, "Barbara");
        assert_eq!(iter.next().unwrap().student.name, "Alicia");
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_search_faculty() {
        let mut store = DataStore::new();
        let rao = store.add_faculty("Dr. Rao", "Maths").unwrap();
        store.add_faculty("Dr. Iyer", "Physics").unwrap();
        store.add_faculty("Prof. Rao Menon", "Chemistry").unwrap();

        let ids: Vec<_> = store.search_faculty("RAO").map(|m| m.id).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], rao);

        let by_id: Vec<_> = store.search_faculty("FAC002").collect();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].faculty.name, "Dr. Iyer");

        assert_eq!(store.search_faculty("Kumar").count(), 0);
    }

    #[test]
    fn test_matcher_id_only_matches_exact_kind() {
        let matcher = Matcher::<StudentId>::new("FAC001");
        assert!(matcher.id.is_none());
        assert!(!matcher.matches(&StudentId::new(1), "Alice"));
    }
}
