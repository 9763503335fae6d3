//! JSON persistence for the data store.
//!
//! The whole store is one JSON document. Saving replaces the document in
//! full (written to a sibling temporary file, then renamed over the target),
//! so a failed save never leaves a half-written data file behind. Backups
//! are exclusive-create snapshots with a timestamped name.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::{migrations, DataStore};

/// Default prefix for backup file names.
pub const DEFAULT_BACKUP_PREFIX: &str = "erp_backup";

/// Timestamp layout used in backup file names.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Build the backup file name for a timestamp: `<prefix>_YYYYMMDD_HHMMSS.json`.
#[must_use]
pub fn backup_file_name(prefix: &str, timestamp: &NaiveDateTime) -> String {
    format!("{prefix}_{}.json", timestamp.format(BACKUP_TIMESTAMP_FORMAT))
}

/// Create `dir` and its parents if it does not exist yet.
fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

impl DataStore {
    /// Serialize the store to a JSON string.
    ///
    /// Pretty output uses a four-space indent.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if !pretty {
            return Ok(serde_json::to_string(self)?);
        }
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| Error::invalid_input(e.to_string()))
    }

    /// Decode a store from JSON text.
    ///
    /// Older layouts are upgraded first, then the decoded store is checked
    /// for dangling links and duplicate IDs. `origin` only labels errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptData`] if the text is not valid JSON, does not
    /// match the schema, or breaks a store invariant.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let mut doc: serde_json::Value =
            serde_json::from_str(text).map_err(|e| Error::corrupt(origin, e.to_string()))?;
        migrations::upgrade(&mut doc).map_err(|message| Error::corrupt(origin, message))?;
        let mut store: Self =
            serde_json::from_value(doc).map_err(|e| Error::corrupt(origin, e.to_string()))?;
        store
            .validate()
            .map_err(|message| Error::corrupt(origin, message))?;
        Ok(store)
    }

    /// Write the whole store to `path`, replacing any existing file.
    ///
    /// Parent directories are created when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be written.
    pub fn save(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json(pretty)?;
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        let tmp = temp_path(path);
        fs::write(&tmp, json.as_bytes()).map_err(|source| Error::FileWrite {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            Error::FileWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;

        debug!(path = %path.display(), bytes = json.len(), "saved data file");
        Ok(())
    }

    /// Read a store from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileRead`] if the file cannot be read, or
    /// [`Error::CorruptData`] if its content is not a valid store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json(&text, path)?;
        let stats = store.stats();
        info!(
            path = %path.display(),
            streams = stats.streams,
            students = stats.students,
            faculty = stats.faculty,
            "loaded data file"
        );
        Ok(store)
    }

    /// Read `path` if it exists, otherwise start with an empty store.
    ///
    /// # Errors
    ///
    /// Same as [`DataStore::load`] for an existing file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "no data file yet; starting empty");
            Ok(Self::new())
        }
    }

    /// Replace this store with the content of `path`.
    ///
    /// On error the current content is left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`DataStore::load`].
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::load(path)?;
        Ok(())
    }

    /// Write a timestamped snapshot of the store into `dir`.
    ///
    /// The snapshot has exactly the bytes [`DataStore::save`] would write.
    /// An existing file with the same name is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the backup file
    /// already exists or cannot be written.
    pub fn backup(
        &self,
        dir: impl AsRef<Path>,
        prefix: &str,
        timestamp: &NaiveDateTime,
        pretty: bool,
    ) -> Result<PathBuf> {
        let dir = dir.as_ref();
        ensure_dir(dir)?;
        let path = dir.join(backup_file_name(prefix, timestamp));
        let json = self.to_json(pretty)?;

        let write = |path: &Path| -> std::io::Result<()> {
            let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()
        };
        write(&path).map_err(|source| Error::FileWrite {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "backup created");
        Ok(path)
    }
}

/// Sibling path used while replacing `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FacultyId, StudentId};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_store() -> DataStore {
        let mut store = DataStore::new();
        store.add_stream("BCA").unwrap();
        store.add_class("BCA", "Year1").unwrap();
        store.add_class("BCA", "Year2").unwrap();
        store.enroll_student("BCA", "Year1", "Alice").unwrap();
        store.enroll_student("BCA", "Year2", "Alicia").unwrap();
        let fac = store.add_faculty("Dr. Rao", "Maths").unwrap();
        store.assign_faculty(fac, "BCA", "Year1").unwrap();
        store.add_faculty("Dr. Iyer", "Physics").unwrap();
        store
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_backup_file_name() {
        assert_eq!(
            backup_file_name(DEFAULT_BACKUP_PREFIX, &timestamp()),
            "erp_backup_20240309_140507.json"
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("erp_data.json");
        let store = create_test_store();

        store.save(&path, true).unwrap();
        let loaded = DataStore::load(&path).unwrap();

        assert_eq!(loaded, store);
    }

    #[test]
    fn test_compact_round_trip() {
        let store = create_test_store();
        let json = store.to_json(false).unwrap();
        assert!(!json.contains('\n'));
        assert_eq!(DataStore::from_json(&json, Path::new("mem")).unwrap(), store);
    }

    #[test]
    fn test_pretty_layout() {
        let json = create_test_store().to_json(true).unwrap();
        assert!(json.starts_with("{\n    \"next_student_id\": 3,"));
        assert!(json.contains("\"STU001\""));
        assert!(json.contains("\"faculty_assignments\""));
        assert!(json.ends_with("}\n"));
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("erp_data.json");
        let mut store = create_test_store();
        store.save(&path, true).unwrap();

        store.add_stream("MCA").unwrap();
        store.save(&path, true).unwrap();

        let loaded = DataStore::load(&path).unwrap();
        assert!(loaded.stream("MCA").is_some());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/erp_data.json");
        DataStore::new().save(&path, true).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = DataStore::load(dir.path().join("absent.json")).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = DataStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_malformed_json_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("erp_data.json");
        fs::write(&path, "{ not json").unwrap();

        let err = DataStore::load(&path).unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("erp_data.json"));
    }

    #[test]
    fn test_load_schema_violation_is_corrupt() {
        let bad = [
            r#"{"streams": {"BCA": {"classes": {"1A": {"students": {"STU001": {}}}}}}}"#,
            r#"{"streams": {"BCA": {"classes": {"1A": {"students": {"Alice": {"name": "A"}}}}}}}"#,
            r#"{"streams": [], "faculty": {}}"#,
            r#"{"next_faculty_id": -3}"#,
            r#"{"streams": {"BCA": {"classes": {"1A": {"faculty_assignments": ["FAC001"]}}}}}"#,
            "[]",
            r#"{"streams": {"B": {"classes": {"Y": {"students": {"STU001": {"name": "Alice"}, "STU1": {"name": "Bob"}}}}}}}"#,
            r#"{"faculty": {"FAC001": {"name": "A", "subject": "S"}, "fac001": {"name": "B", "subject": "S"}}}"#,
            r#"{"streams": {"B": {"classes": {"Y": {"faculty_assignments": ["FAC01"]}}}}, "faculty": {"FAC001": {"name": "A", "subject": "S"}}}"#,
            r#"{"streams": {"B": {"classes": {"Y": {"students": {"STU4294967295": {"name": "A"}}}}}}}"#,
            r#"{"faculty": {"FAC4294967295": {"name": "A", "subject": "S"}}}"#,
        ];
        for text in bad {
            let err = DataStore::from_json(text, Path::new("bad.json")).unwrap_err();
            assert!(err.is_corrupt(), "expected corrupt for {text}: {err}");
        }
    }

    #[test]
    fn test_exhausted_counter_loads_but_refuses_new_ids() {
        let text = r#"{"next_student_id": 4294967295, "next_faculty_id": 4294967295,
            "streams": {"B": {"classes": {"Y": {}}}}}"#;
        let mut store = DataStore::from_json(text, Path::new("full.json")).unwrap();
        let before = store.clone();

        let err = store.enroll_student("B", "Y", "Alice").unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        let err = store.add_faculty("Dr. Rao", "Maths").unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn test_reload_keeps_state_on_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("erp_data.json");
        fs::write(&path, "garbage").unwrap();
        let mut store = create_test_store();
        let before = store.clone();

        assert!(store.reload(&path).is_err());
        assert_eq!(store, before);

        DataStore::new().save(&path, true).unwrap();
        store.reload(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_legacy_document() {
        let legacy = r#"{
            "streams": {
                "BCA": {
                    "classes": { "1A": { "students": ["Alice", "Bob"] } },
                    "faculty": { "FAC001": { "name": "Dr. Rao", "assigned_class": "1A" } }
                }
            },
            "student_counter": 1,
            "faculty_counter": 2
        }"#;

        let store = DataStore::from_json(legacy, Path::new("legacy.json")).unwrap();

        let (location, alice) = store.student(StudentId::new(1)).unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!(location.to_string(), "BCA - 1A");
        assert_eq!(store.next_student_id(), StudentId::new(3));
        assert_eq!(store.next_faculty_id(), FacultyId::new(2));
        assert_eq!(store.faculty_assignments(FacultyId::new(1)).len(), 1);
        assert_eq!(store.faculty(FacultyId::new(1)).unwrap().subject, "");
    }

    #[test]
    fn test_backup_matches_primary_and_leaves_it_alone() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("erp_data.json");
        let store = create_test_store();
        store.save(&primary, true).unwrap();
        let before = fs::read(&primary).unwrap();

        let backup = store
            .backup(dir.path(), DEFAULT_BACKUP_PREFIX, &timestamp(), true)
            .unwrap();

        assert_eq!(
            backup.file_name().unwrap(),
            "erp_backup_20240309_140507.json"
        );
        assert_eq!(fs::read(&primary).unwrap(), before);
        assert_eq!(fs::read(&backup).unwrap(), before);
    }

    #[test]
    fn test_backup_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store();
        store
            .backup(dir.path(), DEFAULT_BACKUP_PREFIX, &timestamp(), true)
            .unwrap();

        let err = store
            .backup(dir.path(), DEFAULT_BACKUP_PREFIX, &timestamp(), true)
            .unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_backup_creates_directory() {
        let dir = TempDir::new().unwrap();
        let backups = dir.path().join("backups");
        let path = DataStore::new()
            .backup(&backups, "snap", &timestamp(), false)
            .unwrap();
        assert_eq!(path, backups.join("snap_20240309_140507.json"));
        assert!(DataStore::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("/data/erp_data.json")),
            PathBuf::from("/data/erp_data.json.tmp")
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn save_then_load_is_identity(
                streams in prop::collection::btree_map("[A-Z]{2,5}", prop::collection::vec("[a-z0-9]{1,4}", 0..3), 0..4),
                names in prop::collection::vec("[A-Za-z ]{1,12}", 0..10),
                faculty in prop::collection::vec(("[A-Za-z.]{1,10}", "[A-Za-z]{1,8}"), 0..4),
            ) {
                let mut store = DataStore::new();
                let mut classes = Vec::new();
                for (stream, class_names) in &streams {
                    store.add_stream(stream).unwrap();
                    for class in class_names {
                        if store.add_class(stream, class).is_ok() {
                            classes.push((stream.clone(), class.clone()));
                        }
                    }
                }
                for (i, name) in names.iter().enumerate() {
                    if classes.is_empty() {
                        break;
                    }
                    let (stream, class) = &classes[i % classes.len()];
                    let _ = store.enroll_student(stream, class, name);
                }
                for (i, (name, subject)) in faculty.iter().enumerate() {
                    let id = store.add_faculty(name, subject).unwrap();
                    if let Some((stream, class)) = classes.get(i) {
                        store.assign_faculty(id, stream, class).unwrap();
                    }
                }

                for pretty in [true, false] {
                    let json = store.to_json(pretty).unwrap();
                    let back = DataStore::from_json(&json, Path::new("prop.json")).unwrap();
                    prop_assert_eq!(&back, &store);
                }
            }
        }
    }
}
