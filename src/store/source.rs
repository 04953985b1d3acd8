//! Data directory resolution and recording lookup.
//!
//! A [`DataSource`] is a plain value describing where recordings live. It is
//! built per request from configuration plus any directory the caller picked,
//! so nothing here holds shared state.

use crate::config::Config;
use crate::signal::Recording;
use crate::store::decode::{decode_recording, subject_string, TABLE_KEY};
use crate::store::error::LoadError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const RECORDING_EXTENSION: &str = "json";
const SUBJECT_COLUMN: &str = "subject";

/// Where to look for recordings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    /// Directory candidates are resolved against
    pub base_dir: PathBuf,
    /// Directory names tried in order when no override is set
    pub candidates: Vec<String>,
    /// Explicitly selected directory
    pub override_dir: Option<PathBuf>,
}

impl DataSource {
    pub fn new(base_dir: impl Into<PathBuf>, candidates: Vec<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            candidates,
            override_dir: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            candidates: config.data_dir_candidates.clone(),
            override_dir: config.data_dir.clone(),
        }
    }

    pub fn with_override(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.override_dir = dir;
        }
        self
    }

    /// Resolve a user-supplied directory: absolute, relative to the base
    /// directory, or relative to the working directory, in that order.
    pub fn locate_dir(&self, dir: &str) -> Option<PathBuf> {
        let path = Path::new(dir);
        if path.is_absolute() {
            return path.is_dir().then(|| path.to_path_buf());
        }
        let relative = self.base_dir.join(path);
        if relative.is_dir() {
            Some(relative)
        } else {
            path.is_dir().then(|| path.to_path_buf())
        }
    }

    /// The directory recordings are read from.
    ///
    /// An existing override wins, then the first existing candidate. When
    /// nothing exists the first candidate under the base directory is
    /// returned and the error surfaces on first use.
    pub fn resolve_dir(&self) -> PathBuf {
        if let Some(dir) = self.override_dir.as_ref().filter(|d| d.is_dir()) {
            return dir.clone();
        }
        self.candidates
            .iter()
            .find_map(|candidate| self.locate_dir(candidate))
            .unwrap_or_else(|| {
                self.base_dir
                    .join(self.candidates.first().map(String::as_str).unwrap_or_default())
            })
    }

    /// All file names in the data directory, sorted. Empty if it does not exist.
    pub fn list_files(&self) -> Vec<String> {
        let mut files: Vec<String> = std::fs::read_dir(self.resolve_dir())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        files.sort();
        files
    }

    /// Recording files in the data directory, sorted by name.
    pub fn recording_files(&self) -> Result<Vec<PathBuf>, LoadError> {
        let dir = self.resolve_dir();
        let entries = std::fs::read_dir(&dir).map_err(|_| LoadError::MissingDirectory(dir.clone()))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == RECORDING_EXTENSION))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Load the recording of one subject (`S2` or `2`).
    ///
    /// Looks for `S{id}.json`, then a file named exactly after the subject
    /// (the stem [`default_subject`](Self::default_subject) may return), then
    /// any `S{id}*.json`, then searches the first recording file for an entry
    /// belonging to the subject.
    pub fn load_subject(&self, subject: &str) -> Result<Recording, LoadError> {
        let id = subject_id(subject);
        let target = format!("S{id}");
        let files = self.recording_files()?;

        let exact = format!("{target}.{RECORDING_EXTENSION}");
        let stem = format!("{}.{RECORDING_EXTENSION}", subject.trim());
        let named = files
            .iter()
            .find(|p| file_name(p) == exact)
            .or_else(|| files.iter().find(|p| file_name(p) == stem))
            .or_else(|| files.iter().find(|p| file_name(p).starts_with(&target)));
        if let Some(path) = named {
            tracing::debug!("Loading {} from {:?}", target, path);
            return Ok(decode_recording(&read_json(path)?));
        }

        let Some(first) = files.first() else {
            return Err(LoadError::NoRecordings {
                dir: self.resolve_dir(),
                contents: self.list_files(),
            });
        };

        tracing::debug!("Searching {:?} for {}", first, target);
        let container = read_json(first)?;
        if let Some(rows) = select_subject_rows(&container, &target, &id) {
            return Ok(decode_recording(&rows));
        }
        find_subject_entry(&container, &target, &id)
            .map(decode_recording)
            .ok_or_else(|| LoadError::SubjectNotFound {
                subject: target,
                files: files.iter().map(|p| file_name(p)).collect(),
            })
    }

    /// Subjects per recording file. `file_filter` restricts the scan to one file.
    pub fn subjects_by_file(
        &self,
        file_filter: Option<&str>,
    ) -> Result<BTreeMap<String, Result<Vec<String>, LoadError>>, LoadError> {
        let files = self.recording_files()?;
        Ok(files
            .iter()
            .filter(|p| file_filter.map_or(true, |f| file_name(p) == f || p.as_os_str() == f))
            .map(|p| (file_name(p), read_json(p).map(|v| discover_subjects(&v))))
            .collect())
    }

    /// The only subject present in the data directory.
    ///
    /// Falls back to the file stem when there is a single file without any
    /// subject marker.
    pub fn default_subject(&self) -> Result<String, LoadError> {
        let files = self.recording_files()?;
        if files.is_empty() {
            return Err(LoadError::NoRecordings {
                dir: self.resolve_dir(),
                contents: self.list_files(),
            });
        }

        let mut subjects = BTreeSet::new();
        let mut by_file = BTreeMap::new();
        for path in &files {
            let found = match read_json(path) {
                Ok(value) => discover_subjects(&value),
                Err(e) => {
                    tracing::warn!("Skipping unreadable recording: {}", e);
                    Vec::new()
                }
            };
            subjects.extend(found.iter().cloned());
            by_file.insert(file_name(path), found);
        }

        if subjects.len() == 1 {
            return Ok(subjects.into_iter().next().unwrap_or_default());
        }
        if subjects.is_empty() && files.len() == 1 {
            if let Some(stem) = files[0].file_stem() {
                return Ok(stem.to_string_lossy().into_owned());
            }
        }
        Err(LoadError::AmbiguousSubject {
            subjects_by_file: by_file,
        })
    }
}

/// Numeric part of a subject identifier: `S2` and `s2` become `2`, anything
/// else is returned unchanged.
pub fn subject_id(subject: &str) -> String {
    let subject = subject.trim();
    match subject.strip_prefix(['S', 's']) {
        Some(rest) if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => subject.to_string(),
    }
}

/// Display form of a subject: `2` and `s2` become `S2`; a name that is not
/// a subject identifier, such as a file stem, is kept as given.
pub fn subject_label(subject: &str) -> String {
    let id = subject_id(subject);
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        format!("S{id}")
    } else {
        id
    }
}

/// Subjects present in a recording document, sorted and de-duplicated.
///
/// Recognised markers: a top-level `subject`; the `subject` column of a
/// column table; object keys shaped like `S2` or `2`; `subject` fields of
/// nested objects or array elements.
pub fn discover_subjects(value: &Value) -> Vec<String> {
    if let Some(subject) = value.get("subject").and_then(subject_string) {
        return vec![subject];
    }
    if let Some(column) = subject_column(value) {
        let subjects: BTreeSet<String> = column.iter().filter_map(subject_string).collect();
        return subjects.into_iter().collect();
    }

    let mut subjects = BTreeSet::new();
    match value {
        Value::Object(map) => {
            for (key, entry) in map {
                if subject_key_pattern().is_match(key) {
                    subjects.insert(key.to_uppercase());
                } else if key.chars().all(|c| c.is_ascii_digit()) && !key.is_empty() {
                    subjects.insert(format!("S{key}"));
                }
                if let Some(subject) = entry.get("subject").and_then(subject_string) {
                    subjects.insert(subject);
                }
            }
        }
        Value::Array(items) => {
            subjects.extend(
                items
                    .iter()
                    .filter_map(|item| item.get("subject").and_then(subject_string)),
            );
        }
        _ => {}
    }
    subjects.into_iter().collect()
}

fn subject_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[sS]\d+$").expect("valid subject pattern"))
}

/// Column table (`{"columns": {...}}`) carrying a `subject` column.
fn subject_column(value: &Value) -> Option<&Vec<Value>> {
    value.get(TABLE_KEY)?.get(SUBJECT_COLUMN)?.as_array()
}

/// Rows of a column table that belong to one subject, as a recording
/// document whose signal is the filtered table.
fn select_subject_rows(container: &Value, target: &str, id: &str) -> Option<Value> {
    let subjects = subject_column(container)?;
    let keep: Vec<usize> = subjects
        .iter()
        .enumerate()
        .filter(|(_, v)| subject_string(v).is_some_and(|s| s == target || s == id))
        .map(|(i, _)| i)
        .collect();
    if keep.is_empty() {
        return None;
    }

    let columns: Map<String, Value> = container
        .get(TABLE_KEY)?
        .as_object()?
        .iter()
        .map(|(name, column)| {
            let values = column.as_array().map_or_else(Vec::new, |items| {
                keep.iter().filter_map(|&i| items.get(i).cloned()).collect()
            });
            (name.clone(), Value::Array(values))
        })
        .collect();

    let mut signal = Map::new();
    signal.insert(TABLE_KEY.to_string(), Value::Object(columns));

    let mut document = Map::new();
    document.insert("subject".to_string(), Value::String(target.to_string()));
    document.insert("signal".to_string(), Value::Object(signal));
    Some(Value::Object(document))
}

fn find_subject_entry<'a>(container: &'a Value, target: &str, id: &str) -> Option<&'a Value> {
    let matches = |entry: &Value| {
        entry
            .get("subject")
            .and_then(subject_string)
            .is_some_and(|s| s == target || s == id)
    };

    match container {
        Value::Object(map) => map
            .get(target)
            .or_else(|| map.get(id))
            .or_else(|| map.values().find(|v| v.is_object() && matches(v))),
        Value::Array(items) => items.iter().find(|v| v.is_object() && matches(v)),
        _ => None,
    }
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Sample, SequenceAccess, SignalNode};
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: Value) {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    fn source_with_candidate(temp: &TempDir, candidate: &str) -> DataSource {
        std::fs::create_dir_all(temp.path().join(candidate)).unwrap();
        DataSource::new(temp.path(), vec!["S2".into(), "S3".into()])
    }

    #[test]
    fn test_subject_id_normalization() {
        assert_eq!(subject_id("S2"), "2");
        assert_eq!(subject_id("s14"), "14");
        assert_eq!(subject_id("2"), "2");
        assert_eq!(subject_id("Sam"), "Sam");
        assert_eq!(subject_id("S"), "S");
    }

    #[test]
    fn test_subject_label() {
        assert_eq!(subject_label("2"), "S2");
        assert_eq!(subject_label("s14"), "S14");
        assert_eq!(subject_label("recording"), "recording");
    }

    #[test]
    fn test_resolve_dir_prefers_existing_candidate() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S3");
        assert_eq!(source.resolve_dir(), temp.path().join("S3"));
    }

    #[test]
    fn test_resolve_dir_override() {
        let temp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2").with_override(Some(other.path().to_path_buf()));
        assert_eq!(source.resolve_dir(), other.path());

        let missing = source_with_candidate(&temp, "S2").with_override(Some(temp.path().join("nope")));
        assert_eq!(missing.resolve_dir(), temp.path().join("S2"));
    }

    #[test]
    fn test_resolve_dir_fallback_when_nothing_exists() {
        let temp = TempDir::new().unwrap();
        let source = DataSource::new(temp.path(), vec!["S2".into()]);
        assert_eq!(source.resolve_dir(), temp.path().join("S2"));
        assert!(source.list_files().is_empty());
        assert!(matches!(
            source.load_subject("2"),
            Err(LoadError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_load_subject_by_file_name() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        let dir = source.resolve_dir();
        write(&dir, "S2.json", json!({"subject": "S2", "signal": {"wrist": {"EDA": [0.5]}}}));
        write(&dir, "S10_extra.json", json!({"subject": "S10", "signal": {}}));

        assert_eq!(source.load_subject("S2").unwrap().subject.as_deref(), Some("S2"));
        assert_eq!(source.load_subject("10").unwrap().subject.as_deref(), Some("S10"));
    }

    #[test]
    fn test_load_subject_from_bundle() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        write(
            &source.resolve_dir(),
            "all.json",
            json!({
                "S3": {"subject": "S3", "signal": {}},
                "group": {"subject": "S4", "signal": {"EDA": [1.0]}}
            }),
        );

        assert_eq!(source.load_subject("S3").unwrap().subject.as_deref(), Some("S3"));
        assert_eq!(source.load_subject("4").unwrap().subject.as_deref(), Some("S4"));

        let err = source.load_subject("S9").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("all.json"));
    }

    #[test]
    fn test_load_subject_from_list() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        write(
            &source.resolve_dir(),
            "cohort.json",
            json!([{"subject": "S5", "signal": {}}, {"subject": 6, "signal": {}}]),
        );
        assert_eq!(source.load_subject("S6").unwrap().subject.as_deref(), Some("6"));
    }

    #[test]
    fn test_load_subject_empty_directory() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        std::fs::write(source.resolve_dir().join("notes.txt"), "x").unwrap();

        match source.load_subject("2") {
            Err(LoadError::NoRecordings { contents, .. }) => assert_eq!(contents, vec!["notes.txt"]),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_decode_failure_is_not_not_found() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        std::fs::write(source.resolve_dir().join("S2.json"), "{broken").unwrap();
        let err = source.load_subject("2").unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_discover_subjects() {
        assert_eq!(discover_subjects(&json!({"subject": "S2"})), vec!["S2"]);
        assert_eq!(
            discover_subjects(&json!({"s3": {}, "7": {}, "x": {"subject": "S11"}})),
            vec!["S11", "S3", "S7"]
        );
        assert_eq!(
            discover_subjects(&json!([{"subject": "S1"}, {"subject": "S1"}, 5])),
            vec!["S1"]
        );
        assert!(discover_subjects(&json!(42)).is_empty());
    }

    #[test]
    fn test_column_table_with_subject_column() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        write(
            &source.resolve_dir(),
            "merged.json",
            json!({"columns": {
                "subject": ["S3", "S4", "S3", 4],
                "EDA": [0.1, 0.2, 0.3, 0.4]
            }}),
        );

        let by_file = source.subjects_by_file(None).unwrap();
        assert_eq!(
            by_file["merged.json"].as_ref().unwrap(),
            &vec!["4".to_string(), "S3".to_string(), "S4".to_string()]
        );

        let recording = source.load_subject("3").unwrap();
        assert_eq!(recording.subject.as_deref(), Some("S3"));
        let SignalNode::Table(table) = &recording.signal else {
            panic!("expected table, got {:?}", recording.signal);
        };
        assert_eq!(table.column_names(), vec!["subject", "EDA"]);
        assert_eq!(
            table.column("EDA").unwrap().values,
            vec![Sample::Float(0.1), Sample::Float(0.3)]
        );

        // Rows marked `S4` and `4` both belong to S4
        let rows = source.load_subject("S4").unwrap();
        assert_eq!(rows.signal.length(), Some(2));

        assert!(source.load_subject("S9").unwrap_err().is_not_found());
    }

    #[test]
    fn test_subjects_by_file_reports_errors_inline() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        let dir = source.resolve_dir();
        write(&dir, "S2.json", json!({"subject": "S2"}));
        std::fs::write(dir.join("bad.json"), "nope").unwrap();

        let by_file = source.subjects_by_file(None).unwrap();
        assert_eq!(by_file["S2.json"].as_ref().unwrap(), &vec!["S2".to_string()]);
        assert!(by_file["bad.json"].is_err());

        let filtered = source.subjects_by_file(Some("S2.json")).unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_default_subject_from_stem_is_loadable() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        write(
            &source.resolve_dir(),
            "recording.json",
            json!({"signal": {"wrist": {"EDA": [0.4, 0.6]}}, "rate": 4}),
        );

        let subject = source.default_subject().unwrap();
        let recording = source.load_subject(&subject).unwrap();
        assert_eq!(recording.subject, None);
        assert!(recording.signal.children().unwrap().contains_key("wrist"));
        assert!(recording.extra.contains_key("rate"));
    }

    #[test]
    fn test_default_subject() {
        let temp = TempDir::new().unwrap();
        let source = source_with_candidate(&temp, "S2");
        let dir = source.resolve_dir();
        write(&dir, "recording.json", json!({"signal": {"wrist": {"EDA": [0.4]}}}));
        assert_eq!(source.default_subject().unwrap(), "recording");

        write(&dir, "S2.json", json!({"subject": "S2"}));
        assert_eq!(source.default_subject().unwrap(), "S2");

        write(&dir, "S3.json", json!({"subject": "S3"}));
        match source.default_subject() {
            Err(LoadError::AmbiguousSubject { subjects_by_file }) => {
                assert_eq!(subjects_by_file.len(), 3)
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
