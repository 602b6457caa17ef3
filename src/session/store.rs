// ABOUTME: Saved-thread persistence — one pretty-printed JSON file per explicit save.
// ABOUTME: Files are named thread_<YYYYmmdd_HHMMSS>.json so names sort chronologically.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::StoreError;
use crate::session::message::Message;

/// Second-granular timestamp format used both in the file body and the filename.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A persisted snapshot of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedThread {
    #[serde(deserialize_with = "null_as_empty")]
    pub thread_id: String,
    pub timestamp: String,
    pub messages: Vec<Message>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Filename for a save taken at `timestamp`.
pub fn thread_filename(timestamp: &str) -> String {
    format!("thread_{timestamp}.json")
}

/// Directory of saved threads.
#[derive(Debug, Clone)]
pub struct ThreadStore {
    dir: PathBuf,
}

impl ThreadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the conversation stamped with the current local time.
    ///
    /// Returns the filename (relative to the store directory) that was written.
    pub fn save(
        &self,
        thread_id: Option<&str>,
        messages: &[Message],
    ) -> Result<String, StoreError> {
        self.save_at(thread_id, messages, Local::now().naive_local())
    }

    /// Save the conversation under an explicit timestamp.
    ///
    /// Saves that land on the same second share a filename; the later one wins.
    pub fn save_at(
        &self,
        thread_id: Option<&str>,
        messages: &[Message],
        at: NaiveDateTime,
    ) -> Result<String, StoreError> {
        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        let filename = thread_filename(&timestamp);
        let saved = SavedThread {
            thread_id: thread_id.unwrap_or_default().to_string(),
            timestamp,
            messages: messages.to_vec(),
        };

        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&filename);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&saved).map_err(StoreError::Serialize)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &path)?;

        tracing::info!(file = %filename, messages = saved.messages.len(), "saved thread");
        Ok(filename)
    }

    /// Saved filenames, most recent first.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".json") {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// Read back a saved thread by filename.
    pub fn load(&self, filename: &str) -> Result<SavedThread, StoreError> {
        let path = self.thread_path(filename)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            file: filename.to_string(),
            source,
        })
    }

    fn thread_path(&self, filename: &str) -> Result<PathBuf, StoreError> {
        validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }
}

/// Rejects names that could escape the store directory.
fn validate_filename(filename: &str) -> Result<(), StoreError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
        || filename.chars().any(|c| c.is_control())
    {
        return Err(StoreError::InvalidName(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::user("What funding calls are open?"),
            Message::assistant("Two calls are open until March."),
            Message::user("Which one fits SMEs?"),
        ]
    }

    #[test]
    fn save_then_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(tmp.path().join("saved_threads"));
        let messages = sample_messages();

        let filename = store
            .save_at(Some("thread_abc123"), &messages, at(9, 30, 0))
            .unwrap();
        assert_eq!(filename, "thread_20241105_093000.json");

        let loaded = store.load(&filename).unwrap();
        assert_eq!(loaded.thread_id, "thread_abc123");
        assert_eq!(loaded.timestamp, "20241105_093000");
        assert_eq!(loaded.messages, messages);
    }

    #[test]
    fn save_creates_directory_and_leaves_no_tmp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("saved_threads");
        let store = ThreadStore::new(&dir);

        let filename = store.save(Some("t"), &sample_messages()).unwrap();

        assert!(dir.join(&filename).exists());
        assert!(!dir.join(&filename).with_extension("json.tmp").exists());
    }

    #[test]
    fn file_body_matches_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(tmp.path());
        let filename = store
            .save_at(Some("thread_x"), &[Message::user("hi")], at(1, 2, 3))
            .unwrap();

        let raw = fs::read_to_string(tmp.path().join(filename)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "thread_id": "thread_x",
                "timestamp": "20241105_010203",
                "messages": [{"role": "user", "content": "hi"}],
            })
        );
    }

    #[test]
    fn list_is_most_recent_first() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(tmp.path());
        let messages = sample_messages();

        store.save_at(Some("a"), &messages, at(8, 0, 0)).unwrap();
        store.save_at(Some("c"), &messages, at(10, 0, 0)).unwrap();
        store.save_at(Some("b"), &messages, at(9, 0, 0)).unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let names = store.list().unwrap();
        assert_eq!(
            names,
            vec![
                "thread_20241105_100000.json",
                "thread_20241105_090000.json",
                "thread_20241105_080000.json",
            ]
        );
    }

    #[test]
    fn list_missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(tmp.path().join("never_created"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn same_second_saves_last_write_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(tmp.path());

        let first = store
            .save_at(Some("first"), &[Message::user("one")], at(12, 0, 0))
            .unwrap();
        let second = store
            .save_at(Some("second"), &[Message::user("two")], at(12, 0, 0))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list().unwrap().len(), 1);
        let loaded = store.load(&second).unwrap();
        assert_eq!(loaded.thread_id, "second");
        assert_eq!(loaded.messages, vec![Message::user("two")]);
    }

    #[test]
    fn load_missing_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(tmp.path());
        let err = store.load("thread_19990101_000000.json").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
    }

    #[test]
    fn load_malformed_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("thread_bad.json"), "{not json").unwrap();
        let store = ThreadStore::new(tmp.path());
        let err = store.load("thread_bad.json").unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn load_accepts_null_thread_id() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("thread_null.json"),
            r#"{"thread_id": null, "timestamp": "20240101_000000", "messages": []}"#,
        )
        .unwrap();
        let store = ThreadStore::new(tmp.path());
        let loaded = store.load("thread_null.json").unwrap();
        assert_eq!(loaded.thread_id, "");
    }

    #[test]
    fn load_rejects_path_traversal() {
        let store = ThreadStore::new("/tmp/threadchat-test");
        for name in ["../etc/passwd", "a/b.json", "a\\b.json", "", "x\0.json"] {
            let err = store.load(name).unwrap_err();
            assert!(matches!(err, StoreError::InvalidName(_)), "{name:?} gave {err:?}");
        }
    }
}
