use itertools::Itertools;
use serde_json::{json, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::result::GameResult;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to write history: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode history: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timestamp order for [`HistoryStore::get_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

/// Append-only record of finished games.
pub trait HistoryStore {
    fn save(&mut self, result: &GameResult) -> Result<(), HistoryError>;
    fn get_all(&mut self, order: SortOrder) -> Vec<GameResult>;
    /// Highest WPM; the earliest stored wins a tie.
    fn get_best(&mut self) -> Option<GameResult>;
    fn clear(&mut self) -> Result<(), HistoryError>;
}

fn sorted(results: &[GameResult], order: SortOrder) -> Vec<GameResult> {
    results
        .iter()
        .cloned()
        .sorted_by(|a, b| match order {
            SortOrder::Asc => a.timestamp.cmp(&b.timestamp),
            SortOrder::Desc => b.timestamp.cmp(&a.timestamp),
        })
        .collect()
}

fn best(results: &[GameResult]) -> Option<GameResult> {
    results
        .iter()
        .reduce(|best, r| if r.wpm > best.wpm { r } else { best })
        .cloned()
}

/// Aggregates over the results that scored, i.e. `wpm > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub total: usize,
    pub scored: usize,
    pub best: Option<GameResult>,
    pub average_wpm: f64,
    pub average_accuracy: f64,
}

impl HistorySummary {
    pub fn from_results(results: &[GameResult]) -> Self {
        let scored = results.iter().filter(|r| r.wpm > 0.0).collect_vec();
        let n = scored.len();
        let mean = |f: fn(&GameResult) -> f64| {
            if n == 0 {
                0.0
            } else {
                scored.iter().map(|r| f(r)).sum::<f64>() / n as f64
            }
        };

        Self {
            total: results.len(),
            scored: n,
            best: scored
                .iter()
                .copied()
                .reduce(|best, r| if r.wpm > best.wpm { r } else { best })
                .cloned(),
            average_wpm: mean(|r| r.wpm),
            average_accuracy: mean(|r| r.accuracy),
        }
    }
}

/// History kept in a JSON file of the form `{"history": [record, ...]}`.
///
/// Parsed results are cached on first read and kept in step with every write
/// made through this handle. Other handles on the same file are not observed.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    cache: Option<Vec<GameResult>>,
}

impl JsonHistoryStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_path(AppDirs::history_path())
    }

    /// Open the store at `path`, creating an empty history file if none exists.
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            cache: None,
        };
        if !store.path.exists() {
            if let Err(e) = store.write_document(&empty_document()) {
                log::warn!("could not create {}: {e}", store.path.display());
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw document, or `None` if the file is missing or unreadable.
    fn read_document(&self) -> Option<Value> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("cannot read history {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(doc) if doc.get("history").is_some_and(Value::is_array) => Some(doc),
            Ok(_) => {
                log::warn!("history {} has no record list", self.path.display());
                None
            }
            Err(e) => {
                log::warn!("history {} is corrupt: {e}", self.path.display());
                None
            }
        }
    }

    fn write_document(&self, doc: &Value) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(doc)?)?;
        Ok(())
    }

    /// Keep a copy of an unparseable file before it gets overwritten.
    fn back_up_unreadable(&self) {
        if !self.path.is_file() {
            return;
        }
        let backup = self.path.with_extension("json.bak");
        match fs::copy(&self.path, &backup) {
            Ok(_) => log::warn!("saved unreadable history to {}", backup.display()),
            Err(e) => log::warn!("could not back up {}: {e}", self.path.display()),
        }
    }

    fn results(&mut self) -> &[GameResult] {
        if self.cache.is_none() {
            let records = self
                .read_document()
                .and_then(|mut doc| doc.get_mut("history").map(Value::take))
                .and_then(|list| match list {
                    Value::Array(records) => Some(records),
                    _ => None,
                })
                .unwrap_or_default();

            let parsed = records
                .iter()
                .filter_map(|record| {
                    GameResult::from_record(record)
                        .inspect_err(|e| log::warn!("skipping unreadable history record: {e}"))
                        .ok()
                })
                .collect();
            self.cache = Some(parsed);
        }
        self.cache.as_deref().unwrap_or_default()
    }
}

fn empty_document() -> Value {
    json!({ "history": [] })
}

impl HistoryStore for JsonHistoryStore {
    fn save(&mut self, result: &GameResult) -> Result<(), HistoryError> {
        let mut doc = match self.read_document() {
            Some(doc) => doc,
            None => {
                self.back_up_unreadable();
                empty_document()
            }
        };

        if let Some(Value::Array(records)) = doc.get_mut("history") {
            records.push(result.to_record());
        }
        self.write_document(&doc)?;

        if let Some(cache) = self.cache.as_mut() {
            cache.push(result.clone());
        }
        Ok(())
    }

    fn get_all(&mut self, order: SortOrder) -> Vec<GameResult> {
        sorted(self.results(), order)
    }

    fn get_best(&mut self) -> Option<GameResult> {
        best(self.results())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.write_document(&empty_document())?;
        self.cache = None;
        Ok(())
    }
}

/// History held in memory only.
#[derive(Debug, Default, Clone)]
pub struct MemoryHistoryStore {
    results: Vec<GameResult>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn save(&mut self, result: &GameResult) -> Result<(), HistoryError> {
        self.results.push(result.clone());
        Ok(())
    }

    fn get_all(&mut self, order: SortOrder) -> Vec<GameResult> {
        sorted(&self.results, order)
    }

    fn get_best(&mut self) -> Option<GameResult> {
        best(&self.results)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.results.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    fn result_at(wpm: f64, minutes: i64) -> GameResult {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        GameResult {
            wpm,
            accuracy: 95.0,
            duration: 30.0,
            game_type: "Random Words".to_string(),
            timestamp: (base + Duration::minutes(minutes)).fixed_offset(),
            total_characters: 100,
            correct_characters: 95,
            error_count: 5,
        }
    }

    #[test]
    fn test_new_store_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("history.json");
        let mut store = JsonHistoryStore::with_path(&path);
        assert!(path.exists());
        assert!(store.get_all(SortOrder::Desc).is_empty());
        assert!(store.get_best().is_none());
    }

    #[test]
    fn test_best_tracks_highest_wpm() {
        let dir = tempdir().unwrap();
        let mut store = JsonHistoryStore::with_path(dir.path().join("history.json"));
        assert!(store.get_best().is_none());

        store.save(&result_at(50.0, 0)).unwrap();
        assert_eq!(store.get_best().unwrap().wpm, 50.0);

        store.save(&result_at(70.0, 1)).unwrap();
        assert_eq!(store.get_best().unwrap().wpm, 70.0);

        store.save(&result_at(60.0, 2)).unwrap();
        assert_eq!(store.get_best().unwrap().wpm, 70.0);
    }

    #[test]
    fn test_best_tie_prefers_earliest_saved() {
        let mut store = MemoryHistoryStore::new();
        store.save(&result_at(80.0, 5)).unwrap();
        store.save(&result_at(80.0, 1)).unwrap();
        assert_eq!(store.get_best().unwrap().timestamp, result_at(0.0, 5).timestamp);
    }

    #[test]
    fn test_get_all_sort_orders() {
        let dir = tempdir().unwrap();
        let mut store = JsonHistoryStore::with_path(dir.path().join("history.json"));
        store.save(&result_at(10.0, 2)).unwrap();
        store.save(&result_at(20.0, 0)).unwrap();
        store.save(&result_at(30.0, 1)).unwrap();

        let desc: Vec<f64> = store.get_all(SortOrder::default()).iter().map(|r| r.wpm).collect();
        assert_eq!(desc, vec![10.0, 30.0, 20.0]);

        let asc: Vec<f64> = store.get_all(SortOrder::Asc).iter().map(|r| r.wpm).collect();
        assert_eq!(asc, vec![20.0, 30.0, 10.0]);
    }

    #[test]
    fn test_cache_updated_on_save() {
        let dir = tempdir().unwrap();
        let mut store = JsonHistoryStore::with_path(dir.path().join("history.json"));
        assert!(store.get_all(SortOrder::Desc).is_empty());
        store.save(&result_at(42.0, 0)).unwrap();
        assert_eq!(store.get_all(SortOrder::Desc).len(), 1);
    }

    #[test]
    fn test_new_handle_reads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut first = JsonHistoryStore::with_path(&path);
        first.save(&result_at(42.0, 0)).unwrap();
        first.save(&result_at(43.0, 1)).unwrap();

        let mut second = JsonHistoryStore::with_path(&path);
        let all = second.get_all(SortOrder::Asc);
        assert_eq!(all, vec![result_at(42.0, 0), result_at(43.0, 1)]);
    }

    #[test]
    fn test_handles_do_not_share_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut reader = JsonHistoryStore::with_path(&path);
        assert!(reader.get_all(SortOrder::Desc).is_empty());

        let mut writer = JsonHistoryStore::with_path(&path);
        writer.save(&result_at(42.0, 0)).unwrap();

        // The reader's cache was built before the other handle wrote.
        assert!(reader.get_all(SortOrder::Desc).is_empty());
        assert_eq!(JsonHistoryStore::with_path(&path).get_all(SortOrder::Desc).len(), 1);
    }

    #[test]
    fn test_clear_empties_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut store = JsonHistoryStore::with_path(&path);
        store.save(&result_at(42.0, 0)).unwrap();
        store.clear().unwrap();
        assert!(store.get_all(SortOrder::Desc).is_empty());
        assert!(store.get_best().is_none());
        assert!(JsonHistoryStore::with_path(&path).get_best().is_none());
    }

    #[test]
    fn test_corrupt_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ definitely not json").unwrap();
        let mut store = JsonHistoryStore::with_path(&path);
        assert!(store.get_all(SortOrder::Desc).is_empty());
        assert!(store.get_best().is_none());
    }

    #[test]
    fn test_save_over_corrupt_file_keeps_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[1, 2").unwrap();
        let mut store = JsonHistoryStore::with_path(&path);
        store.save(&result_at(42.0, 0)).unwrap();

        assert_eq!(store.get_all(SortOrder::Desc).len(), 1);
        let backup = fs::read_to_string(dir.path().join("history.json.bak")).unwrap();
        assert_eq!(backup, "[1, 2");
    }

    #[test]
    fn test_legacy_records_are_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"{"history": [
                {"wpm": 33.0, "accuracy": 91.0, "duration": 20.0,
                 "game": "Random Words", "date": "2023-04-05T06:07:08.123456"},
                {"wpm": "broken"},
                {"wpm": 44.0, "accuracy": 99.0, "duration": 10.0,
                 "game_type": "Phrase Typing", "timestamp": "2024-01-01T00:00:00+00:00",
                 "total_characters": 40, "correct_characters": 39, "error_count": 1}
            ]}"#,
        )
        .unwrap();

        let mut store = JsonHistoryStore::with_path(&path);
        let all = store.get_all(SortOrder::Asc);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].game_type, "Random Words");
        assert_eq!(all[0].timestamp.offset().local_minus_utc(), 0);
        assert_eq!(all[1].error_count, 1);
    }

    #[test]
    fn test_save_preserves_existing_records_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"{"history": [{"wpm": 1.0, "game": "Old", "date": "2020-01-01T00:00:00", "extra": true}]}"#,
        )
        .unwrap();

        let mut store = JsonHistoryStore::with_path(&path);
        store.save(&result_at(42.0, 0)).unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let records = doc["history"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["extra"], Value::Bool(true));
        assert_eq!(records[1]["game_type"], "Random Words");
        assert!(records[1].get("is_new_record").is_none());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A directory cannot be written as a file
        let mut store = JsonHistoryStore::with_path(dir.path());
        assert_matches!(store.save(&result_at(42.0, 0)), Err(HistoryError::Io(_)));
        assert!(store.get_best().is_none());
    }

    #[test]
    fn test_memory_store_behaves_like_file_store() {
        let mut store = MemoryHistoryStore::new();
        assert!(store.is_empty());
        store.save(&result_at(50.0, 1)).unwrap();
        store.save(&result_at(70.0, 0)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_best().unwrap().wpm, 70.0);
        assert_eq!(store.get_all(SortOrder::Desc)[0].wpm, 50.0);
        store.clear().unwrap();
        assert!(store.get_best().is_none());
    }

    #[test]
    fn test_summary_ignores_zero_wpm() {
        let results = vec![result_at(0.0, 0), result_at(40.0, 1), result_at(60.0, 2)];
        let summary = HistorySummary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.scored, 2);
        assert_eq!(summary.best.unwrap().wpm, 60.0);
        assert_eq!(summary.average_wpm, 50.0);
        assert_eq!(summary.average_accuracy, 95.0);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = HistorySummary::from_results(&[result_at(0.0, 0)]);
        assert_eq!(summary.total, 1);
        assert!(summary.best.is_none());
        assert_eq!(summary.average_wpm, 0.0);
    }
}
