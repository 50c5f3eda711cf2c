use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variant name used when a stored record carries none.
pub const UNKNOWN_GAME: &str = "Unknown";

/// Outcome of one typing game, as persisted in history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResult {
    pub wpm: f64,
    pub accuracy: f64,
    /// Seconds between the first keystroke and `finish`.
    pub duration: f64,
    pub game_type: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<FixedOffset>,
    pub total_characters: usize,
    pub correct_characters: usize,
    pub error_count: usize,
}

/// Run-specific comparison against history. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordAnnotation {
    pub is_new_record: bool,
    pub previous_best: Option<f64>,
}

impl RecordAnnotation {
    /// Compare `wpm` against the best stored result, if any.
    pub fn against(wpm: f64, best: Option<&GameResult>) -> Self {
        Self {
            is_new_record: wpm > 0.0 && best.map_or(true, |b| wpm > b.wpm),
            previous_best: best.map(|b| b.wpm),
        }
    }
}

fn serialize_timestamp<S: serde::Serializer>(
    ts: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339())
}

/// Lenient shape of a stored record; older files used `game` and `date`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredRecord {
    wpm: f64,
    accuracy: f64,
    duration: f64,
    game_type: Option<String>,
    game: Option<String>,
    timestamp: Option<String>,
    date: Option<String>,
    total_characters: usize,
    correct_characters: usize,
    error_count: usize,
}

/// Parse an ISO-8601 timestamp; offset-less values are taken as UTC wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

impl GameResult {
    pub fn to_record(&self) -> Value {
        // Serializing plain numbers and strings into a Value cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Decode a stored record, accepting legacy key names.
    pub fn from_record(value: &Value) -> Result<Self, serde_json::Error> {
        let record = StoredRecord::deserialize(value)?;

        let timestamp = record
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| record.date.as_deref().and_then(parse_timestamp))
            .unwrap_or_else(|| Utc::now().fixed_offset());

        let game_type = record
            .game_type
            .filter(|s| !s.is_empty())
            .or(record.game)
            .unwrap_or_else(|| UNKNOWN_GAME.to_string());

        Ok(Self {
            wpm: record.wpm,
            accuracy: record.accuracy,
            duration: record.duration,
            game_type,
            timestamp,
            total_characters: record.total_characters,
            correct_characters: record.correct_characters,
            error_count: record.error_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    fn sample() -> GameResult {
        GameResult {
            wpm: 64.5,
            accuracy: 97.25,
            duration: 31.2,
            game_type: "Random Words".to_string(),
            timestamp: FixedOffset::east_opt(2 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 5, 1, 12, 30, 15)
                .unwrap()
                .with_nanosecond(123_456_789)
                .unwrap(),
            total_characters: 150,
            correct_characters: 142,
            error_count: 4,
        }
    }

    #[test]
    fn test_record_roundtrip_preserves_fields() {
        let result = sample();
        let decoded = GameResult::from_record(&result.to_record()).unwrap();
        assert_eq!(decoded, result);
        assert_eq!(decoded.timestamp.offset(), result.timestamp.offset());
        assert_eq!(decoded.timestamp.nanosecond(), 123_456_789);
    }

    #[test]
    fn test_record_roundtrip_keeps_session_timestamp() {
        let mut result = sample();
        result.timestamp = Utc::now().fixed_offset();
        let decoded = GameResult::from_record(&result.to_record()).unwrap();
        assert_eq!(decoded.timestamp, result.timestamp);
    }

    #[test]
    fn test_record_excludes_annotation_fields() {
        let record = sample().to_record();
        let obj = record.as_object().unwrap();
        assert!(!obj.contains_key("is_new_record"));
        assert!(!obj.contains_key("previous_best"));
        assert_eq!(obj.len(), 8);
    }

    #[test]
    fn test_legacy_keys_are_accepted() {
        let value = json!({
            "wpm": 40.0,
            "accuracy": 90.0,
            "duration": 12.0,
            "game": "Phrase Typing",
            "date": "2023-01-02T03:04:05"
        });
        let result = GameResult::from_record(&value).unwrap();
        assert_eq!(result.game_type, "Phrase Typing");
        assert_eq!(result.timestamp.offset().local_minus_utc(), 0);
        assert_eq!(result.timestamp.hour(), 3);
        assert_eq!(result.timestamp.minute(), 4);
    }

    #[test]
    fn test_primary_keys_win_over_legacy() {
        let value = json!({
            "game_type": "Random Words",
            "game": "Old Name",
            "timestamp": "2024-01-01T00:00:00+00:00",
            "date": "1999-01-01T00:00:00"
        });
        let result = GameResult::from_record(&value).unwrap();
        assert_eq!(result.game_type, "Random Words");
        assert_eq!(result.timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_unparseable_timestamp_falls_back_to_date() {
        let value = json!({
            "timestamp": "not a time",
            "date": "2023-01-02T03:04:05"
        });
        let result = GameResult::from_record(&value).unwrap();
        assert_eq!(result.timestamp.to_rfc3339(), "2023-01-02T03:04:05+00:00");
    }

    #[test]
    fn test_missing_fields_default() {
        let result = GameResult::from_record(&json!({})).unwrap();
        assert_eq!(result.wpm, 0.0);
        assert_eq!(result.game_type, UNKNOWN_GAME);
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn test_wrong_field_type_is_an_error() {
        assert!(GameResult::from_record(&json!({"wpm": "fast"})).is_err());
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-03-04T05:06:07.123456+00:00").is_some());
        assert!(parse_timestamp("2024-03-04T05:06:07.123456").is_some());
        assert!(parse_timestamp("2024-03-04 05:06:07").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_annotation_first_result_is_record() {
        let annotation = RecordAnnotation::against(42.0, None);
        assert!(annotation.is_new_record);
        assert_eq!(annotation.previous_best, None);
    }

    #[test]
    fn test_annotation_zero_wpm_is_never_record() {
        assert!(!RecordAnnotation::against(0.0, None).is_new_record);
    }

    #[test]
    fn test_annotation_against_best() {
        let best = sample();
        let slower = RecordAnnotation::against(50.0, Some(&best));
        assert!(!slower.is_new_record);
        assert_eq!(slower.previous_best, Some(64.5));

        let faster = RecordAnnotation::against(70.0, Some(&best));
        assert!(faster.is_new_record);

        let tie = RecordAnnotation::against(64.5, Some(&best));
        assert!(!tie.is_new_record);
    }

    #[test]
    fn test_default_annotation_is_safe() {
        let annotation = RecordAnnotation::default();
        assert!(!annotation.is_new_record);
        assert!(annotation.previous_best.is_none());
    }
}
