//! Read model for saved walks, backing the history screen.
//!
//! Maps backend session records into display-ready entries: parsed answer,
//! mood code, estimated distance, and a compact duration label. Newest
//! walks come first.

use crate::backend::{BackendError, HttpSessionBackend, SessionBackend};
use crate::error::MindFfiError;
use crate::types::Answer;
use chrono::{DateTime, FixedOffset};
use mindsteps_backend_protocol::SessionRecord;
use serde::{Deserialize, Serialize};

/// Average stride used to estimate walked distance from a step count.
pub const DEFAULT_STRIDE_METERS: f64 = 0.7;

/// Mood code shown by the history UI, derived from the session answer.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Better,
    Same,
    Worse,
}

impl Mood {
    pub fn from_answer(answer: Answer) -> Self {
        match answer {
            Answer::Bra => Mood::Better,
            Answer::Okej => Mood::Same,
            Answer::Daligt => Mood::Worse,
        }
    }

    pub fn to_answer(self) -> Answer {
        match self {
            Mood::Better => Answer::Bra,
            Mood::Same => Answer::Okej,
            Mood::Worse => Answer::Daligt,
        }
    }
}

/// One saved walk, ready for display.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, uniffi::Record)]
pub struct WalkEntry {
    pub id: String,
    pub steps: u32,
    pub duration_sec: u64,
    /// Compact duration, e.g. `"12m 30s"`.
    pub duration_label: String,
    /// Estimated distance in kilometres, rounded to two decimals.
    pub distance_km: f64,
    /// RFC3339 timestamp of the save, as stored by the backend.
    pub date: String,
    /// Raw answer string; kept verbatim so unknown values still display.
    pub answer: String,
    /// Parsed mood; `None` when the answer is not one of the known values.
    pub mood: Option<Mood>,
    pub reflection: Option<String>,
}

/// Estimates walked distance in kilometres, rounded to two decimals.
pub fn estimate_distance_km(steps: u32, stride_meters: f64) -> f64 {
    if steps == 0 || !stride_meters.is_finite() || stride_meters <= 0.0 {
        return 0.0;
    }
    let km = (steps as f64 * stride_meters) / 1000.0;
    (km * 100.0).round() / 100.0
}

/// Formats a duration in seconds as `"1h 2m 3s"`, omitting leading zero units.
pub fn format_duration(sec: u64) -> String {
    let h = sec / 3600;
    let m = (sec % 3600) / 60;
    let s = sec % 60;
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

impl From<&SessionRecord> for WalkEntry {
    fn from(record: &SessionRecord) -> Self {
        let mood = Answer::from_wire(&record.answer).map(Mood::from_answer);
        Self {
            id: record.id.clone(),
            steps: record.steps,
            duration_sec: record.time,
            duration_label: format_duration(record.time),
            distance_km: estimate_distance_km(record.steps, DEFAULT_STRIDE_METERS),
            date: record.date.clone(),
            answer: record.answer.clone(),
            mood,
            reflection: record.reflection.clone(),
        }
    }
}

/// Loads all saved walks for a device, newest first. Entries with an
/// unparseable date sort last.
pub fn load_history(
    backend: &dyn SessionBackend,
    device_id: &str,
) -> Result<Vec<WalkEntry>, BackendError> {
    let records = backend.fetch(device_id)?;
    let mut dated: Vec<(Option<DateTime<FixedOffset>>, WalkEntry)> = records
        .iter()
        .map(|record| {
            (
                DateTime::parse_from_rfc3339(&record.date).ok(),
                WalkEntry::from(record),
            )
        })
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(dated.into_iter().map(|(_, entry)| entry).collect())
}

/// FFI entry point for the history screen: one call, display-ready entries.
#[uniffi::export]
pub fn fetch_history(base_url: String, device_id: String) -> Result<Vec<WalkEntry>, MindFfiError> {
    let backend = HttpSessionBackend::new(HttpSessionBackend::resolve_base_url(base_url))
        .map_err(|e| MindFfiError::from(e.to_string()))?;
    load_history(&backend, &device_id).map_err(|e| MindFfiError::from(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, date: &str) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            steps: 1000,
            time: 750,
            answer: "Bra".to_string(),
            date: date.to_string(),
            mood: None,
            reflection: None,
        }
    }

    struct FixedBackend(Vec<SessionRecord>);

    impl SessionBackend for FixedBackend {
        fn create(
            &self,
            _request: &mindsteps_backend_protocol::CreateSessionRequest,
        ) -> Result<SessionRecord, BackendError> {
            unimplemented!("history tests never create")
        }

        fn update(
            &self,
            _id: &str,
            _request: &mindsteps_backend_protocol::UpdateSessionRequest,
        ) -> Result<SessionRecord, BackendError> {
            unimplemented!("history tests never update")
        }

        fn fetch(&self, _device_id: &str) -> Result<Vec<SessionRecord>, BackendError> {
            Ok(self.0.clone())
        }

        fn delete(&self, _id: &str) -> Result<(), BackendError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn mood_mapping_round_trips() {
        for mood in [Mood::Better, Mood::Same, Mood::Worse] {
            assert_eq!(Mood::from_answer(mood.to_answer()), mood);
        }
        assert_eq!(Mood::from_answer(Answer::Bra), Mood::Better);
        assert_eq!(Mood::from_answer(Answer::Daligt), Mood::Worse);
    }

    #[test]
    fn distance_estimate_matches_stride() {
        assert_eq!(estimate_distance_km(1000, DEFAULT_STRIDE_METERS), 0.7);
        assert_eq!(estimate_distance_km(1234, DEFAULT_STRIDE_METERS), 0.86);
        assert_eq!(estimate_distance_km(0, DEFAULT_STRIDE_METERS), 0.0);
        assert_eq!(estimate_distance_km(1000, 0.0), 0.0);
    }

    #[test]
    fn duration_label_shapes() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
    }

    #[test]
    fn entry_derives_display_fields() {
        let entry = WalkEntry::from(&record("abc", "2026-02-11T09:30:00Z"));
        assert_eq!(entry.id, "abc");
        assert_eq!(entry.duration_label, "12m 30s");
        assert_eq!(entry.distance_km, 0.7);
        assert_eq!(entry.mood, Some(Mood::Better));
    }

    #[test]
    fn unknown_answer_keeps_raw_string() {
        let mut raw = record("abc", "2026-02-11T09:30:00Z");
        raw.answer = "Fantastisk".to_string();
        let entry = WalkEntry::from(&raw);
        assert_eq!(entry.answer, "Fantastisk");
        assert!(entry.mood.is_none());
    }

    #[test]
    fn history_sorts_newest_first() {
        let backend = FixedBackend(vec![
            record("old", "2026-02-10T08:00:00Z"),
            record("new", "2026-02-11T09:30:00Z"),
            record("broken", "not-a-date"),
        ]);
        let entries = load_history(&backend, "device-1").unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "broken"]);
    }
}
