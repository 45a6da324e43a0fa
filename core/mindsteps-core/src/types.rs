//! Core types shared across all MindSteps clients.
//!
//! All clients (Swift, Kotlin) use these exact same types, ensuring
//! consistency. Everything here is annotated with UniFFI macros for
//! Swift/Kotlin bindings.

use serde::{Deserialize, Serialize};

/// How the walk felt, answered when closing a session.
///
/// The wire values are the user-facing Swedish strings the backend stores
/// verbatim; see [`Answer::as_wire`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, uniffi::Enum)]
pub enum Answer {
    #[serde(rename = "Bra")]
    Bra,
    #[default]
    #[serde(rename = "Okej")]
    Okej,
    #[serde(rename = "Dåligt")]
    Daligt,
}

impl Answer {
    /// The exact string the backend stores for this answer.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Answer::Bra => "Bra",
            Answer::Okej => "Okej",
            Answer::Daligt => "Dåligt",
        }
    }

    /// Parses a backend answer string; `None` for unknown values.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "Bra" => Some(Answer::Bra),
            "Okej" => Some(Answer::Okej),
            "Dåligt" => Some(Answer::Daligt),
            _ => None,
        }
    }
}

/// Point-in-time view of the active walk session.
///
/// The UI polls this once a second (and after every user action); the engine
/// is the only writer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, uniffi::Record)]
pub struct SessionSnapshot {
    /// True iff a walk session is currently open.
    pub active: bool,
    /// True iff the session is open but its timer and step stream are suspended.
    pub paused: bool,
    /// Cumulative step count for this session.
    pub steps: u32,
    /// Wall-clock seconds elapsed in the unpaused portion of the session.
    pub elapsed_sec: u64,
    /// Effective start of the current unpaused interval, ms since epoch.
    pub start_time_ms: Option<u64>,
    /// Stable per-installation identifier.
    pub device_id: String,
    /// Backend id of the placeholder record; `None` until the background
    /// create resolves, and cleared after a successful save.
    pub session_id: Option<String>,
}

/// Local summary returned by `finish()` for the review screen.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct WalkSummary {
    pub steps: u32,
    pub duration_sec: u64,
}

/// Result of `stop_and_save`. Never raised as an exception: a failed save
/// keeps the session counters intact so the caller can retry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SaveOutcome {
    pub ok: bool,
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn saved() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_wire_round_trip() {
        for answer in [Answer::Bra, Answer::Okej, Answer::Daligt] {
            assert_eq!(Answer::from_wire(answer.as_wire()), Some(answer));
        }
        assert_eq!(Answer::from_wire("Great"), None);
    }

    #[test]
    fn answer_default_is_okej() {
        assert_eq!(Answer::default(), Answer::Okej);
    }

    #[test]
    fn answer_serde_uses_wire_strings() {
        let json = serde_json::to_string(&Answer::Daligt).unwrap();
        assert_eq!(json, "\"Dåligt\"");
        let parsed: Answer = serde_json::from_str("\"Bra\"").unwrap();
        assert_eq!(parsed, Answer::Bra);
    }

    #[test]
    fn save_outcome_helpers() {
        assert!(SaveOutcome::saved().ok);
        let failed = SaveOutcome::failed("nätverksfel");
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("nätverksfel"));
    }
}
