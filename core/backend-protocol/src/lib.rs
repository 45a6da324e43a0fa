//! REST wire types and validation for the MindSteps session backend.
//!
//! This crate is shared by the core library and any other client of the
//! backend to prevent schema drift. The backend remains the authority on
//! validation, but clients can reuse the same types to construct valid
//! requests.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Answers a walker can give when closing a session. The values are
/// user-facing Swedish strings and are stored verbatim by the backend.
pub const ANSWER_VALUES: [&str; 3] = ["Bra", "Okej", "Dåligt"];

pub const MAX_DEVICE_ID_LEN: usize = 128;

/// Returns true when `value` is one of the accepted answer strings.
pub fn is_valid_answer(value: &str) -> bool {
    ANSWER_VALUES.contains(&value)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub code: String,
    pub message: String,
}

impl FieldError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Body for `POST /sessions`.
///
/// Also used for the zero-valued placeholder record created at walk start so
/// a backend identity exists to update later.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSessionRequest {
    pub device_id: String,
    pub steps: u32,
    /// Duration in whole seconds; the backend rejects zero-duration records.
    pub time: u64,
    pub answer: String,
    /// RFC3339 timestamp of the save.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

impl CreateSessionRequest {
    pub fn validate(&self) -> Result<(), FieldError> {
        require_non_empty(&self.device_id, "deviceId")?;
        if self.device_id.len() > MAX_DEVICE_ID_LEN {
            return Err(FieldError::new(
                "invalid_device_id",
                format!("deviceId must be {} characters or fewer", MAX_DEVICE_ID_LEN),
            ));
        }
        require_answer(&self.answer)?;
        require_duration(self.time)?;
        require_rfc3339(&self.date)?;
        Ok(())
    }
}

/// Body for `PUT /sessions/{id}`. Only the provided fields are updated.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

impl UpdateSessionRequest {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.steps.is_none()
            && self.time.is_none()
            && self.answer.is_none()
            && self.date.is_none()
            && self.reflection.is_none()
        {
            return Err(FieldError::new(
                "empty_update",
                "update must set at least one field",
            ));
        }
        if let Some(answer) = &self.answer {
            require_answer(answer)?;
        }
        if let Some(time) = self.time {
            require_duration(time)?;
        }
        if let Some(date) = &self.date {
            require_rfc3339(date)?;
        }
        Ok(())
    }
}

/// A session record as returned by the backend.
///
/// Parsing is tolerant of extra fields so the backend can evolve without
/// breaking installed clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub steps: u32,
    pub time: u64,
    pub answer: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

fn require_non_empty(value: &str, field: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(
            "missing_field",
            format!("{} is required", field),
        ));
    }
    Ok(())
}

fn require_answer(value: &str) -> Result<(), FieldError> {
    if !is_valid_answer(value) {
        return Err(FieldError::new(
            "invalid_answer",
            format!("answer must be one of {:?}", ANSWER_VALUES),
        ));
    }
    Ok(())
}

fn require_duration(time: u64) -> Result<(), FieldError> {
    if time == 0 {
        return Err(FieldError::new(
            "invalid_time",
            "time must be at least 1 second",
        ));
    }
    Ok(())
}

fn require_rfc3339(value: &str) -> Result<(), FieldError> {
    if DateTime::parse_from_rfc3339(value).is_err() {
        return Err(FieldError::new("invalid_date", "date must be RFC3339"));
    }
    Ok(())
}
