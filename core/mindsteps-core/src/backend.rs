//! Session backend boundary.
//!
//! The MindSteps backend is a small REST service; this module holds the
//! [`SessionBackend`] trait the engine talks to and the production
//! [`HttpSessionBackend`] implementation. Requests are validated with the
//! protocol crate before they go on the wire, so obviously-broken payloads
//! fail fast without a round trip.

use mindsteps_backend_protocol::{
    CreateSessionRequest, FieldError, SessionRecord, UpdateSessionRequest,
};
use std::time::Duration;

/// Environment override for the backend base URL, useful when pointing a
/// debug build at a LAN instance.
pub const BASE_URL_ENV: &str = "MINDSTEPS_API_URL";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid request: {0}")]
    InvalidRequest(FieldError),

    #[error("backend returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

/// REST operations on session records.
///
/// `create`/`update` are what the engine needs; `fetch`/`delete` serve the
/// history view.
pub trait SessionBackend: Send + Sync {
    fn create(&self, request: &CreateSessionRequest) -> Result<SessionRecord, BackendError>;
    fn update(
        &self,
        id: &str,
        request: &UpdateSessionRequest,
    ) -> Result<SessionRecord, BackendError>;
    fn fetch(&self, device_id: &str) -> Result<Vec<SessionRecord>, BackendError>;
    fn delete(&self, id: &str) -> Result<(), BackendError>;

    /// Returns the backend name for logging.
    fn name(&self) -> &'static str;
}

/// Production backend over HTTP.
pub struct HttpSessionBackend {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSessionBackend {
    /// Creates a backend client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let base_url = base_url.into();
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BackendError::InvalidBaseUrl(
                "base url must not be empty".to_string(),
            ));
        }

        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Resolves the effective base URL: the `MINDSTEPS_API_URL` environment
    /// variable wins over the configured value.
    pub fn resolve_base_url(configured: impl Into<String>) -> String {
        std::env::var(BASE_URL_ENV).unwrap_or_else(|_| configured.into())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn sessions_url(&self) -> String {
        format!("{}/sessions", self.base_url)
    }

    fn session_url(&self, id: &str) -> String {
        format!("{}/sessions/{}", self.base_url, id)
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().unwrap_or_default();
        Err(BackendError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

impl SessionBackend for HttpSessionBackend {
    fn create(&self, request: &CreateSessionRequest) -> Result<SessionRecord, BackendError> {
        request.validate().map_err(BackendError::InvalidRequest)?;
        let response = self.client.post(self.sessions_url()).json(request).send()?;
        let response = Self::check_status(response)?;
        Ok(response.json()?)
    }

    fn update(
        &self,
        id: &str,
        request: &UpdateSessionRequest,
    ) -> Result<SessionRecord, BackendError> {
        request.validate().map_err(BackendError::InvalidRequest)?;
        let response = self.client.put(self.session_url(id)).json(request).send()?;
        let response = Self::check_status(response)?;
        Ok(response.json()?)
    }

    fn fetch(&self, device_id: &str) -> Result<Vec<SessionRecord>, BackendError> {
        let response = self
            .client
            .get(self.sessions_url())
            .query(&[("deviceId", device_id)])
            .send()?;
        let response = Self::check_status(response)?;
        Ok(response.json()?)
    }

    fn delete(&self, id: &str) -> Result<(), BackendError> {
        let response = self.client.delete(self.session_url(id)).send()?;
        Self::check_status(response)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let backend = HttpSessionBackend::new("http://localhost:3000/").unwrap();
        assert_eq!(backend.base_url(), "http://localhost:3000");
        assert_eq!(backend.sessions_url(), "http://localhost:3000/sessions");
        assert_eq!(
            backend.session_url("abc"),
            "http://localhost:3000/sessions/abc"
        );
    }

    #[test]
    fn rejects_empty_base_url() {
        assert!(matches!(
            HttpSessionBackend::new("  "),
            Err(BackendError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn invalid_request_fails_before_any_network() {
        // Unroutable port: a network attempt would error differently.
        let backend = HttpSessionBackend::new("http://127.0.0.1:1").unwrap();
        let request = CreateSessionRequest {
            device_id: String::new(),
            steps: 0,
            time: 1,
            answer: "Okej".to_string(),
            date: "2026-02-11T09:30:00Z".to_string(),
            reflection: None,
        };
        assert!(matches!(
            backend.create(&request),
            Err(BackendError::InvalidRequest(_))
        ));
    }

    #[test]
    fn env_override_wins() {
        std::env::set_var(BASE_URL_ENV, "http://10.0.0.2:3000");
        assert_eq!(
            HttpSessionBackend::resolve_base_url("http://localhost:3000"),
            "http://10.0.0.2:3000"
        );
        std::env::remove_var(BASE_URL_ENV);
        assert_eq!(
            HttpSessionBackend::resolve_base_url("http://localhost:3000"),
            "http://localhost:3000"
        );
    }
}
