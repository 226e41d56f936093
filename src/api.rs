//! Poll backend client.
//!
//! Requests run on the app's Tokio runtime and land in shared result slots
//! that the UI systems drain on their next frame. There is no cancellation
//! of in-flight requests; double submission is prevented by the poll
//! screen's phase gating alone.

use std::sync::Arc;

use bevy::prelude::*;
use reqwest::cookie::{CookieStore, Jar};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::state::XP_PER_ANSWER;

const CSRF_COOKIE: &str = "csrftoken";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Server(String),
}

/// `GET /api/active-poll/` payload. Every field is optional so a bare
/// `{"error": "..."}` body still parses.
#[derive(Deserialize, Clone, Debug)]
pub struct ActivePollResponse {
    pub id: Option<i64>,
    pub question: Option<String>,
    pub choices: Option<RawChoices>,
    pub error: Option<String>,
}

/// The backend serves choices either as a proper list or as one string.
#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum RawChoices {
    List(Vec<String>),
    Text(String),
}

impl RawChoices {
    /// Accepts a JSON list, a JSON-encoded list inside a string, or a
    /// comma-delimited string.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            RawChoices::List(items) => items.clone(),
            RawChoices::Text(raw) => match serde_json::from_str::<Vec<String>>(raw) {
                Ok(items) => items,
                Err(_) => raw.split(',').map(|c| c.trim().to_string()).collect(),
            },
        }
    }
}

/// `POST /api/submit-answer/` payload.
#[derive(Deserialize, Clone, Debug)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    pub xp_award: Option<i64>,
    pub error: Option<String>,
}

impl SubmitResponse {
    /// Servers may omit the award; the default matches one answered question.
    pub fn awarded_xp(&self) -> i64 {
        self.xp_award.unwrap_or(XP_PER_ANSWER)
    }
}

#[derive(Resource, Clone)]
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl ApiClient {
    pub fn from_env() -> Self {
        let base = std::env::var("GARDEN_API_BASE")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        Self::new(base)
    }

    pub fn new(base: impl Into<String>) -> Self {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base: base.into(),
            http,
            jar,
        }
    }

    pub async fn fetch_active_poll(&self) -> Result<ActivePollResponse, ApiError> {
        let resp = self
            .http
            .get(format!("{}/api/active-poll/", self.base))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Server(format!(
                "active poll request returned HTTP {}",
                resp.status()
            )));
        }
        Ok(resp.json::<ActivePollResponse>().await?)
    }

    pub async fn submit_answer(
        &self,
        poll_id: i64,
        choice: &str,
    ) -> Result<SubmitResponse, ApiError> {
        let mut req = self
            .http
            .post(format!("{}/api/submit-answer/", self.base))
            .json(&serde_json::json!({ "poll_id": poll_id, "choice": choice }));
        if let Some(token) = self.csrf_token() {
            req = req.header("X-CSRFToken", token);
        }
        Ok(req.send().await?.json::<SubmitResponse>().await?)
    }

    /// CSRF token as set by the backend in the session cookie, if any
    /// request has captured one yet.
    pub fn csrf_token(&self) -> Option<String> {
        let url = self.base.parse::<reqwest::Url>().ok()?;
        let header = self.jar.cookies(&url)?;
        let raw = header.to_str().ok()?;
        raw.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == CSRF_COOKIE).then(|| value.to_string())
        })
    }
}

/// Result slot for the active-poll fetch, written from the runtime thread.
#[derive(Resource, Default)]
pub struct PollFetchSlot(pub Arc<Mutex<Option<Result<ActivePollResponse, ApiError>>>>);

/// Result slot for answer submission.
#[derive(Resource, Default)]
pub struct SubmitSlot(pub Arc<Mutex<Option<Result<SubmitResponse, ApiError>>>>);

/// Take a finished result out of a slot without blocking the frame.
pub fn take_slot<T>(slot: &Arc<Mutex<Option<T>>>) -> Option<T> {
    slot.try_lock().ok()?.take()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_parse_from_a_json_list() {
        let poll: ActivePollResponse = serde_json::from_str(
            r#"{"id": 7, "question": "Pick one", "choices": ["a", "b", "c"]}"#,
        )
        .unwrap();
        assert_eq!(poll.id, Some(7));
        assert_eq!(poll.choices.unwrap().normalize(), vec!["a", "b", "c"]);
    }

    #[test]
    fn choices_parse_from_a_json_encoded_string() {
        let raw = RawChoices::Text(r#"["yes", "no"]"#.to_string());
        assert_eq!(raw.normalize(), vec!["yes", "no"]);
    }

    #[test]
    fn choices_fall_back_to_comma_splitting() {
        let raw = RawChoices::Text("red,  green , blue".to_string());
        assert_eq!(raw.normalize(), vec!["red", "green", "blue"]);
    }

    #[test]
    fn error_only_body_still_parses() {
        let poll: ActivePollResponse =
            serde_json::from_str(r#"{"error": "Poll is closed"}"#).unwrap();
        assert_eq!(poll.error.as_deref(), Some("Poll is closed"));
        assert!(poll.id.is_none());
        assert!(poll.choices.is_none());
    }

    #[test]
    fn missing_xp_award_defaults_to_ten() {
        let resp: SubmitResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(resp.success);
        assert_eq!(resp.awarded_xp(), XP_PER_ANSWER);

        let resp: SubmitResponse =
            serde_json::from_str(r#"{"success": true, "xp_award": 15}"#).unwrap();
        assert_eq!(resp.awarded_xp(), 15);
    }

    #[test]
    fn failed_submission_carries_the_server_error() {
        let resp: SubmitResponse =
            serde_json::from_str(r#"{"success": false, "error": "Already answered"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Already answered"));
    }
}
