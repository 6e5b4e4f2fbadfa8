//! HTTP story store, a [`StoryStore`] over a REST API.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` to avoid
//! blocking the async runtime. The owner is sent in the `X-Owner-Id` header
//! on every request.
//!
//! | Operation | Request |
//! |---|---|
//! | check_today_story | `GET  {base}/stories/today/status` |
//! | request_today_story | `POST {base}/stories/today` |
//! | get_today_story | `GET  {base}/stories/today` |
//! | submit_word_interaction | `POST {base}/stories/today/words` |
//! | submit_completion | `POST {base}/stories/today/complete` → `{"newlyCompleted": bool}` |
//! | get_can_proceed | `GET  {base}/stories/today/can-proceed` |
//! | get_calendar_summary | `GET  {base}/calendar?year=Y` |
//! | list_stories | `GET  {base}/stories?year=Y` (404 is an error, not an empty list) |
//! | get_remaining_story_requests | `GET  {base}/stories/requests/remaining` |

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use storyday_core::{CalendarSummary, StoryRecord, WireStatus};
use storyday_storage::{
    CanProceedRecord, CompletionAck, CompletionSubmission, RemainingRequests, StorageError, StoreOperation,
    StoryStore, TodayStatus,
};

use crate::config::StorydayConfig;
use crate::error::WorkflowError;

/// A [`StoryStore`] reached over HTTP.
///
/// - `base_url` from config or `STORYDAY_BASE_URL` (required)
/// - `auth_token` from config or `STORYDAY_AUTH_TOKEN`, sent as a Bearer token
pub struct HttpStore {
    base_url: String,
    auth_token: Option<String>,
    agent: ureq::Agent,
}

#[derive(Serialize)]
struct WordInteractionBody<'a> {
    word: &'a str,
    status: WireStatus,
}

enum Method {
    Get,
    Post(serde_json::Value),
}

impl HttpStore {
    /// `timeout` bounds each request at the transport level. Callers wrap
    /// calls in a [`RetryPolicy`](crate::RetryPolicy) with its own deadline.
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        HttpStore {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            agent,
        }
    }

    pub fn from_config(config: &StorydayConfig) -> Result<Self, WorkflowError> {
        let base_url = config.require_base_url()?;
        Ok(HttpStore::new(
            base_url,
            config.store.auth_token.clone(),
            config.retry_policy().timeout,
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, year: Option<i32>) -> String {
        match year {
            Some(year) => format!("{}/{}?year={}", self.base_url, path, year),
            None => format!("{}/{}", self.base_url, path),
        }
    }

    /// Send one request. `Ok(None)` means the store answered 404.
    async fn send(
        &self,
        operation: StoreOperation,
        owner_id: &str,
        url: String,
        method: Method,
    ) -> Result<Option<String>, StorageError> {
        let agent = self.agent.clone();
        let auth = self.auth_token.as_ref().map(|t| format!("Bearer {}", t));
        let owner = owner_id.to_string();

        tracing::debug!(%operation, owner_id, %url, "store request");

        tokio::task::spawn_blocking(move || {
            let result = match method {
                Method::Get => {
                    let mut request = agent.get(&url).header("X-Owner-Id", &owner);
                    if let Some(ref auth) = auth {
                        request = request.header("Authorization", auth);
                    }
                    request.call()
                }
                Method::Post(body) => {
                    let mut request = agent.post(&url).header("X-Owner-Id", &owner);
                    if let Some(ref auth) = auth {
                        request = request.header("Authorization", auth);
                    }
                    request.send_json(&body)
                }
            };

            match result {
                Ok(mut response) => response
                    .body_mut()
                    .read_to_string()
                    .map(Some)
                    .map_err(|e| StorageError::Unavailable {
                        operation,
                        message: format!("failed to read response body: {}", e),
                    }),
                Err(e) => map_error(operation, &owner, e),
            }
        })
        .await
        .map_err(|e| StorageError::Backend(format!("{}: task join error: {}", operation, e)))?
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: StoreOperation,
        owner_id: &str,
        url: String,
    ) -> Result<Option<T>, StorageError> {
        match self.send(operation, owner_id, url, Method::Get).await? {
            Some(body) => parse(operation, &body).map(Some),
            None => Ok(None),
        }
    }

    async fn post_json<B: Serialize>(
        &self,
        operation: StoreOperation,
        owner_id: &str,
        url: String,
        body: &B,
    ) -> Result<Option<String>, StorageError> {
        let body = serde_json::to_value(body)
            .map_err(|e| StorageError::Backend(format!("{}: {}", operation, e)))?;
        self.send(operation, owner_id, url, Method::Post(body)).await
    }
}

fn not_found(owner_id: &str) -> StorageError {
    StorageError::NotFound {
        owner_id: owner_id.to_string(),
    }
}

fn parse<T: DeserializeOwned>(operation: StoreOperation, body: &str) -> Result<T, StorageError> {
    serde_json::from_str(body).map_err(|e| {
        StorageError::Backend(format!(
            "{}: failed to parse response as JSON: {}",
            operation, e
        ))
    })
}

/// Map a transport or status error onto the storage taxonomy.
fn map_error(
    operation: StoreOperation,
    owner_id: &str,
    err: ureq::Error,
) -> Result<Option<String>, StorageError> {
    match err {
        ureq::Error::StatusCode(404) => Ok(None),
        ureq::Error::StatusCode(409) => Err(StorageError::Conflict {
            owner_id: owner_id.to_string(),
            date: "today".to_string(),
        }),
        ureq::Error::StatusCode(code) if code == 408 || code == 429 || code >= 500 => {
            Err(StorageError::Unavailable {
                operation,
                message: format!("http status {}", code),
            })
        }
        ureq::Error::StatusCode(code) => Err(StorageError::Backend(format!(
            "{}: unexpected http status {}",
            operation, code
        ))),
        ureq::Error::Timeout(_) => Err(StorageError::Timeout { operation }),
        other => Err(StorageError::Unavailable {
            operation,
            message: other.to_string(),
        }),
    }
}

#[async_trait]
impl StoryStore for HttpStore {
    async fn check_today_story(&self, owner_id: &str) -> Result<TodayStatus, StorageError> {
        let op = StoreOperation::CheckTodayStory;
        self.get_json(op, owner_id, self.url("stories/today/status", None))
            .await?
            .ok_or_else(|| not_found(owner_id))
    }

    async fn request_today_story(&self, owner_id: &str) -> Result<StoryRecord, StorageError> {
        let op = StoreOperation::RequestTodayStory;
        let body = self
            .post_json(op, owner_id, self.url("stories/today", None), &serde_json::json!({}))
            .await?
            .ok_or_else(|| not_found(owner_id))?;
        parse(op, &body)
    }

    async fn get_today_story(&self, owner_id: &str) -> Result<StoryRecord, StorageError> {
        let op = StoreOperation::GetTodayStory;
        self.get_json(op, owner_id, self.url("stories/today", None))
            .await?
            .ok_or_else(|| not_found(owner_id))
    }

    async fn submit_word_interaction(
        &self,
        owner_id: &str,
        word: &str,
        observed: WireStatus,
    ) -> Result<(), StorageError> {
        let op = StoreOperation::SubmitWordInteraction;
        let body = WordInteractionBody {
            word,
            status: observed,
        };
        self.post_json(op, owner_id, self.url("stories/today/words", None), &body)
            .await?
            .ok_or_else(|| not_found(owner_id))?;
        Ok(())
    }

    async fn submit_completion(
        &self,
        owner_id: &str,
        submission: &CompletionSubmission,
    ) -> Result<CompletionAck, StorageError> {
        let op = StoreOperation::SubmitCompletion;
        let body = self
            .post_json(
                op,
                owner_id,
                self.url("stories/today/complete", None),
                submission,
            )
            .await?
            .ok_or_else(|| not_found(owner_id))?;
        parse(op, &body)
    }

    async fn get_can_proceed(
        &self,
        owner_id: &str,
    ) -> Result<Option<CanProceedRecord>, StorageError> {
        let op = StoreOperation::GetCanProceed;
        self.get_json(op, owner_id, self.url("stories/today/can-proceed", None))
            .await
    }

    async fn get_calendar_summary(
        &self,
        owner_id: &str,
        year: i32,
    ) -> Result<Option<CalendarSummary>, StorageError> {
        let op = StoreOperation::GetCalendarSummary;
        self.get_json(op, owner_id, self.url("calendar", Some(year)))
            .await
    }

    async fn list_stories(
        &self,
        owner_id: &str,
        year: i32,
    ) -> Result<Vec<StoryRecord>, StorageError> {
        let op = StoreOperation::ListStories;
        self.get_json(op, owner_id, self.url("stories", Some(year)))
            .await?
            .ok_or_else(|| StorageError::Backend(format!("{}: endpoint not served", op)))
    }

    async fn get_remaining_story_requests(
        &self,
        owner_id: &str,
    ) -> Result<RemainingRequests, StorageError> {
        let op = StoreOperation::GetRemainingStoryRequests;
        self.get_json(op, owner_id, self.url("stories/requests/remaining", None))
            .await?
            .ok_or_else(|| not_found(owner_id))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
