//! Test utilities for the console crate.
//!
//! Recording fakes for the driven ports, shared by unit tests (in `src/`) and
//! integration tests (in `tests/`). Only compiled for tests or with the
//! `test-support` feature.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ports::{ApiError, ResourceApi, ResourcePath, UserFeedback};
use crate::domain::{ActionGate, AuthorizationContext, PermissionMap, SessionUser};

/// One request seen by [`RecordingResourceApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// HTTP verb.
    pub method: &'static str,
    /// Endpoint path.
    pub path: String,
    /// Request body, for writes.
    pub body: Option<Value>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory [`ResourceApi`] that records every call.
///
/// `GET` answers come from [`Self::serve`]; unknown paths answer `404`.
/// Writes answer `{"message": "ok"}` unless a failure is queued with
/// [`Self::fail_next`].
#[derive(Debug, Default)]
pub struct RecordingResourceApi {
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<VecDeque<ApiError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingResourceApi {
    /// Empty fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `GET path` with `body`.
    pub fn serve(&self, path: &str, body: Value) -> &Self {
        lock(&self.responses).insert(path.to_owned(), body);
        self
    }

    /// Fail the next request of any kind with `error`.
    pub fn fail_next(&self, error: ApiError) -> &Self {
        lock(&self.failures).push_back(error);
        self
    }

    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Calls other than `GET`.
    #[must_use]
    pub fn writes(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method != "GET")
            .collect()
    }

    fn record(
        &self,
        method: &'static str,
        path: &ResourcePath,
        body: Option<&Value>,
    ) -> Result<(), ApiError> {
        lock(&self.calls).push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        lock(&self.failures).pop_front().map_or(Ok(()), Err)
    }

    fn acknowledge() -> Value {
        serde_json::json!({ "message": "ok" })
    }
}

#[async_trait]
impl ResourceApi for RecordingResourceApi {
    async fn get(&self, path: &ResourcePath) -> Result<Value, ApiError> {
        self.record("GET", path, None)?;
        lock(&self.responses)
            .get(&path.to_string())
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("no fixture for {path}")))
    }

    async fn post(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError> {
        self.record("POST", path, Some(body))?;
        Ok(Self::acknowledge())
    }

    async fn put(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError> {
        self.record("PUT", path, Some(body))?;
        Ok(Self::acknowledge())
    }

    async fn patch(&self, path: &ResourcePath, body: &Value) -> Result<Value, ApiError> {
        self.record("PATCH", path, Some(body))?;
        Ok(Self::acknowledge())
    }

    async fn delete(&self, path: &ResourcePath) -> Result<(), ApiError> {
        self.record("DELETE", path, None)
    }
}

/// [`UserFeedback`] that records alerts and prompts and answers prompts from
/// a script (declining once the script runs out).
#[derive(Debug, Default)]
pub struct ScriptedFeedback {
    answers: Mutex<VecDeque<bool>>,
    alerts: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedFeedback {
    /// Feedback answering prompts with `answers` in order.
    #[must_use]
    pub fn answering(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Alerts shown so far.
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        lock(&self.alerts).clone()
    }

    /// Prompts asked so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl UserFeedback for ScriptedFeedback {
    fn alert(&self, message: &str) {
        lock(&self.alerts).push(message.to_owned());
    }

    fn confirm(&self, prompt: &str) -> bool {
        lock(&self.prompts).push(prompt.to_owned());
        lock(&self.answers).pop_front().unwrap_or(false)
    }
}

/// Gate for a staff user holding `permissions`, reporting to `feedback`.
pub fn staff_gate(permissions: PermissionMap, feedback: Arc<ScriptedFeedback>) -> ActionGate {
    let context = AuthorizationContext::for_user(SessionUser::staff("tester", permissions));
    ActionGate::new(Arc::new(context), feedback)
}

/// Fresh temporary directory and a session-file path inside it.
///
/// The file does not exist yet; the directory is removed when the returned
/// guard drops.
///
/// # Errors
///
/// Fails when the directory cannot be created.
pub fn session_file_in_tempdir() -> io::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("session.json");
    Ok((dir, path))
}
